// Bridge to the external learned controller. The controller runs as a child
// process speaking line-delimited JSON: one static arena line at startup,
// then one drawables line per tick, with position batches coming back.

use std::process::Stdio;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::domain::ArenaLayout;
use crate::use_cases::{BridgeView, GameEvent, PositionUpdate};

use super::protocol::{Dimensions, GridDimensions};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OneTimeData<'a> {
    game_bounds_dimensions: Dimensions,
    path_grid_dimensions: GridDimensions,
    unwalkable_cells_expanded: &'a [(i32, i32)],
    eval_mode: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
enum BridgeLine<'a> {
    OneTimeData(OneTimeData<'a>),
    Drawables(&'a [BridgeView]),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BridgePositionDto {
    client_id: u64,
    top_left_x: f64,
    top_left_y: f64,
}

impl From<BridgePositionDto> for PositionUpdate {
    fn from(dto: BridgePositionDto) -> Self {
        Self {
            id: dto.client_id,
            x: dto.top_left_x,
            y: dto.top_left_y,
        }
    }
}

/// Launches the controller process and wires both directions. Returns the
/// per-tick view sender, or `None` when no controller command is configured.
pub fn spawn_agent_bridge(
    layout: Arc<ArenaLayout>,
    eval_mode: bool,
    command: Option<String>,
    input_tx: mpsc::Sender<GameEvent>,
    channel_capacity: usize,
) -> Option<mpsc::Sender<Vec<BridgeView>>> {
    let Some(command) = command else {
        info!("no agent controller configured; agents will hold still");
        return None;
    };

    let mut parts = command.split_whitespace();
    let program = parts.next()?;
    let mut child = match Command::new(program)
        .args(parts)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            error!(%err, command, "failed to launch agent controller");
            return None;
        }
    };
    info!(command, "agent controller launched");

    let stdin = child.stdin.take()?;
    let stdout = child.stdout.take()?;
    let stderr = child.stderr.take()?;

    let (views_tx, views_rx) = mpsc::channel::<Vec<BridgeView>>(channel_capacity);

    tokio::spawn(write_views(stdin, views_rx, layout, eval_mode));
    tokio::spawn(read_positions(stdout, input_tx));
    tokio::spawn(forward_stderr(stderr));
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) => warn!(%status, "agent controller exited"),
            Err(err) => error!(%err, "failed to wait on agent controller"),
        }
    });

    Some(views_tx)
}

async fn write_views(
    mut stdin: tokio::process::ChildStdin,
    mut views_rx: mpsc::Receiver<Vec<BridgeView>>,
    layout: Arc<ArenaLayout>,
    eval_mode: bool,
) {
    let cells = layout.expanded_wall_cells();
    let one_time = BridgeLine::OneTimeData(OneTimeData {
        game_bounds_dimensions: Dimensions {
            width: layout.width(),
            height: layout.height(),
        },
        path_grid_dimensions: GridDimensions {
            rows: layout.rows(),
            cols: layout.cols(),
        },
        unwalkable_cells_expanded: &cells,
        eval_mode,
    });
    if write_line(&mut stdin, &one_time).await.is_err() {
        error!("agent controller stdin closed before handshake");
        return;
    }

    while let Some(views) = views_rx.recv().await {
        if write_line(&mut stdin, &BridgeLine::Drawables(&views))
            .await
            .is_err()
        {
            warn!("agent controller stdin closed; stopping view feed");
            return;
        }
    }
}

async fn write_line(
    stdin: &mut tokio::process::ChildStdin,
    line: &BridgeLine<'_>,
) -> std::io::Result<()> {
    let mut payload = serde_json::to_vec(line)?;
    payload.push(b'\n');
    stdin.write_all(&payload).await
}

async fn read_positions(stdout: tokio::process::ChildStdout, input_tx: mpsc::Sender<GameEvent>) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Vec<BridgePositionDto>>(line) {
                    Ok(batch) => {
                        let updates = batch.into_iter().map(PositionUpdate::from).collect();
                        if let Err(mpsc::error::TrySendError::Closed(_)) =
                            input_tx.try_send(GameEvent::AgentPositions(updates))
                        {
                            return;
                        }
                    }
                    Err(err) => {
                        warn!(%err, bytes = line.len(), "unparseable controller line; dropping");
                    }
                }
            }
            Ok(None) => {
                info!("agent controller stdout closed");
                return;
            }
            Err(err) => {
                error!(%err, "error reading agent controller stdout");
                return;
            }
        }
    }
}

async fn forward_stderr(stderr: tokio::process::ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(line, "agent controller stderr");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_positions_parse_from_wire_json() {
        let batch: Vec<BridgePositionDto> = serde_json::from_str(
            r#"[{"clientId":3,"topLeftX":120.5,"topLeftY":88.0},{"clientId":4,"topLeftX":1.0,"topLeftY":2.0}]"#,
        )
        .unwrap();
        let updates: Vec<PositionUpdate> = batch.into_iter().map(PositionUpdate::from).collect();
        assert_eq!(updates[0].id, 3);
        assert_eq!(updates[0].x, 120.5);
        assert_eq!(updates[1].y, 2.0);
    }

    #[test]
    fn bridge_lines_use_the_controller_vocabulary() {
        let layout = ArenaLayout::default();
        let cells = layout.expanded_wall_cells();
        let line = BridgeLine::OneTimeData(OneTimeData {
            game_bounds_dimensions: Dimensions {
                width: layout.width(),
                height: layout.height(),
            },
            path_grid_dimensions: GridDimensions {
                rows: layout.rows(),
                cols: layout.cols(),
            },
            unwalkable_cells_expanded: &cells,
            eval_mode: false,
        });
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&line).unwrap()).unwrap();
        assert_eq!(json["type"], "oneTimeData");
        assert_eq!(json["data"]["gameBoundsDimensions"]["width"], 2500.0);
        assert_eq!(json["data"]["evalMode"], false);

        let views = vec![BridgeView {
            client_id: 9,
            kind: "agent",
            top_left_x: 10.0,
            top_left_y: 20.0,
            width: 35.0,
            height: 35.0,
            speed: 5.0,
        }];
        let line = BridgeLine::Drawables(&views);
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&line).unwrap()).unwrap();
        assert_eq!(json["type"], "drawables");
        assert_eq!(json["data"][0]["clientId"], 9);
        assert_eq!(json["data"][0]["type"], "agent");
    }
}

use crate::interface_adapters::protocol::{
    encode_event, frame_world_event, ClientCommand, ConnectAck, OutFrame, ServerEvent,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{GameEvent, WorldEvent};

use axum::{
    Error,
    extract::{
        Query, State,
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, info_span, warn, Instrument};

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(std::io::Error),
    InputClosed,
    FramesClosed,
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct ConnectQuery {
    // Display name the client wants to play under.
    #[serde(default)]
    name: Option<String>,
}

/// Serializes each world event once and broadcasts the shared bytes, so a
/// snapshot is compressed a single time regardless of connection count.
pub async fn event_serializer(
    mut world_rx: broadcast::Receiver<WorldEvent>,
    frames_tx: broadcast::Sender<OutFrame>,
) {
    loop {
        match world_rx.recv().await {
            Ok(event) => {
                let frame = match frame_world_event(&event) {
                    Ok(frame) => frame,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize world event");
                        continue;
                    }
                };
                // Send fails only while no connection is subscribed.
                let _ = frames_tx.send(frame);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "event serializer lagged; skipping to latest");
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("world event channel closed; serializer exiting");
                break;
            }
        }
    }
}

/// Claims a player slot if one is free. Compare-and-swap keeps concurrent
/// upgrades from overshooting the cap.
pub fn try_admit(current: &AtomicU32, max: u32) -> bool {
    let mut count = current.load(Ordering::Acquire);
    loop {
        if count >= max {
            return false;
        }
        match current.compare_exchange(count, count + 1, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => return true,
            Err(actual) => count = actual,
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    // Admission is decided before the upgrade so a full server still answers
    // the handshake and can tell the client why it is being turned away.
    let admitted = try_admit(&state.current_players, state.max_players);
    let name = query
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    ws.on_upgrade(move |socket| handle_socket(socket, state, admitted, name))
}

async fn handle_socket(
    mut socket: WebSocket,
    state: Arc<AppState>,
    admitted: bool,
    name: Option<String>,
) {
    if !admitted {
        info!("connection refused: server full");
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::POLICY,
                reason: "maximum player count reached".into(),
            })))
            .await;
        let _ = socket.close().await;
        return;
    }

    let player_id = state.ids.next_id();
    let span = info_span!("conn", player_id);

    async {
        let mut ctx = match bootstrap_connection(&mut socket, &state, player_id, name).await {
            Ok(ctx) => ctx,
            Err(e) => {
                error!(error = ?e, "failed to bootstrap connection");
                let _ = socket
                    .send(Message::Close(Some(CloseFrame {
                        code: close_code::POLICY,
                        reason: "bootstrap failed".into(),
                    })))
                    .await;
                let _ = socket.close().await;
                release_slot(&state);
                return;
            }
        };

        info!("client connected");
        if let Err(e) = run_client_loop(&mut socket, &mut ctx).await {
            warn!(error = ?e, "client loop exited with error");
        }
    }
    .instrument(span)
    .await
}

struct ConnCtx {
    player_id: u64,
    state: Arc<AppState>,
    input_tx: mpsc::Sender<GameEvent>,
    frames_rx: broadcast::Receiver<OutFrame>,

    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,

    invalid_json: u32,

    last_input_full_log: Instant,
    last_frame_lag_log: Instant,
    last_invalid_input_log: Instant,

    close_frame: Option<CloseFrame>,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    state: &Arc<AppState>,
    player_id: u64,
    name: Option<String>,
) -> Result<ConnCtx, NetError> {
    // Subscribe *before* the join event so the first snapshot containing the
    // new player cannot be missed.
    let frames_rx = state.frames_tx.subscribe();

    // Tell the client "this is who you are" together with the arena layout.
    let ack = ConnectAck::new(player_id, &state.layout);
    let bytes = encode_event(&ServerEvent::Connected(ack)).map_err(NetError::Serialization)?;
    socket
        .send(Message::Binary(bytes))
        .await
        .map_err(NetError::Ws)?;

    // Join happens after the ack so the client knows its id before the first
    // snapshot arrives.
    state
        .input_tx
        .send(GameEvent::Join { player_id, name })
        .await
        .map_err(|_| NetError::InputClosed)?;

    // Announce the new head count to the hub off the connection path.
    let hub = state.hub.clone();
    let count = state.current_players.load(Ordering::Acquire);
    tokio::spawn(async move { hub.push_player_count(count).await });

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        player_id,
        state: state.clone(),
        input_tx: state.input_tx.clone(),
        frames_rx,

        msgs_in: 0,
        msgs_out: 0,
        bytes_in: 0,
        bytes_out: 0,

        invalid_json: 0,

        last_input_full_log: now,
        last_frame_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

async fn run_client_loop(socket: &mut WebSocket, ctx: &mut ConnCtx) -> Result<(), NetError> {
    let player_id = ctx.player_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        state,
        input_tx,
        frames_rx,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        last_input_full_log,
        last_frame_lag_log,
        last_invalid_input_log,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    player_id,
                    input_tx,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                    last_input_full_log,
                    last_invalid_input_log,
                    close_frame,
                ) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            frame = frames_rx.recv() => {
                match frame {
                    Ok(frame) => {
                        if frame.target.is_none_or(|target| target == player_id) {
                            match forward_frame(frame, socket, msgs_out, bytes_out).await {
                                LoopControl::Continue => false,
                                LoopControl::Disconnect => true,
                            }
                        } else {
                            false
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // A full snapshot arrives every tick, so a lagged
                        // receiver recovers on its own.
                        if should_log(last_frame_lag_log) {
                            warn!(missed = n, "frame stream lagged; skipping");
                        }
                        false
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::FramesClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    if let Err(e) = disconnect_cleanup(
        player_id,
        state,
        input_tx,
        *msgs_in,
        *msgs_out,
        *bytes_in,
        *bytes_out,
        *invalid_json,
    )
    .await
    {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    player_id: u64,
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    last_input_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientCommand>(&text) {
                    Ok(command) => {
                        let Some(command) = command.into_player_command() else {
                            if should_log(last_invalid_input_log) {
                                warn!(player_id, "command carried unusable values; dropping");
                            }
                            return Ok(LoopControl::Continue);
                        };

                        match input_tx.try_send(GameEvent::Command { player_id, command }) {
                            Ok(()) => Ok(LoopControl::Continue),
                            Err(mpsc::error::TrySendError::Full(_)) => {
                                if should_log(last_input_full_log) {
                                    warn!(player_id, "input channel full; dropping command");
                                }
                                Ok(LoopControl::Continue)
                            }
                            Err(mpsc::error::TrySendError::Closed(_)) => {
                                Err(NetError::InputClosed)
                            }
                        }
                    }
                    Err(parse_err) => {
                        *invalid_json += 1;
                        if should_log(last_invalid_input_log) {
                            warn!(
                                player_id,
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client command"
                            );
                        }

                        if *invalid_json > MAX_INVALID_JSON {
                            *close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_frame(
    frame: OutFrame,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let bytes_len = frame.bytes.len();
    match socket
        .send(Message::Binary(frame.bytes))
        .await
        .map_err(NetError::Ws)
    {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send frame");
            LoopControl::Disconnect
        }
    }
}

fn release_slot(state: &Arc<AppState>) -> u32 {
    let previous = state.current_players.fetch_sub(1, Ordering::AcqRel);
    previous.saturating_sub(1)
}

#[allow(clippy::too_many_arguments)]
async fn disconnect_cleanup(
    player_id: u64,
    state: &Arc<AppState>,
    input_tx: &mpsc::Sender<GameEvent>,
    msgs_in: u64,
    msgs_out: u64,
    bytes_in: u64,
    bytes_out: u64,
    invalid_json: u32,
) -> Result<(), NetError> {
    input_tx
        .send(GameEvent::Leave { player_id })
        .await
        .map_err(|_| NetError::InputClosed)?;

    let count = release_slot(state);
    let hub = state.hub.clone();
    tokio::spawn(async move { hub.push_player_count(count).await });

    debug!(
        player_id,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        "connection stats"
    );
    info!(player_id, "client disconnected");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admission_stops_at_the_cap() {
        let current = AtomicU32::new(0);
        for _ in 0..5 {
            assert!(try_admit(&current, 5));
        }
        assert!(!try_admit(&current, 5));
        assert_eq!(current.load(Ordering::Acquire), 5);

        // A freed slot is immediately claimable again.
        current.fetch_sub(1, Ordering::AcqRel);
        assert!(try_admit(&current, 5));
        assert!(!try_admit(&current, 5));
    }
}

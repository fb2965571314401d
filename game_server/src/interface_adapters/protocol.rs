// Wire protocol. Every outbound frame is JSON with a one-byte trailing tag:
// b'0' for plain text, b'1' for zlib-deflated text. Clients check the last
// byte before parsing.

use std::io::{self, Write};

use axum::body::Bytes;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::domain::{ArenaLayout, Direction, EntityId, EntityView};
use crate::use_cases::{PlayerCommand, WorldEvent};

pub const TAG_UNCOMPRESSED: u8 = b'0';
pub const TAG_COMPRESSED: u8 = b'1';

/// A serialized frame plus its delivery scope: `None` goes to every
/// connection, `Some(id)` only to the connection owning that entity.
#[derive(Debug, Clone)]
pub struct OutFrame {
    pub target: Option<EntityId>,
    pub bytes: Bytes,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GridDimensions {
    pub rows: usize,
    pub cols: usize,
}

/// First frame on a fresh connection: the client's entity id and everything
/// static about the arena. Walls travel as their raw
/// `[x_start, y_start, x_end, y_end]` spans; renderers destructure them as
/// 4-tuples, while the expanded per-cell form stays bridge-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectAck {
    pub client_id: EntityId,
    pub game_bounds_dimensions: Dimensions,
    pub spatial_grid_dimensions: GridDimensions,
    pub path_grid_dimensions: GridDimensions,
    pub unwalkable_cells: Vec<[i32; 4]>,
}

impl ConnectAck {
    pub fn new(client_id: EntityId, layout: &ArenaLayout) -> Self {
        let grid = GridDimensions {
            rows: layout.rows(),
            cols: layout.cols(),
        };
        Self {
            client_id,
            game_bounds_dimensions: Dimensions {
                width: layout.width(),
                height: layout.height(),
            },
            spatial_grid_dimensions: grid.clone(),
            path_grid_dimensions: grid,
            unwalkable_cells: layout
                .walls
                .iter()
                .map(|w| [w.x_start, w.y_start, w.x_end, w.y_end])
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HighScoreUpdate {
    pub high_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperienceUpdate {
    pub level: u32,
    pub experience: f64,
    pub score: f64,
}

/// One entity in the snapshot, serialized as a positional row rather than an
/// object to keep the pre-compression payload small.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityRow(
    pub EntityId,
    pub Option<String>,
    pub f64,
    pub f64,
    pub f64,
    pub f64,
    pub String,
    pub f64,
    pub f64,
    pub String,
    pub String,
    pub Option<f64>,
);

impl From<&EntityView> for EntityRow {
    fn from(view: &EntityView) -> Self {
        Self(
            view.id,
            view.name.clone(),
            view.width,
            view.height,
            view.x,
            view.y,
            view.color.clone(),
            view.max_health,
            view.current_health,
            view.shape.as_str().to_string(),
            view.kind.to_string(),
            view.shooting_angle,
        )
    }
}

/// Server-to-client message envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    Connected(ConnectAck),
    HighScore(HighScoreUpdate),
    Death(bool),
    Experience(ExperienceUpdate),
    Model(Vec<EntityRow>),
}

/// Serializes a small event frame, tagged uncompressed.
pub fn encode_event(event: &ServerEvent) -> io::Result<Bytes> {
    let mut payload = serde_json::to_vec(event)?;
    payload.push(TAG_UNCOMPRESSED);
    Ok(Bytes::from(payload))
}

/// Serializes a full snapshot: rows sorted by color so the renderer can
/// batch fills, then zlib-deflated and tagged compressed.
pub fn encode_snapshot(views: &[EntityView]) -> io::Result<Bytes> {
    let mut rows: Vec<EntityRow> = views.iter().map(EntityRow::from).collect();
    rows.sort_by(|a, b| a.6.cmp(&b.6));

    let json = serde_json::to_vec(&ServerEvent::Model(rows))?;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let mut compressed = encoder.finish()?;
    compressed.push(TAG_COMPRESSED);
    Ok(Bytes::from(compressed))
}

/// Turns a world event into its wire frame, carrying over delivery scope.
pub fn frame_world_event(event: &WorldEvent) -> io::Result<OutFrame> {
    match event {
        WorldEvent::Snapshot(views) => Ok(OutFrame {
            target: None,
            bytes: encode_snapshot(views)?,
        }),
        WorldEvent::HighScore { target, high_score } => Ok(OutFrame {
            target: *target,
            bytes: encode_event(&ServerEvent::HighScore(HighScoreUpdate {
                high_score: *high_score,
            }))?,
        }),
        WorldEvent::Death { player_id } => Ok(OutFrame {
            target: Some(*player_id),
            bytes: encode_event(&ServerEvent::Death(true))?,
        }),
        WorldEvent::Experience {
            player_id,
            level,
            experience,
            score,
        } => Ok(OutFrame {
            target: Some(*player_id),
            bytes: encode_event(&ServerEvent::Experience(ExperienceUpdate {
                level: *level,
                experience: *experience,
                score: *score,
            }))?,
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum DirectionToken {
    #[serde(rename = "up")]
    Up,
    #[serde(rename = "down")]
    Down,
    #[serde(rename = "left")]
    Left,
    #[serde(rename = "right")]
    Right,
    #[serde(rename = "up+left")]
    UpLeft,
    #[serde(rename = "up+right")]
    UpRight,
    #[serde(rename = "down+left")]
    DownLeft,
    #[serde(rename = "down+right")]
    DownRight,
    #[serde(rename = "none")]
    None,
}

impl DirectionToken {
    fn into_direction(self) -> Option<Direction> {
        match self {
            DirectionToken::Up => Some(Direction::Up),
            DirectionToken::Down => Some(Direction::Down),
            DirectionToken::Left => Some(Direction::Left),
            DirectionToken::Right => Some(Direction::Right),
            DirectionToken::UpLeft => Some(Direction::UpLeft),
            DirectionToken::UpRight => Some(Direction::UpRight),
            DirectionToken::DownLeft => Some(Direction::DownLeft),
            DirectionToken::DownRight => Some(Direction::DownRight),
            DirectionToken::None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ShootField {
    #[serde(rename = "true")]
    On,
    #[serde(rename = "false")]
    Off,
    #[serde(rename = "direction")]
    Direction,
}

/// Client-to-server message envelope, matching the browser client's JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientCommand {
    Action {
        data: DirectionToken,
    },
    Projectile {
        shoot: ShootField,
        #[serde(default)]
        data: Option<f64>,
    },
    Respawn,
}

impl ClientCommand {
    /// Maps a wire command onto a world command. Returns `None` for frames
    /// that parse but carry nothing actionable, like a non-finite angle.
    pub fn into_player_command(self) -> Option<PlayerCommand> {
        match self {
            ClientCommand::Action { data } => {
                Some(PlayerCommand::Move(data.into_direction()))
            }
            ClientCommand::Projectile {
                shoot: ShootField::On,
                ..
            } => Some(PlayerCommand::SetShooting(true)),
            ClientCommand::Projectile {
                shoot: ShootField::Off,
                ..
            } => Some(PlayerCommand::SetShooting(false)),
            ClientCommand::Projectile {
                shoot: ShootField::Direction,
                data,
            } => data
                .filter(|angle| angle.is_finite())
                .map(PlayerCommand::SetShootingAngle),
            ClientCommand::Respawn => Some(PlayerCommand::Respawn),
        }
    }
}

// Inputs flowing into the world task and the events it emits.

use serde::Serialize;

use crate::domain::{Direction, EntityId, EntityView};

/// A decoded, validated client command. Decoding from the wire happens in
/// the adapter layer; by the time one of these reaches the world task it is
/// structurally sound.
#[derive(Debug, Clone, Copy)]
pub enum PlayerCommand {
    /// Set or clear the discrete movement direction.
    Move(Option<Direction>),
    /// Toggle continuous fire.
    SetShooting(bool),
    /// Update the continuous shooting angle in radians.
    SetShootingAngle(f64),
    /// Ask to come back; honored only while dead.
    Respawn,
}

/// Position override produced by the external agent controller.
#[derive(Debug, Clone, Copy)]
pub struct PositionUpdate {
    pub id: EntityId,
    pub x: f64,
    pub y: f64,
}

/// Everything that may mutate world state, funneled through one
/// single-consumer channel so all mutation happens inside the tick.
#[derive(Debug, Clone)]
pub enum GameEvent {
    Join {
        player_id: EntityId,
        name: Option<String>,
    },
    Leave {
        player_id: EntityId,
    },
    Command {
        player_id: EntityId,
        command: PlayerCommand,
    },
    AgentPositions(Vec<PositionUpdate>),
}

/// Outbound world output, consumed by the frame serializer task.
#[derive(Debug, Clone)]
pub enum WorldEvent {
    /// Periodic full-world snapshot, broadcast to everyone (compressed).
    Snapshot(Vec<EntityView>),
    /// High-score change; targeted at one connection right after join,
    /// broadcast to all otherwise.
    HighScore {
        target: Option<EntityId>,
        high_score: f64,
    },
    /// Death notice for one player.
    Death { player_id: EntityId },
    /// Progression update for one player.
    Experience {
        player_id: EntityId,
        level: u32,
        experience: f64,
        score: f64,
    },
}

/// Per-tick entity row pushed to the agent bridge. Field names stay in the
/// controller's wire vocabulary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeView {
    pub client_id: EntityId,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub top_left_x: f64,
    pub top_left_y: f64,
    pub width: f64,
    pub height: f64,
    pub speed: f64,
}

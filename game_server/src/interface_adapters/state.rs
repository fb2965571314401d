use std::sync::atomic::AtomicU32;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use crate::domain::ArenaLayout;
use crate::use_cases::{GameEvent, IdAllocator};

use super::clients::hub::HubClient;
use super::protocol::OutFrame;

/// Shared handles every connection needs. The world itself is not in here;
/// it lives inside the world task and is only reachable through `input_tx`.
pub struct AppState {
    pub input_tx: mpsc::Sender<GameEvent>,
    pub frames_tx: broadcast::Sender<OutFrame>,
    pub ids: Arc<IdAllocator>,
    pub current_players: AtomicU32,
    pub max_players: u32,
    pub layout: Arc<ArenaLayout>,
    pub hub: Arc<HubClient>,
}

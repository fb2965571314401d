// Use cases layer: the world task and its inputs/outputs.

pub mod game;
pub mod types;
pub mod world;

pub use game::{world_task, WorldTaskConfig};
pub use types::{BridgeView, GameEvent, PlayerCommand, PositionUpdate, WorldEvent};
pub use world::{IdAllocator, World, WorldSettings};

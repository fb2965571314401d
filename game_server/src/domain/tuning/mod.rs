// Gameplay tuning, kept separate from runtime/server configuration.

pub mod agent;
pub mod food;
pub mod player;
pub mod projectile;

pub use agent::AgentTuning;
pub use food::FoodTuning;
pub use player::PlayerTuning;
pub use projectile::ProjectileTuning;

// Domain layer: core simulation types and rules.

pub mod collision;
pub mod entity;
pub mod grid;
pub mod level;
pub mod tuning;
pub mod walls;

pub use entity::{
    Direction, Entity, EntityId, EntityKind, EntityView, Launcher, Progress, Shape,
};
pub use grid::SpatialGrid;
pub use walls::{ArenaLayout, WallSpan};

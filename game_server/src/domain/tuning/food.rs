use std::time::Duration;

/// Gameplay tuning for stationary food pickups.
#[derive(Debug, Clone, Copy)]
pub struct FoodTuning {
    pub size: f64,
    pub max_health: f64,
    pub regen_fraction: f64,
    pub regen_delay: Duration,
    pub body_damage: f64,

    /// Experience banked on the entity; killing it pays out the usual
    /// averaged reward.
    pub experience: f64,

    /// How long after a kill a replacement is spawned.
    pub respawn_delay: Duration,

    /// World population at startup.
    pub initial_count: usize,
}

impl Default for FoodTuning {
    fn default() -> Self {
        Self {
            size: 30.0,
            max_health: 20.0,
            regen_fraction: 0.005,
            regen_delay: Duration::from_secs(10),
            body_damage: 20.0,
            experience: 1000.0,
            respawn_delay: Duration::from_secs(10),
            initial_count: 100,
        }
    }
}

use std::time::Duration;

/// Gameplay tuning for player-controlled tanks.
#[derive(Debug, Clone, Copy)]
pub struct PlayerTuning {
    /// Side length of the square body in pixels.
    pub size: f64,

    /// Movement in pixels per physics substep.
    pub speed: f64,

    pub max_health: f64,

    /// Fraction of max health regained per substep once regen kicks in.
    pub regen_fraction: f64,

    /// Quiet time after taking damage before regen starts.
    pub regen_delay: Duration,

    /// Contact damage dealt to whatever the body collides with.
    pub body_damage: f64,

    /// Initial speed of fired projectiles, pixels per substep.
    pub projectile_speed: f64,

    pub projectile_health: f64,
    pub projectile_damage: f64,

    /// Minimum time between shots while shooting is held.
    pub fire_interval: Duration,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            size: 35.0,
            speed: 10.0,
            max_health: 3000.0,
            regen_fraction: 0.005,
            regen_delay: Duration::from_secs(10),
            body_damage: 20.0,
            projectile_speed: 20.0,
            projectile_health: 40.0,
            projectile_damage: 50.0,
            fire_interval: Duration::from_millis(100),
        }
    }
}

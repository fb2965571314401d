use std::time::Duration;

/// Gameplay tuning for externally controlled agent entities.
#[derive(Debug, Clone, Copy)]
pub struct AgentTuning {
    pub size: f64,

    /// Pixels per substep in normal mode.
    pub speed: f64,

    /// Faster movement while the controller is being evaluated.
    pub eval_speed: f64,

    pub max_health: f64,
    pub regen_fraction: f64,
    pub regen_delay: Duration,
    pub body_damage: f64,
    pub experience: f64,
    pub respawn_delay: Duration,
    pub initial_count: usize,
}

impl Default for AgentTuning {
    fn default() -> Self {
        Self {
            size: 35.0,
            speed: 5.0,
            eval_speed: 15.0,
            max_health: 2000.0,
            regen_fraction: 0.005,
            regen_delay: Duration::from_secs(10),
            body_damage: 20.0,
            experience: 1000.0,
            respawn_delay: Duration::from_secs(10),
            initial_count: 1,
        }
    }
}

use std::time::Duration;

/// Gameplay tuning for projectiles. Most combat numbers come from the
/// spawner's launcher; this covers what the projectile owns itself.
#[derive(Debug, Clone, Copy)]
pub struct ProjectileTuning {
    /// Lifetime after which health is forced to zero.
    pub life_time: Duration,

    /// Projectile body is the spawner's body divided by this.
    pub size_divisor: f64,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            life_time: Duration::from_secs(4),
            size_divisor: 5.0,
        }
    }
}

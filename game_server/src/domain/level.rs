// Leveling: thresholds start at 1000 and grow 10% per level, rounded at each
// step. The same iterative rounding is used in both directions so that
// cumulative experience and the level-up loop agree exactly.

use super::entity::Entity;

const BASE_THRESHOLD: f64 = 1000.0;
const GROWTH: f64 = 1.1;
const LEVEL_SIZE_INCREASE: f64 = 5.0;

/// Experience needed to go from `level` to `level + 1`.
pub fn threshold_for(level: u32) -> f64 {
    let mut threshold = BASE_THRESHOLD;
    for _ in 1..level {
        threshold = (threshold * GROWTH).round();
    }
    threshold
}

/// Cumulative experience required to reach `level` from level 1.
pub fn level_to_experience(level: u32) -> f64 {
    let mut total = 0.0;
    let mut threshold = BASE_THRESHOLD;
    for _ in 1..level {
        total += threshold;
        threshold = (threshold * GROWTH).round();
    }
    total
}

/// Consumes banked experience into levels, keeping the residual. A level-up
/// also grows the entity by a fixed increment, recentered so growth stays
/// centered on the old position. Returns whether any level was gained.
pub fn update_level(entity: &mut Entity) -> bool {
    let mut leveled = false;
    if let Some(progress) = entity.progress_mut() {
        let mut threshold = threshold_for(progress.level);
        while progress.experience >= threshold {
            progress.experience -= threshold;
            threshold = (threshold * GROWTH).round();
            progress.level += 1;
            leveled = true;
        }
        progress.experience = progress.experience.floor();
    }

    if leveled {
        entity.x -= LEVEL_SIZE_INCREASE / 2.0;
        entity.y -= LEVEL_SIZE_INCREASE / 2.0;
        entity.width += LEVEL_SIZE_INCREASE;
        entity.height += LEVEL_SIZE_INCREASE;
    }
    leveled
}

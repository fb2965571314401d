// Pair geometry tests and the symmetric knockback/damage resolution.

use std::time::Instant;

use super::entity::{Entity, Shape};

fn aabb_overlap(a: &Entity, b: &Entity) -> bool {
    a.x + a.width > b.x && a.x < b.x + b.width && a.y + a.height > b.y && a.y < b.y + b.height
}

/// Projectiles pass through their own spawner and through sibling
/// projectiles of the same spawner.
fn excluded_pair(a: &Entity, b: &Entity) -> bool {
    if a.parent_id() == Some(b.id) || b.parent_id() == Some(a.id) {
        return true;
    }
    matches!((a.parent_id(), b.parent_id()), (Some(pa), Some(pb)) if pa == pb)
}

/// Two-phase collision test: cheap AABB reject, then the shape-specific
/// narrow test.
pub fn check_collision(a: &Entity, b: &Entity) -> bool {
    if excluded_pair(a, b) {
        return false;
    }
    if !aabb_overlap(a, b) {
        return false;
    }

    match (a.shape, b.shape) {
        (Shape::Ellipse, Shape::Ellipse) => {
            let (acx, acy) = a.center();
            let (bcx, bcy) = b.center();
            let dx = bcx - acx;
            let dy = bcy - acy;
            let radii_sum_x = (a.width + b.width) / 2.0;
            let radii_sum_y = (a.height + b.height) / 2.0;
            dx * dx / (radii_sum_x * radii_sum_x) + dy * dy / (radii_sum_y * radii_sum_y) < 1.0
        }
        (Shape::Ellipse, Shape::Rectangle) | (Shape::Rectangle, Shape::Ellipse) => {
            let (ellipse, rect) = if a.shape == Shape::Ellipse {
                (a, b)
            } else {
                (b, a)
            };
            let (cx, cy) = ellipse.center();
            let closest_x = cx.clamp(rect.x, rect.x + rect.width);
            let closest_y = cy.clamp(rect.y, rect.y + rect.height);
            let dx = closest_x - cx;
            let dy = closest_y - cy;
            let half_width = ellipse.width / 2.0;
            dx * dx + dy * dy < half_width * half_width
        }
        // For two rectangles the AABB phase is already exact.
        (Shape::Rectangle, Shape::Rectangle) => true,
    }
}

/// Knockback magnitude derived from the pair's discrete directions; always
/// at least 1 so a collision is never free.
fn knockback_amount(a: &Entity, b: &Entity) -> f64 {
    let amount = match (a.direction, b.direction) {
        (Some(da), Some(db)) if da.opposite() == db => (a.speed + b.speed) / 2.0,
        (None, None) => 1.0,
        (None, Some(_)) => b.speed / 2.0,
        (Some(_), None) => a.speed / 2.0,
        (Some(_), Some(_)) => (a.speed - b.speed).abs() / 2.0,
    };
    amount.max(1.0)
}

/// Applies symmetric body damage and pushes the pair apart along the
/// center-to-center axis. The damager id is resolved to the top-level
/// attacker: a projectile credits its spawner, not itself.
pub fn knockback_with_dmg(a: &mut Entity, b: &mut Entity, now: Instant) {
    let amount = knockback_amount(a, b);

    a.current_health -= b.body_damage;
    b.current_health -= a.body_damage;
    a.last_damage = Some(now);
    b.last_damage = Some(now);
    a.last_damager = Some(b.parent_id().unwrap_or(b.id));
    b.last_damager = Some(a.parent_id().unwrap_or(a.id));

    let (acx, acy) = a.center();
    let (bcx, bcy) = b.center();
    let dx = bcx - acx;
    let dy = bcy - acy;
    let distance = (dx * dx + dy * dy).sqrt();
    if distance <= f64::EPSILON {
        // Coincident centers give no push axis; damage still applies.
        return;
    }

    let push_x = dx / distance * amount;
    let push_y = dy / distance * amount;
    a.x -= push_x;
    a.y -= push_y;
    b.x += push_x;
    b.y += push_y;
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::domain::entity::{
        Direction, EntityId, EntityKind, Launcher, PlayerState, Progress, ProjectileState,
    };

    fn ellipse(id: EntityId, x: f64, size: f64) -> Entity {
        Entity {
            id,
            name: None,
            x,
            y: 0.0,
            width: size,
            height: size,
            color: "#123456".to_string(),
            speed: 10.0,
            direction: None,
            shape: Shape::Ellipse,
            max_health: 100.0,
            current_health: 100.0,
            regen_rate: 0.5,
            regen_delay: Duration::from_secs(10),
            last_damage: None,
            body_damage: 20.0,
            last_damager: None,
            kind: EntityKind::Agent {
                progress: Progress::new(1000.0),
            },
        }
    }

    fn projectile(id: EntityId, parent_id: EntityId, x: f64) -> Entity {
        let mut e = ellipse(id, x, 10.0);
        e.kind = EntityKind::Projectile(ProjectileState {
            parent_id,
            level: 1,
            heading: 0.0,
            expires_at: Instant::now() + Duration::from_secs(4),
        });
        e
    }

    fn player(id: EntityId, x: f64) -> Entity {
        let mut e = ellipse(id, x, 35.0);
        e.kind = EntityKind::Player(PlayerState {
            progress: Progress::new(0.0),
            launcher: Launcher {
                projectile_speed: 20.0,
                projectile_health: 40.0,
                projectile_damage: 50.0,
                fire_interval: Duration::from_millis(100),
                last_shot: None,
                shooting_angle: 0.0,
                is_shooting: false,
            },
            respawn_requested: false,
        });
        e
    }

    #[test]
    fn ellipse_pair_at_90_apart_collides_but_not_at_110() {
        // Two 100x100 ellipses: centers 90 units apart on the x axis.
        let a = ellipse(1, 0.0, 100.0);
        let close = ellipse(2, 90.0, 100.0);
        let far = ellipse(3, 110.0, 100.0);
        assert!(check_collision(&a, &close));
        assert!(!check_collision(&a, &far));
    }

    #[test]
    fn projectile_never_collides_with_its_spawner() {
        let shooter = player(1, 0.0);
        let shot = projectile(2, 1, 5.0);
        assert!(!check_collision(&shot, &shooter));
        assert!(!check_collision(&shooter, &shot));
    }

    #[test]
    fn sibling_projectiles_pass_through_each_other() {
        let a = projectile(2, 1, 0.0);
        let b = projectile(3, 1, 2.0);
        assert!(!check_collision(&a, &b));
    }

    #[test]
    fn projectiles_of_different_spawners_do_collide() {
        let a = projectile(2, 1, 0.0);
        let b = projectile(4, 9, 2.0);
        assert!(check_collision(&a, &b));
    }

    #[test]
    fn knockback_magnitude_floors_at_one() {
        let mut a = ellipse(1, 0.0, 40.0);
        let mut b = ellipse(2, 30.0, 40.0);
        a.speed = 0.0;
        b.speed = 0.0;
        a.direction = Some(Direction::Right);
        b.direction = Some(Direction::Down);
        assert_eq!(knockback_amount(&a, &b), 1.0);
    }

    #[test]
    fn opposite_directions_average_speeds() {
        let mut a = ellipse(1, 0.0, 40.0);
        let mut b = ellipse(2, 30.0, 40.0);
        a.speed = 10.0;
        b.speed = 6.0;
        a.direction = Some(Direction::UpRight);
        b.direction = Some(Direction::DownLeft);
        assert_eq!(knockback_amount(&a, &b), 8.0);
    }

    #[test]
    fn single_idle_entity_takes_half_the_other_speed() {
        let mut a = ellipse(1, 0.0, 40.0);
        let mut b = ellipse(2, 30.0, 40.0);
        a.direction = None;
        b.direction = Some(Direction::Left);
        b.speed = 12.0;
        assert_eq!(knockback_amount(&a, &b), 6.0);
    }

    #[test]
    fn knockback_damages_both_and_pushes_apart() {
        let now = Instant::now();
        let mut a = ellipse(1, 0.0, 40.0);
        let mut b = ellipse(2, 30.0, 40.0);
        let gap_before = b.x - a.x;

        knockback_with_dmg(&mut a, &mut b, now);

        assert_eq!(a.current_health, 80.0);
        assert_eq!(b.current_health, 80.0);
        assert_eq!(a.last_damager, Some(2));
        assert_eq!(b.last_damager, Some(1));
        assert_eq!(a.last_damage, Some(now));
        assert!(b.x - a.x > gap_before);
    }

    #[test]
    fn projectile_hit_credits_the_spawner() {
        let now = Instant::now();
        let mut victim = ellipse(5, 0.0, 40.0);
        let mut shot = projectile(9, 1, 20.0);
        knockback_with_dmg(&mut victim, &mut shot, now);
        assert_eq!(victim.last_damager, Some(1));
    }
}

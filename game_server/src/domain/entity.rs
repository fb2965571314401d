// Simulation entities: one common base record plus a kind-specific payload.

use std::f64::consts::FRAC_1_SQRT_2;
use std::time::{Duration, Instant};

pub type EntityId = u64;

/// Discrete 8-way movement direction. `None` on the entity means idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Right,
    Left,
    UpRight,
    UpLeft,
    DownRight,
    DownLeft,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
            Direction::UpRight => Direction::DownLeft,
            Direction::UpLeft => Direction::DownRight,
            Direction::DownRight => Direction::UpLeft,
            Direction::DownLeft => Direction::UpRight,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Rectangle,
    Ellipse,
}

impl Shape {
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Rectangle => "rectangle",
            Shape::Ellipse => "ellipse",
        }
    }
}

/// Level/experience/score progression, present on every kind that can earn
/// rewards (players, agents, food).
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub level: u32,
    pub experience: f64,
    pub score: f64,
}

impl Progress {
    pub fn new(experience: f64) -> Self {
        Self {
            level: 1,
            experience,
            score: 0.0,
        }
    }
}

/// Projectile-spawning parameters, present only on spawner kinds.
#[derive(Debug, Clone, Copy)]
pub struct Launcher {
    pub projectile_speed: f64,
    pub projectile_health: f64,
    pub projectile_damage: f64,
    pub fire_interval: Duration,
    pub last_shot: Option<Instant>,
    pub shooting_angle: f64,
    pub is_shooting: bool,
}

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub progress: Progress,
    pub launcher: Launcher,
    /// Set by the respawn command while the player sits in the
    /// pending-respawn set.
    pub respawn_requested: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ProjectileState {
    /// Spawner link, stable for the projectile's lifetime.
    pub parent_id: EntityId,
    pub level: u32,
    /// Continuous movement angle in radians.
    pub heading: f64,
    /// Health is forced to zero once this instant passes.
    pub expires_at: Instant,
}

#[derive(Debug, Clone)]
pub enum EntityKind {
    Player(PlayerState),
    Food { progress: Progress },
    Agent { progress: Progress },
    Projectile(ProjectileState),
}

/// One simulated object. Position is the top-left corner; width/height are
/// always positive magnitudes.
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub name: Option<String>,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
    pub speed: f64,
    pub direction: Option<Direction>,
    pub shape: Shape,
    pub max_health: f64,
    pub current_health: f64,
    pub regen_rate: f64,
    pub regen_delay: Duration,
    pub last_damage: Option<Instant>,
    pub body_damage: f64,
    pub last_damager: Option<EntityId>,
    pub kind: EntityKind,
}

impl Entity {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn kind_label(&self) -> &'static str {
        match self.kind {
            EntityKind::Player(_) => "player",
            EntityKind::Food { .. } => "food",
            EntityKind::Agent { .. } => "agent",
            EntityKind::Projectile(_) => "projectile",
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.kind, EntityKind::Player(_))
    }

    pub fn parent_id(&self) -> Option<EntityId> {
        match self.kind {
            EntityKind::Projectile(ref p) => Some(p.parent_id),
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<&Progress> {
        match self.kind {
            EntityKind::Player(ref p) => Some(&p.progress),
            EntityKind::Food { ref progress } | EntityKind::Agent { ref progress } => {
                Some(progress)
            }
            EntityKind::Projectile(_) => None,
        }
    }

    pub fn progress_mut(&mut self) -> Option<&mut Progress> {
        match self.kind {
            EntityKind::Player(ref mut p) => Some(&mut p.progress),
            EntityKind::Food { ref mut progress } | EntityKind::Agent { ref mut progress } => {
                Some(progress)
            }
            EntityKind::Projectile(_) => None,
        }
    }

    pub fn launcher(&self) -> Option<&Launcher> {
        match self.kind {
            EntityKind::Player(ref p) => Some(&p.launcher),
            _ => None,
        }
    }

    pub fn launcher_mut(&mut self) -> Option<&mut Launcher> {
        match self.kind {
            EntityKind::Player(ref mut p) => Some(&mut p.launcher),
            _ => None,
        }
    }

    pub fn shooting_angle(&self) -> Option<f64> {
        self.launcher().map(|l| l.shooting_angle)
    }

    /// Integrates one physics substep of movement: discrete 8-way for
    /// direction-driven kinds, continuous heading for projectiles. Speed is
    /// expressed in pixels per substep.
    pub fn integrate_movement(&mut self) {
        match self.direction {
            Some(Direction::Up) => self.y -= self.speed,
            Some(Direction::Down) => self.y += self.speed,
            Some(Direction::Right) => self.x += self.speed,
            Some(Direction::Left) => self.x -= self.speed,
            Some(Direction::UpRight) => {
                self.y -= self.speed * FRAC_1_SQRT_2;
                self.x += self.speed * FRAC_1_SQRT_2;
            }
            Some(Direction::UpLeft) => {
                self.y -= self.speed * FRAC_1_SQRT_2;
                self.x -= self.speed * FRAC_1_SQRT_2;
            }
            Some(Direction::DownRight) => {
                self.y += self.speed * FRAC_1_SQRT_2;
                self.x += self.speed * FRAC_1_SQRT_2;
            }
            Some(Direction::DownLeft) => {
                self.y += self.speed * FRAC_1_SQRT_2;
                self.x -= self.speed * FRAC_1_SQRT_2;
            }
            None => {}
        }

        if let EntityKind::Projectile(ref p) = self.kind {
            self.x += p.heading.cos() * self.speed;
            self.y += p.heading.sin() * self.speed;
        }
    }

    /// Re-clamps current health to the max; run every substep.
    pub fn clamp_health(&mut self) {
        if self.current_health > self.max_health {
            self.current_health = self.max_health;
        }
    }

    /// Adds one regen increment if damaged and the regen delay has elapsed
    /// since the last hit.
    pub fn regenerate(&mut self, now: Instant) {
        if self.current_health >= self.max_health {
            return;
        }
        let delay_elapsed = self
            .last_damage
            .is_none_or(|t| now.duration_since(t) >= self.regen_delay);
        if delay_elapsed {
            self.current_health += self.regen_rate;
        }
    }
}

/// Reduced public view of an entity, the only shape that ever reaches
/// clients. Internal fields (regen, fire rate, parent links) stay server-side.
#[derive(Debug, Clone)]
pub struct EntityView {
    pub id: EntityId,
    pub name: Option<String>,
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub max_health: f64,
    pub current_health: f64,
    pub shape: Shape,
    pub kind: &'static str,
    pub shooting_angle: Option<f64>,
}

impl From<&Entity> for EntityView {
    fn from(e: &Entity) -> Self {
        Self {
            id: e.id,
            name: e.name.clone(),
            width: e.width,
            height: e.height,
            x: e.x,
            y: e.y,
            color: e.color.clone(),
            max_health: e.max_health,
            current_health: e.current_health,
            shape: e.shape,
            kind: e.kind_label(),
            shooting_angle: e.shooting_angle(),
        }
    }
}

// The world aggregate: every live entity, the broad-phase grid and all
// deferred work queues. Owned exclusively by the world task; nothing outside
// the tick ever mutates it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::SpatialGrid;
use crate::domain::collision::{check_collision, knockback_with_dmg};
use crate::domain::entity::{
    Entity, EntityId, EntityKind, EntityView, Launcher, PlayerState, Progress, ProjectileState,
    Shape,
};
use crate::domain::level::{level_to_experience, update_level};
use crate::domain::tuning::{AgentTuning, FoodTuning, PlayerTuning, ProjectileTuning};
use crate::domain::walls::{ArenaLayout, WallSpan, resolve_wall_penetration};

use super::types::{BridgeView, PlayerCommand, PositionUpdate, WorldEvent};

/// Process-wide id source shared between the world task (food, agents,
/// projectiles) and the connection registry (players). Ids increase
/// monotonically and are never handed out twice.
#[derive(Debug, Default)]
pub struct IdAllocator(AtomicU64);

impl IdAllocator {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn next_id(&self) -> EntityId {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WorldSettings {
    pub eval_mode: bool,
    pub player: PlayerTuning,
    pub food: FoodTuning,
    pub agent: AgentTuning,
    pub projectile: ProjectileTuning,
}

#[derive(Debug, Clone, Copy)]
struct Reward {
    attacker: EntityId,
    experience: f64,
}

#[derive(Debug, Clone, Copy)]
enum SpawnKind {
    Food,
    Agent,
}

#[derive(Debug, Clone, Copy)]
struct DelayedSpawn {
    kind: SpawnKind,
    due: Instant,
}

pub struct World {
    layout: Arc<ArenaLayout>,
    settings: WorldSettings,
    ids: Arc<IdAllocator>,
    rng: StdRng,
    entities: Vec<Entity>,
    grid: SpatialGrid,
    overshoot_walls: Vec<WallSpan>,
    pending_shots: Vec<EntityId>,
    pending_rewards: Vec<Reward>,
    pending_respawns: Vec<Entity>,
    delayed_spawns: Vec<DelayedSpawn>,
    high_score: f64,
    events: Vec<WorldEvent>,
}

impl World {
    pub fn new(layout: Arc<ArenaLayout>, settings: WorldSettings, ids: Arc<IdAllocator>) -> Self {
        let grid = SpatialGrid::new(
            layout.width(),
            layout.height(),
            layout.rows(),
            layout.cols(),
        );
        let overshoot_walls = layout.overshoot_walls();
        Self {
            layout,
            settings,
            ids,
            rng: StdRng::from_entropy(),
            entities: Vec::new(),
            grid,
            overshoot_walls,
            pending_shots: Vec::new(),
            pending_rewards: Vec::new(),
            pending_respawns: Vec::new(),
            delayed_spawns: Vec::new(),
            high_score: 0.0,
            events: Vec::new(),
        }
    }

    /// Seeds the arena with its starting food and agent population. Food is
    /// skipped in evaluation mode to keep controller runs clean.
    pub fn populate(&mut self) {
        if !self.settings.eval_mode {
            for _ in 0..self.settings.food.initial_count {
                self.spawn_food();
            }
        }
        for _ in 0..self.settings.agent.initial_count {
            self.spawn_agent();
        }
    }

    pub fn high_score(&self) -> f64 {
        self.high_score
    }

    pub fn layout(&self) -> &ArenaLayout {
        &self.layout
    }

    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn snapshot(&self) -> Vec<EntityView> {
        self.entities.iter().map(EntityView::from).collect()
    }

    pub fn bridge_views(&self) -> Vec<BridgeView> {
        self.entities
            .iter()
            .map(|e| BridgeView {
                client_id: e.id,
                kind: e.kind_label(),
                top_left_x: e.x,
                top_left_y: e.y,
                width: e.width,
                height: e.height,
                speed: e.speed,
            })
            .collect()
    }

    /// Greets a just-joined connection with the current high score.
    pub fn greet_high_score(&mut self, player_id: EntityId) {
        self.events.push(WorldEvent::HighScore {
            target: Some(player_id),
            high_score: self.high_score,
        });
    }

    pub fn spawn_player(&mut self, id: EntityId, name: Option<String>) {
        let t = self.settings.player;
        let (x, y) = self.layout.random_spawn(&mut self.rng);
        let color = random_color(&mut self.rng);
        self.entities.push(Entity {
            id,
            name,
            x,
            y,
            width: t.size,
            height: t.size,
            color,
            speed: t.speed,
            direction: None,
            shape: Shape::Ellipse,
            max_health: t.max_health,
            current_health: t.max_health,
            regen_rate: t.regen_fraction * t.max_health,
            regen_delay: t.regen_delay,
            last_damage: None,
            body_damage: t.body_damage,
            last_damager: None,
            kind: EntityKind::Player(PlayerState {
                progress: Progress {
                    level: 1,
                    experience: 0.0,
                    score: 0.0,
                },
                launcher: Launcher {
                    projectile_speed: t.projectile_speed,
                    projectile_health: t.projectile_health,
                    projectile_damage: t.projectile_damage,
                    fire_interval: t.fire_interval,
                    last_shot: None,
                    shooting_angle: 0.0,
                    is_shooting: false,
                },
                respawn_requested: false,
            }),
        });
    }

    pub fn spawn_food(&mut self) {
        let t = self.settings.food;
        let id = self.ids.next_id();
        let (x, y) = self.layout.random_spawn(&mut self.rng);
        self.entities.push(Entity {
            id,
            name: None,
            x,
            y,
            width: t.size,
            height: t.size,
            color: parity_color(id),
            speed: 0.0,
            direction: None,
            shape: Shape::Ellipse,
            max_health: t.max_health,
            current_health: t.max_health,
            regen_rate: t.regen_fraction * t.max_health,
            regen_delay: t.regen_delay,
            last_damage: None,
            body_damage: t.body_damage,
            last_damager: None,
            kind: EntityKind::Food {
                progress: Progress::new(t.experience),
            },
        });
    }

    pub fn spawn_agent(&mut self) {
        let t = self.settings.agent;
        let id = self.ids.next_id();
        let (x, y) = self.layout.random_spawn(&mut self.rng);
        let speed = if self.settings.eval_mode {
            t.eval_speed
        } else {
            t.speed
        };
        self.entities.push(Entity {
            id,
            name: None,
            x,
            y,
            width: t.size,
            height: t.size,
            color: parity_color(id),
            speed,
            direction: None,
            shape: Shape::Ellipse,
            max_health: t.max_health,
            current_health: t.max_health,
            regen_rate: t.regen_fraction * t.max_health,
            regen_delay: t.regen_delay,
            last_damage: None,
            body_damage: t.body_damage,
            last_damager: None,
            kind: EntityKind::Agent {
                progress: Progress::new(t.experience),
            },
        });
    }

    fn spawn_projectile(&mut self, parent_id: EntityId, now: Instant) {
        let Some(parent_idx) = self.entities.iter().position(|e| e.id == parent_id) else {
            // The spawner died between queueing and firing.
            return;
        };

        let (px, py, pw, ph, color, level, launcher) = {
            let p = &self.entities[parent_idx];
            (
                p.x,
                p.y,
                p.width,
                p.height,
                p.color.clone(),
                p.progress().map(|pr| pr.level).unwrap_or(1),
                p.launcher().copied(),
            )
        };
        let Some(launcher) = launcher else { return };
        if let Some(l) = self.entities[parent_idx].launcher_mut() {
            l.last_shot = Some(now);
        }

        let t = self.settings.projectile;
        let width = pw / t.size_divisor;
        let height = ph / t.size_divisor;
        let angle = launcher.shooting_angle;
        let x = px + pw / 2.0 - width / 2.0 + angle.cos() * pw / 2.0;
        let y = py + ph / 2.0 - height / 2.0 + angle.sin() * ph / 2.0;

        let id = self.ids.next_id();
        self.entities.push(Entity {
            id,
            name: None,
            x,
            y,
            width,
            height,
            color,
            speed: launcher.projectile_speed,
            direction: None,
            shape: Shape::Ellipse,
            max_health: launcher.projectile_health,
            current_health: launcher.projectile_health,
            regen_rate: 0.0,
            regen_delay: Duration::from_secs(10),
            last_damage: None,
            body_damage: launcher.projectile_damage,
            last_damager: None,
            kind: EntityKind::Projectile(ProjectileState {
                parent_id,
                level,
                heading: angle,
                expires_at: now + t.life_time,
            }),
        });
    }

    /// Tick-safe removal for a disconnected client: the live entity and any
    /// pending-respawn entry go away; projectiles they fired keep flying.
    pub fn remove_client(&mut self, id: EntityId) {
        self.entities.retain(|e| e.id != id);
        self.pending_respawns.retain(|e| e.id != id);
        self.recompute_high_score();
    }

    pub fn apply_command(&mut self, player_id: EntityId, command: PlayerCommand) {
        match command {
            PlayerCommand::Move(direction) => {
                if let Some(e) = self.entity_mut(player_id) {
                    e.direction = direction;
                }
            }
            PlayerCommand::SetShooting(active) => {
                if let Some(l) = self.entity_mut(player_id).and_then(Entity::launcher_mut) {
                    l.is_shooting = active;
                }
            }
            PlayerCommand::SetShootingAngle(angle) => {
                if let Some(l) = self.entity_mut(player_id).and_then(Entity::launcher_mut) {
                    l.shooting_angle = angle;
                }
            }
            PlayerCommand::Respawn => self.request_respawn(player_id),
        }
    }

    /// Respawn intent only means something for an entity already in the
    /// pending-respawn set, i.e. one whose health hit zero.
    fn request_respawn(&mut self, player_id: EntityId) {
        for pending in &mut self.pending_respawns {
            if pending.id == player_id {
                if let EntityKind::Player(ref mut state) = pending.kind {
                    state.respawn_requested = true;
                }
            }
        }
    }

    /// Position overrides from the external controller, applied only to ids
    /// that still exist.
    pub fn apply_agent_positions(&mut self, updates: &[PositionUpdate]) {
        for update in updates {
            if let Some(e) = self.entity_mut(update.id) {
                e.x = update.x;
                e.y = update.y;
            }
        }
    }

    /// One physics substep.
    pub fn step(&mut self, now: Instant) {
        self.move_and_index(now);
        self.fire_pending_shots(now);
        self.apply_rewards();
        self.resolve_collisions(now);
        self.grid.clear();
        self.death_sweep(now);
        self.respawn_sweep();
        self.drain_due_spawns(now);
    }

    fn move_and_index(&mut self, now: Instant) {
        let world_width = self.layout.width();
        let world_height = self.layout.height();

        for idx in 0..self.entities.len() {
            let shot = {
                let e = &mut self.entities[idx];
                e.integrate_movement();
                e.clamp_health();
                e.regenerate(now);

                if let EntityKind::Projectile(ref p) = e.kind {
                    if now >= p.expires_at {
                        e.current_health = 0.0;
                    }
                }

                let fire = e.launcher().is_some_and(|l| {
                    l.is_shooting
                        && l.last_shot
                            .is_none_or(|t| now.duration_since(t) >= l.fire_interval)
                });

                e.x = e.x.clamp(0.0, world_width - e.width);
                e.y = e.y.clamp(0.0, world_height - e.height);

                fire.then_some(e.id)
            };

            resolve_wall_penetration(&mut self.entities[idx], &self.overshoot_walls, &self.layout);

            let (x, y, w, h) = {
                let e = &self.entities[idx];
                (e.x, e.y, e.width, e.height)
            };
            self.grid.insert(idx, x, y, w, h);

            if let Some(id) = shot {
                self.pending_shots.push(id);
            }
        }
    }

    /// Drains the shot queue built during the movement pass. Spawning is
    /// deferred here so the entity list is never grown mid-iteration.
    fn fire_pending_shots(&mut self, now: Instant) {
        let shots = std::mem::take(&mut self.pending_shots);
        for parent_id in shots {
            self.spawn_projectile(parent_id, now);
        }
    }

    fn apply_rewards(&mut self) {
        if self.pending_rewards.is_empty() {
            return;
        }
        let rewards = std::mem::take(&mut self.pending_rewards);
        let mut rewarded = false;

        for idx in 0..self.entities.len() {
            for reward in &rewards {
                let e = &mut self.entities[idx];
                if e.id != reward.attacker || e.current_health <= 0.0 {
                    continue;
                }
                let Some(progress) = e.progress_mut() else {
                    continue;
                };
                progress.experience += reward.experience;
                progress.score += reward.experience;
                update_level(e);
                rewarded = true;

                if e.is_player() {
                    if let Some(p) = e.progress() {
                        let event = WorldEvent::Experience {
                            player_id: e.id,
                            level: p.level,
                            experience: p.experience,
                            score: p.score,
                        };
                        self.events.push(event);
                    }
                }
            }
        }

        if rewarded {
            self.recompute_high_score();
        }
    }

    fn resolve_collisions(&mut self, now: Instant) {
        // TODO: a pair sharing several cells is resolved once per shared
        // cell; dedupe if double knockback ever shows up in play.
        let mut scratch: Vec<usize> = Vec::new();
        for row in 0..self.grid.rows() {
            for col in 0..self.grid.cols() {
                scratch.clear();
                scratch.extend_from_slice(self.grid.cell(row, col));

                for i in 0..scratch.len() {
                    for j in (i + 1)..scratch.len() {
                        let (lo, hi) = if scratch[i] < scratch[j] {
                            (scratch[i], scratch[j])
                        } else {
                            (scratch[j], scratch[i])
                        };
                        if lo == hi {
                            continue;
                        }
                        let (left, right) = self.entities.split_at_mut(hi);
                        let a = &mut left[lo];
                        let b = &mut right[0];
                        if check_collision(a, b) {
                            knockback_with_dmg(a, b, now);
                        }
                    }
                }
            }
        }
    }

    /// Removes everything whose health dropped to zero or below. Rewards are
    /// queued for the top-level attacker; food and agents schedule a delayed
    /// replacement; players park in the pending-respawn set.
    fn death_sweep(&mut self, now: Instant) {
        let mut idx = 0;
        while idx < self.entities.len() {
            if self.entities[idx].current_health <= 0.0 {
                let dead = self.entities.remove(idx);
                self.handle_death(dead, now);
            } else {
                idx += 1;
            }
        }
    }

    fn handle_death(&mut self, dead: Entity, now: Instant) {
        if let (Some(progress), Some(attacker)) = (dead.progress(), dead.last_damager) {
            // Reward splits the difference between banked residual
            // experience and the cumulative cost of the victim's level.
            let experience =
                ((progress.experience + level_to_experience(progress.level)) / 2.0).round();
            self.pending_rewards.push(Reward {
                attacker,
                experience,
            });
        }

        match dead.kind {
            EntityKind::Food { .. } => self.delayed_spawns.push(DelayedSpawn {
                kind: SpawnKind::Food,
                due: now + self.settings.food.respawn_delay,
            }),
            EntityKind::Agent { .. } => self.delayed_spawns.push(DelayedSpawn {
                kind: SpawnKind::Agent,
                due: now + self.settings.agent.respawn_delay,
            }),
            EntityKind::Player(_) => {
                self.events.push(WorldEvent::Death { player_id: dead.id });
                self.pending_respawns.push(dead);
            }
            EntityKind::Projectile(_) => {}
        }
    }

    fn respawn_sweep(&mut self) {
        let mut idx = 0;
        while idx < self.pending_respawns.len() {
            let requested = matches!(
                self.pending_respawns[idx].kind,
                EntityKind::Player(ref state) if state.respawn_requested
            );
            if requested {
                let old = self.pending_respawns.remove(idx);
                self.respawn_player(old);
            } else {
                idx += 1;
            }
        }
    }

    /// Brings a dead player back with a fresh body and the averaged score
    /// they earned so far.
    fn respawn_player(&mut self, old: Entity) {
        let (level, experience) = old
            .progress()
            .map(|p| (p.level, p.experience))
            .unwrap_or((1, 0.0));
        let inherited = (level_to_experience(level) + experience) / 2.0;
        let id = old.id;

        self.spawn_player(id, old.name);
        if let Some(idx) = self.entities.iter().position(|e| e.id == id) {
            {
                let e = &mut self.entities[idx];
                if let Some(p) = e.progress_mut() {
                    p.experience = inherited;
                    p.score = inherited;
                }
                update_level(e);
            }
            if let Some(p) = self.entities[idx].progress() {
                let event = WorldEvent::Experience {
                    player_id: id,
                    level: p.level,
                    experience: p.experience,
                    score: p.score,
                };
                self.events.push(event);
            }
        }
        self.recompute_high_score();
    }

    fn drain_due_spawns(&mut self, now: Instant) {
        let mut idx = 0;
        while idx < self.delayed_spawns.len() {
            if self.delayed_spawns[idx].due <= now {
                let spawn = self.delayed_spawns.remove(idx);
                match spawn.kind {
                    SpawnKind::Food => self.spawn_food(),
                    SpawnKind::Agent => self.spawn_agent(),
                }
            } else {
                idx += 1;
            }
        }
    }

    /// Highest score across live players; zero when no player has one.
    /// Emits a broadcast event whenever the value changes.
    fn recompute_high_score(&mut self) {
        let best = self
            .entities
            .iter()
            .filter(|e| e.is_player())
            .filter_map(|e| e.progress().map(|p| p.score))
            .fold(None::<f64>, |acc, score| {
                Some(acc.map_or(score, |a| a.max(score)))
            });
        let new = match best {
            Some(score) if score > 0.0 => score,
            _ => 0.0,
        };
        if new != self.high_score {
            self.high_score = new;
            self.events.push(WorldEvent::HighScore {
                target: None,
                high_score: new,
            });
        }
    }
}

fn random_color<R: Rng>(rng: &mut R) -> String {
    format!("#{:06x}", rng.gen_range(0..0x0100_0000u32))
}

/// Food and agents alternate between two fixed colors so the renderer can
/// batch them.
fn parity_color(id: EntityId) -> String {
    if id % 2 == 0 {
        "#AA0000".to_string()
    } else {
        "#00AAAA".to_string()
    }
}

// The world task: the only place entities are mutated. Connections feed it
// through an mpsc channel and listen on a broadcast channel, so the
// simulation itself never needs a lock.

use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use super::types::{BridgeView, GameEvent, WorldEvent};
use super::world::World;

#[derive(Debug, Clone, Copy)]
pub struct WorldTaskConfig {
    /// Wall-clock length of one tick.
    pub tick_interval: Duration,

    /// Physics substeps per tick.
    pub substeps: u32,
}

/// Runs the simulation until every input sender is gone.
///
/// Each tick drains queued inputs, advances the world by the configured
/// number of substeps, broadcasts the resulting events and snapshot, and
/// hands the external controller a fresh view when a bridge is attached.
pub async fn world_task(
    mut input_rx: mpsc::Receiver<GameEvent>,
    world_tx: broadcast::Sender<WorldEvent>,
    bridge_tx: Option<mpsc::Sender<Vec<BridgeView>>>,
    mut world: World,
    config: WorldTaskConfig,
) {
    let mut interval = tokio::time::interval(config.tick_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    info!(
        tick_ms = config.tick_interval.as_millis() as u64,
        substeps = config.substeps,
        "world task started"
    );

    loop {
        interval.tick().await;

        loop {
            match input_rx.try_recv() {
                Ok(event) => apply_event(&mut world, event),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    info!("all input senders dropped, world task shutting down");
                    return;
                }
            }
        }

        for _ in 0..config.substeps {
            world.step(Instant::now());
        }

        for event in world.drain_events() {
            // Send fails only when no connection is subscribed.
            let _ = world_tx.send(event);
        }
        let _ = world_tx.send(WorldEvent::Snapshot(world.snapshot()));

        if let Some(ref bridge) = bridge_tx {
            if let Err(err) = bridge.try_send(world.bridge_views()) {
                debug!(%err, "bridge channel full, dropping frame");
            }
        }
    }
}

fn apply_event(world: &mut World, event: GameEvent) {
    match event {
        GameEvent::Join { player_id, name } => {
            info!(player_id, name = name.as_deref().unwrap_or(""), "player joined");
            world.spawn_player(player_id, name);
            world.greet_high_score(player_id);
        }
        GameEvent::Leave { player_id } => {
            info!(player_id, "player left");
            world.remove_client(player_id);
        }
        GameEvent::Command { player_id, command } => {
            world.apply_command(player_id, command);
        }
        GameEvent::AgentPositions(updates) => {
            if updates.is_empty() {
                warn!("controller sent an empty position batch");
            }
            world.apply_agent_positions(&updates);
        }
    }
}

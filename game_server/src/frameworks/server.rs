// Framework bootstrap for the game server runtime.

use crate::frameworks::config;
use crate::interface_adapters::agent_bridge::spawn_agent_bridge;
use crate::interface_adapters::clients::hub::HubClient;
use crate::interface_adapters::net::{event_serializer, ws_handler};
use crate::interface_adapters::protocol::OutFrame;
use crate::interface_adapters::state::AppState;
use crate::use_cases::{
    world_task, GameEvent, IdAllocator, World, WorldEvent, WorldSettings, WorldTaskConfig,
};

use crate::domain::ArenaLayout;
use axum::{Router, routing::get};
use std::io::Result;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(address.port())?;

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state(port: u16) -> Result<Arc<AppState>> {
    let hub = HubClient::new(
        config::hub_base_url(),
        config::hub_secret(),
        config::server_name(port),
        port,
        config::max_players(),
        config::hub_request_timeout(),
    )
    .map_err(|e| std::io::Error::other(format!("failed to initialize hub client: {e}")))?;
    let hub = Arc::new(hub);

    // Setup Channels
    // input_tx/rx: all client and controller inputs go to the world task.
    let (input_tx, input_rx) = mpsc::channel::<GameEvent>(config::INPUT_CHANNEL_CAPACITY);

    // world_tx: raw world events, consumed only by the serializer.
    let (world_tx, world_rx) = broadcast::channel::<WorldEvent>(config::FRAME_BROADCAST_CAPACITY);

    // frames_tx: serialized frames shared across all connections.
    let (frames_tx, _frames_rx) = broadcast::channel::<OutFrame>(config::FRAME_BROADCAST_CAPACITY);

    let ids = Arc::new(IdAllocator::new());
    let layout = Arc::new(ArenaLayout::default());
    let eval_mode = config::eval_mode();

    let bridge_tx = spawn_agent_bridge(
        layout.clone(),
        eval_mode,
        config::agent_controller_cmd(),
        input_tx.clone(),
        config::BRIDGE_CHANNEL_CAPACITY,
    );

    // Spawn the Game Loop (World Task)
    let settings = WorldSettings {
        eval_mode,
        ..WorldSettings::default()
    };
    let mut world = World::new(layout.clone(), settings, ids.clone());
    world.populate();
    tokio::spawn(world_task(
        input_rx,
        world_tx.clone(),
        bridge_tx,
        world,
        WorldTaskConfig {
            tick_interval: config::TICK_INTERVAL,
            substeps: config::PHYSICS_SUBSTEPS,
        },
    ));

    // Spawn the frame serializer task in the adapter layer.
    tokio::spawn(event_serializer(world_rx, frames_tx.clone()));

    let state = Arc::new(AppState {
        input_tx,
        frames_tx,
        ids,
        current_players: AtomicU32::new(0),
        max_players: config::max_players(),
        layout,
        hub,
    });

    // Keep the directory record fresh so the hub can list us.
    let announce_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(config::HUB_ANNOUNCE_INTERVAL);
        loop {
            interval.tick().await;
            let count = announce_state.current_players.load(Ordering::Acquire);
            announce_state.hub.push_server_info(count).await;
        }
    });

    Ok(state)
}

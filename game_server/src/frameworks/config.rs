use std::{env, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("GAME_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn hub_base_url() -> String {
    env::var("HUB_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string())
}

pub fn hub_secret() -> String {
    env::var("HUB_SHARED_SECRET").unwrap_or_else(|_| "dev-secret".to_string())
}

pub fn hub_request_timeout() -> Duration {
    let millis = env::var("HUB_REQUEST_TIMEOUT_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(1500);
    Duration::from_millis(millis)
}

pub fn max_players() -> u32 {
    env::var("MAX_PLAYERS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5)
}

/// Evaluation mode: no food, fast agents, meant for scoring a controller.
pub fn eval_mode() -> bool {
    matches!(env::var("EVAL_MODE").as_deref(), Ok("1") | Ok("true"))
}

/// Command line used to launch the external agent controller. Unset means
/// agents simply stand still.
pub fn agent_controller_cmd() -> Option<String> {
    env::var("AGENT_CONTROLLER_CMD")
        .ok()
        .filter(|v| !v.trim().is_empty())
}

pub fn server_name(port: u16) -> String {
    env::var("SERVER_NAME").unwrap_or_else(|_| format!("Server {port}"))
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const FRAME_BROADCAST_CAPACITY: usize = 128;
pub const BRIDGE_CHANNEL_CAPACITY: usize = 8;

pub const TICK_INTERVAL: Duration = Duration::from_millis(40);
pub const PHYSICS_SUBSTEPS: u32 = 8;

// How often the full directory record is refreshed at the hub.
pub const HUB_ANNOUNCE_INTERVAL: Duration = Duration::from_secs(2);

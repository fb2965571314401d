use std::{env, time::Duration};

// Runtime/server constants.

pub fn http_port() -> u16 {
    env::var("HUB_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000)
}

pub fn shared_secret() -> String {
    env::var("HUB_SHARED_SECRET").unwrap_or_else(|_| "dev-secret".to_string())
}

pub fn probe_host() -> String {
    env::var("PROBE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string())
}

pub const PROBE_INTERVAL: Duration = Duration::from_secs(2);
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

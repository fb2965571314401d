use tokio::sync::Mutex;

use crate::domain::Registry;

// Shared application state for the HTTP handlers and the reachability poller.
pub struct AppState {
    pub registry: Mutex<Registry>,
    pub secret: String,
    pub probe_host: String,
}

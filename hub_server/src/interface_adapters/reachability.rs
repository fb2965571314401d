// Background probe that keeps directory records honest: a server that stops
// answering its TCP port is shown offline without it having to say goodbye.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::info;

use crate::interface_adapters::state::AppState;

pub fn spawn_reachability_poller(
    state: Arc<AppState>,
    interval: Duration,
    probe_timeout: Duration,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;

            // Snapshot the ports first so the lock is never held across a probe.
            let ports = { state.registry.lock().await.ports() };
            for port in ports {
                let reachable = tokio::time::timeout(
                    probe_timeout,
                    TcpStream::connect((state.probe_host.as_str(), port)),
                )
                .await
                .map(|result| result.is_ok())
                .unwrap_or(false);

                let mut registry = state.registry.lock().await;
                if registry.mark_reachable(port, reachable) {
                    info!(port, reachable, "server reachability changed");
                }
            }
        }
    });
}

use crate::domain::ServerDescriptor;
use crate::interface_adapters::protocol::{ErrorResponse, PlayerCountPush, ServerDescriptorDto};
use crate::interface_adapters::state::AppState;

use axum::{Json, extract::State, http::HeaderMap, http::StatusCode};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared-secret check for the push endpoints. The directory listing itself
/// stays public.
fn authorized(state: &AppState, headers: &HeaderMap) -> bool {
    headers
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == state.secret)
}

fn unauthorized() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            message: "invalid shared secret".to_string(),
        }),
    )
}

// List every known game server.
pub async fn get_server_data(State(state): State<Arc<AppState>>) -> Json<Vec<ServerDescriptorDto>> {
    let registry = state.registry.lock().await;
    Json(registry.list().iter().map(ServerDescriptorDto::from).collect())
}

// Register a game server or refresh its directory record.
pub async fn post_server_data(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(dto): Json<ServerDescriptorDto>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    if !authorized(&state, &headers) {
        warn!(port = dto.port, "server-data push with bad secret");
        return Err(unauthorized());
    }

    let descriptor = ServerDescriptor::from(dto);
    let port = descriptor.port;
    let mut registry = state.registry.lock().await;
    if registry.upsert(descriptor) {
        info!(port, "game server registered");
    } else {
        debug!(port, "game server record refreshed");
    }
    Ok(StatusCode::OK)
}

// Update the live player count of an already-registered server.
pub async fn post_player_count(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(push): Json<PlayerCountPush>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    if !authorized(&state, &headers) {
        warn!(port = push.port, "player-count push with bad secret");
        return Err(unauthorized());
    }

    let mut registry = state.registry.lock().await;
    if registry.set_player_count(push.port, push.player_count) {
        debug!(port = push.port, count = push.player_count, "player count updated");
        Ok(StatusCode::OK)
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                message: "unknown server port".to_string(),
            }),
        ))
    }
}

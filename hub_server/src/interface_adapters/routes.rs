use crate::interface_adapters::handlers::{get_server_data, post_player_count, post_server_data};
use crate::interface_adapters::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

// Build the HTTP router for the directory endpoints.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/serverdata", get(get_server_data).post(post_server_data))
        .route("/playercount", post(post_player_count))
        .with_state(state)
}

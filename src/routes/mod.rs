pub mod commands;
pub mod health;

use crate::commands::CommandDispatcher;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Builds the HTTP router exposing the command surface.
pub fn router(dispatcher: Arc<CommandDispatcher>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/commands/:method", post(commands::dispatch_command))
        .with_state(dispatcher)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

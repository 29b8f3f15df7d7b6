use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::commands::{CommandDispatcher, CommandResponse};

pub async fn dispatch_command(
    State(dispatcher): State<Arc<CommandDispatcher>>,
    Path(method): Path<String>,
    body: Bytes,
) -> Json<CommandResponse> {
    tracing::debug!(method = %method, "Dispatching command");

    let arguments = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(method = %method, error = %e, "Rejected malformed arguments");
                return Json(CommandResponse::error(
                    format!("Invalid JSON arguments: {}", e),
                    "INVALID_ARGUMENT",
                ));
            }
        }
    };

    let response = dispatcher.dispatch(&method, &arguments).await;

    if response.success {
        tracing::debug!(method = %method, "Command succeeded");
    } else if let Some(ref error) = response.error {
        tracing::warn!(method = %method, code = %error.code, message = %error.message, "Command failed");
    }

    Json(response)
}

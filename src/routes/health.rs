use axum::Json;
use serde_json::{json, Value};

use crate::commands::COMMANDS;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "commands": COMMANDS,
    }))
}

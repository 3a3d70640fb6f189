pub mod sentences;
pub mod users;

use axum::Json;
use serde_json::{Value, json};

pub async fn ping() -> Json<Value> {
    Json(json!({ "message": "Ping!" }))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

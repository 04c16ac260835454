use axum::Json;
use serde_json::{json, Value};

/// Liveness check; touches no dependencies.
pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

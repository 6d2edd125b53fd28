use axum::Json;
use serde_json::json;

/// `GET /`: enumerates the external listener's paths (§6).
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "paths": [
            "/",
            "/authorize",
            "/upload",
            "/healthz",
            "/healthz/ready",
            "/metrics/v1/receive",
        ]
    }))
}

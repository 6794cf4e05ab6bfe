use axum::Json;
use serde_json::{json, Value};

/// GET /health
/// Returns a simple status object with service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "prosim-api"
    }))
}

/// GET /
/// Describes the top-level API entry points.
pub async fn api_root_handler() -> Json<Value> {
    Json(json!({
        "message": "PROSIMULATOR Backend API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "endpoints": {
            "projects": "/api/projects/",
            "auth": "/api/auth/",
            "stats": "/api/stats/"
        }
    }))
}

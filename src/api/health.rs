//! Liveness endpoints

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::api::middleware::AppState;

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Adria Style Studio API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /api/health
///
/// Always answers 200; the storage ping only changes the `database` field.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let database = match state.pool.ping().await {
        Ok(()) => "up",
        Err(e) => {
            tracing::warn!("Health check database ping failed: {:#}", e);
            "down"
        }
    };

    Json(json!({
        "status": "healthy",
        "database": database,
    }))
}

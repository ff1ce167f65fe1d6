//! HTTP handlers for the launchpad API

use axum::{extract::State, Json};

use crate::state::AppState;

pub mod auth;

pub async fn root() -> &'static str {
    "Launchpad API Server"
}

/// GET /health - liveness plus database status
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = match &state.db {
        Some(db) => {
            if db.is_healthy().await {
                "connected"
            } else {
                "error"
            }
        }
        None => "in-memory",
    };

    let status = if database == "error" {
        "unhealthy"
    } else {
        "healthy"
    };

    Json(serde_json::json!({
        "status": status,
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

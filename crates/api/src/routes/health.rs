//! Health check and service-info handlers.

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::app::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub db: String,
}

/// Health check with a database connectivity probe.
///
/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_ok = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();

    Json(HealthResponse {
        status: "ok".to_string(),
        db: if db_ok { "ok" } else { "error" }.to_string(),
    })
}

/// Service-info document at the root, mostly so a browser pointed at the
/// server shows something useful.
///
/// GET /
pub async fn service_info() -> Json<Value> {
    Json(json!({
        "service": "aria-api",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "scale": ["/scale/validate", "/scale/register", "/scale/upload"],
            "api": [
                "/api/health",
                "/api/scales",
                "/api/measurements",
                "/api/measurements/latest",
                "/api/users",
                "/api/raw-uploads",
            ],
        },
        "note": "the management API is unauthenticated; keep it on a trusted network",
    }))
}

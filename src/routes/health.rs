// src/routes/health.rs
//! Liveness and readiness endpoints.
//!
//! `/health` answers without touching anything else, so orchestrators can
//! tell the process is up. `/ready` additionally round-trips to PostgreSQL,
//! since every report and scheduling call depends on it.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use sqlx::PgPool;

use crate::Config;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: &'static str,
    database: &'static str,
}

/// Handle `GET /health`.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Handle `GET /ready`: 200 when the database answers, 503 otherwise.
async fn ready(State((pool, _)): State<(PgPool, Config)>) -> (StatusCode, Json<ReadyResponse>) {
    // ---
    match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ready",
                database: "connected",
            }),
        ),
        Err(e) => {
            tracing::warn!("readiness check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    status: "not_ready",
                    database: "unreachable",
                }),
            )
        }
    }
}

/// Create a subrouter containing `/health` and `/ready`.
pub fn router() -> Router<(PgPool, Config)> {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
}

use axum::{extract::State, routing::get, Json, Router};
use sqlx::PgPool;

use crate::error::AppResult;
use crate::stats::{fetch_stats, FormattedStats};
use crate::Config;

// ---

pub fn router() -> Router<(PgPool, Config)> {
    Router::new().route("/stats", get(handler))
}

async fn handler(State((pool, _)): State<(PgPool, Config)>) -> AppResult<Json<FormattedStats>> {
    let stats = fetch_stats(&pool).await?;
    Ok(Json(stats.into()))
}

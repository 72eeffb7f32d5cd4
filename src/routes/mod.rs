use axum::Router;
use sqlx::PgPool;

use crate::Config;

mod health;
mod reports;
mod scheduling;
mod stats;

// ---

pub fn router(pool: PgPool, config: Config) -> Router {
    // ---
    Router::new()
        .merge(reports::router())
        .merge(scheduling::router())
        .merge(stats::router())
        .merge(health::router())
        .with_state((pool, config))
}

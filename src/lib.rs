//! Electrical test reports and technician scheduling.
//!
//! Module map:
//! - `calc` – pure derivations (temperature correction, insulation ratios,
//!   turns ratio)
//! - `report` – the report form, its storage layouts, and the editing session
//! - `db` – PostgreSQL persistence for reports, jobs and assets
//! - `scheduling` – technician availability, time off and assignments
//! - `stats` – database stats for the dashboard
//! - `routes` – the axum HTTP surface
//!
//! Each module exposes a small gateway (`mod.rs` re-exports) so callers do
//! not reach into sibling internals.

pub mod calc;
pub mod config;
pub mod db;
pub mod error;
pub mod report;
pub mod routes;
pub mod scheduling;
pub mod schema;
pub mod stats;

pub use config::Config;
pub use error::{AppError, AppResult};

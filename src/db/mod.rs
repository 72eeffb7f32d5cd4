//! PostgreSQL access for reports, jobs and assets.

mod jobs;
mod reports;

pub use jobs::{asset_name, asset_uri, fetch_job_context, link_report_asset, JobContext};
pub use reports::{fetch_report, save_report, ReportRecord};

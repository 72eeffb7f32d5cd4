//! Read-only job/customer lookup and report asset linkage.

use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::report::{ReportForm, ReportKind};

// ---

/// Job and customer details used to prefill a new report.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct JobContext {
    // ---
    pub title: String,
    pub job_number: Option<String>,
    pub customer_name: Option<String>,
    pub company_name: Option<String>,
    pub address: Option<String>,
}

impl JobContext {
    /// Display name for the customer: the company if set, else the contact.
    pub fn customer(&self) -> String {
        [&self.company_name, &self.customer_name]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
            .cloned()
            .unwrap_or_default()
    }

    /// Copy job details into a form's job info section.
    pub fn prefill(&self, form: &mut ReportForm) {
        form.job_info.customer = self.customer();
        form.job_info.address = self.address.clone().unwrap_or_default();
        form.job_info.job_number = self.job_number.clone().unwrap_or_default();
    }
}

pub async fn fetch_job_context(pool: &PgPool, job_id: Uuid) -> AppResult<JobContext> {
    // ---
    sqlx::query_as::<_, JobContext>(
        r#"
        SELECT j.title,
               j.job_number,
               c.name AS customer_name,
               c.company_name,
               c.address
          FROM jobs j
          LEFT JOIN customers c ON c.id = j.customer_id
         WHERE j.id = $1
        "#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Job {}", job_id)))
}

// ---

/// Asset name shown in the job's document list.
pub fn asset_name(kind: ReportKind, form: &ReportForm) -> String {
    // ---
    let label = [&form.job_info.identifier, &form.job_info.job_number]
        .into_iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty());
    match label {
        Some(label) => format!("{} - {}", kind.display_name(), label),
        None => kind.display_name().to_string(),
    }
}

/// Internal URI that points the job's asset list at a report.
pub fn asset_uri(kind: ReportKind, job_id: Uuid, report_id: Uuid) -> String {
    format!("report:/jobs/{}/{}/{}", job_id, kind.slug(), report_id)
}

/// Create the asset for a newly saved report and attach it to its job.
pub async fn link_report_asset(
    pool: &PgPool,
    kind: ReportKind,
    job_id: Uuid,
    report_id: Uuid,
    user_id: Option<Uuid>,
    form: &ReportForm,
) -> AppResult<Uuid> {
    // ---
    let asset_id = Uuid::new_v4();
    let name = asset_name(kind, form);
    let uri = asset_uri(kind, job_id, report_id);

    let mut tx = pool.begin().await?;

    sqlx::query("INSERT INTO assets (id, name, file_url, user_id) VALUES ($1, $2, $3, $4)")
        .bind(asset_id)
        .bind(&name)
        .bind(&uri)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("INSERT INTO job_assets (job_id, asset_id, user_id) VALUES ($1, $2, $3)")
        .bind(job_id)
        .bind(asset_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(%asset_id, %uri, "linked report asset to job");
    Ok(asset_id)
}

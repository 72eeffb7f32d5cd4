//! Report endpoints: blank forms, load, create and save.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use crate::db::{self, ReportRecord};
use crate::error::{AppError, AppResult};
use crate::report::{FieldUpdate, ReportForm, ReportKind};
use crate::Config;

// ---

pub fn router() -> Router<(PgPool, Config)> {
    // ---
    Router::new()
        .route("/reports/{kind}", post(create_report))
        .route("/reports/{kind}/new", get(new_report))
        .route("/reports/{kind}/{id}", get(get_report).put(update_report))
        .route("/forms/apply", post(apply_updates))
}

#[derive(Debug, Deserialize)]
struct NewReportQuery {
    job_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct CreateReportRequest {
    job_id: Uuid,
    user_id: Option<Uuid>,
    form: ReportForm,
}

#[derive(Debug, Deserialize)]
struct UpdateReportRequest {
    user_id: Option<Uuid>,
    form: ReportForm,
}

#[derive(Debug, Serialize)]
struct SavedReport {
    id: Uuid,
    kind: ReportKind,
    job_id: Uuid,
    layout: String,
    form: ReportForm,
}

#[derive(Debug, Deserialize)]
struct ApplyRequest {
    form: ReportForm,
    updates: Vec<FieldUpdate>,
}

// ---

/// `GET /reports/{kind}/new`: initial form, prefilled from the job if given.
async fn new_report(
    Path(kind): Path<ReportKind>,
    Query(params): Query<NewReportQuery>,
    State((pool, config)): State<(PgPool, Config)>,
) -> AppResult<Json<ReportForm>> {
    // ---
    let mut form = ReportForm::initial(kind);
    form.insulation_resistance.minimum_ratio = config.min_insulation_ratio;

    if let Some(job_id) = params.job_id {
        let job = db::fetch_job_context(&pool, job_id).await?;
        job.prefill(&mut form);
    }

    form.recompute();
    Ok(Json(form))
}

/// `GET /reports/{kind}/{id}`: 404 tells the client to start a new report.
async fn get_report(
    Path((kind, id)): Path<(ReportKind, Uuid)>,
    State((pool, _)): State<(PgPool, Config)>,
) -> AppResult<Json<ReportRecord>> {
    // ---
    db::fetch_report(&pool, kind, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))
}

/// `POST /reports/{kind}`: first save of a new report.
async fn create_report(
    Path(kind): Path<ReportKind>,
    State((pool, _)): State<(PgPool, Config)>,
    Json(req): Json<CreateReportRequest>,
) -> AppResult<(StatusCode, Json<SavedReport>)> {
    // ---
    let id = Uuid::new_v4();
    let mut form = req.form;
    form.recompute();

    let layout = db::save_report(&pool, kind, id, req.job_id, req.user_id, &form).await?;
    info!(%kind, %id, job_id = %req.job_id, "created report");

    // The report itself is saved; a missing asset link is logged, not fatal.
    if let Err(e) = db::link_report_asset(&pool, kind, req.job_id, id, req.user_id, &form).await {
        error!(%kind, %id, "failed to link report asset: {}", e);
    }

    Ok((
        StatusCode::CREATED,
        Json(SavedReport {
            id,
            kind,
            job_id: req.job_id,
            layout: layout.to_string(),
            form,
        }),
    ))
}

/// `PUT /reports/{kind}/{id}`: overwrite an existing report.
async fn update_report(
    Path((kind, id)): Path<(ReportKind, Uuid)>,
    State((pool, _)): State<(PgPool, Config)>,
    Json(req): Json<UpdateReportRequest>,
) -> AppResult<Json<SavedReport>> {
    // ---
    let existing = db::fetch_report(&pool, kind, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Report {}", id)))?;

    let mut form = req.form;
    form.recompute();
    let user_id = req.user_id.or(existing.user_id);

    let layout = db::save_report(&pool, kind, id, existing.job_id, user_id, &form).await?;

    Ok(Json(SavedReport {
        id,
        kind,
        job_id: existing.job_id,
        layout: layout.to_string(),
        form,
    }))
}

/// `POST /forms/apply`: run edits through the reducer and return the
/// recomputed form.
async fn apply_updates(Json(req): Json<ApplyRequest>) -> AppResult<Json<ReportForm>> {
    // ---
    let mut form = req.form;
    for update in req.updates {
        form.apply(update)?;
    }
    form.recompute();
    Ok(Json(form))
}

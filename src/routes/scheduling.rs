//! Scheduling endpoints. Destructive calls require `?confirm=true`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::scheduling::{
    convert_to_calendar_events, CalendarEvent, NewTimeOffRequest, PortalType, SchedulingService,
    Technician, TechnicianAssignment, TechnicianAvailability, TechnicianException, TimeOffFilter,
    TimeOffRequest, TimeOffStatus,
};
use crate::Config;

type AppState = (PgPool, Config);

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/scheduling/technicians", get(list_technicians))
        .route("/scheduling/technicians/{user_id}/availability", get(list_availability))
        .route("/scheduling/technicians/{user_id}/exceptions", get(list_exceptions))
        .route("/scheduling/availability", post(save_availability))
        .route("/scheduling/availability/{id}", delete(delete_availability))
        .route("/scheduling/exceptions", post(save_exception))
        .route("/scheduling/exceptions/{id}", delete(delete_exception))
        .route("/scheduling/time-off", get(list_time_off).post(create_time_off))
        .route("/scheduling/time-off/{id}/status", put(update_time_off_status))
        .route("/scheduling/time-off/{id}/cancel", post(cancel_time_off))
        .route("/scheduling/assignments", get(list_assignments))
        .route("/scheduling/calendar", get(calendar))
}

fn service(pool: &PgPool) -> SchedulingService {
    SchedulingService::new(pool.clone())
}

#[derive(Debug, Default, Deserialize)]
struct Confirm {
    #[serde(default)]
    confirm: bool,
}

fn require_confirmation(c: &Confirm, action: &str) -> AppResult<()> {
    if c.confirm {
        Ok(())
    } else {
        Err(AppError::ConfirmationRequired(format!(
            "{} must be confirmed with ?confirm=true",
            action
        )))
    }
}

#[derive(Debug, Deserialize)]
struct TechniciansQuery {
    portal: PortalType,
    division: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PortalQuery {
    portal: PortalType,
}

#[derive(Debug, Deserialize)]
struct RangeQuery {
    portal: PortalType,
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct AssignmentsQuery {
    user_id: Option<Uuid>,
    portal: PortalType,
    start: NaiveDate,
    end: NaiveDate,
    division: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: TimeOffStatus,
    approver_id: Uuid,
}

// ---

async fn list_technicians(
    Query(q): Query<TechniciansQuery>,
    State((pool, _)): State<AppState>,
) -> AppResult<Json<Vec<Technician>>> {
    let rows = service(&pool)
        .get_available_technicians(q.portal, q.division.as_deref())
        .await?;
    Ok(Json(rows))
}

async fn list_availability(
    Path(user_id): Path<Uuid>,
    Query(q): Query<PortalQuery>,
    State((pool, _)): State<AppState>,
) -> AppResult<Json<Vec<TechnicianAvailability>>> {
    let rows = service(&pool).get_technician_availability(user_id, q.portal).await?;
    Ok(Json(rows))
}

async fn list_exceptions(
    Path(user_id): Path<Uuid>,
    Query(q): Query<RangeQuery>,
    State((pool, _)): State<AppState>,
) -> AppResult<Json<Vec<TechnicianException>>> {
    let rows = service(&pool)
        .get_technician_exceptions(user_id, q.portal, q.start, q.end)
        .await?;
    Ok(Json(rows))
}

async fn save_availability(
    State((pool, _)): State<AppState>,
    Json(record): Json<TechnicianAvailability>,
) -> AppResult<Json<TechnicianAvailability>> {
    Ok(Json(service(&pool).save_technician_availability(record).await?))
}

async fn delete_availability(
    Path(id): Path<Uuid>,
    Query(c): Query<Confirm>,
    State((pool, _)): State<AppState>,
) -> AppResult<StatusCode> {
    // ---
    require_confirmation(&c, "deleting availability")?;
    service(&pool).delete_technician_availability(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn save_exception(
    State((pool, _)): State<AppState>,
    Json(record): Json<TechnicianException>,
) -> AppResult<Json<TechnicianException>> {
    Ok(Json(service(&pool).save_technician_exception(record).await?))
}

async fn delete_exception(
    Path(id): Path<Uuid>,
    Query(c): Query<Confirm>,
    State((pool, _)): State<AppState>,
) -> AppResult<StatusCode> {
    // ---
    require_confirmation(&c, "deleting an exception")?;
    service(&pool).delete_technician_exception(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_time_off(
    Query(filter): Query<TimeOffFilter>,
    State((pool, _)): State<AppState>,
) -> AppResult<Json<Vec<TimeOffRequest>>> {
    Ok(Json(service(&pool).get_time_off_requests(&filter).await?))
}

async fn create_time_off(
    State((pool, _)): State<AppState>,
    Json(request): Json<NewTimeOffRequest>,
) -> AppResult<(StatusCode, Json<TimeOffRequest>)> {
    let created = service(&pool).create_time_off_request(request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_time_off_status(
    Path(id): Path<Uuid>,
    State((pool, _)): State<AppState>,
    Json(update): Json<StatusUpdate>,
) -> AppResult<Json<TimeOffRequest>> {
    let updated = service(&pool)
        .update_time_off_request_status(id, update.status, update.approver_id)
        .await?;
    Ok(Json(updated))
}

async fn cancel_time_off(
    Path(id): Path<Uuid>,
    Query(c): Query<Confirm>,
    State((pool, _)): State<AppState>,
) -> AppResult<Json<TimeOffRequest>> {
    // ---
    require_confirmation(&c, "cancelling a time-off request")?;
    Ok(Json(service(&pool).cancel_time_off_request(id).await?))
}

async fn list_assignments(
    Query(q): Query<AssignmentsQuery>,
    State((pool, _)): State<AppState>,
) -> AppResult<Json<Vec<TechnicianAssignment>>> {
    let rows = service(&pool)
        .get_technician_assignments(q.user_id, q.portal, q.start, q.end, q.division.as_deref())
        .await?;
    Ok(Json(rows))
}

/// Calendar view. Exceptions are included only when a technician is
/// selected, since they are stored per technician.
async fn calendar(
    Query(q): Query<AssignmentsQuery>,
    State((pool, _)): State<AppState>,
) -> AppResult<Json<Vec<CalendarEvent>>> {
    // ---
    let svc = service(&pool);
    let assignments = svc
        .get_technician_assignments(q.user_id, q.portal, q.start, q.end, q.division.as_deref())
        .await?;
    let exceptions = match q.user_id {
        Some(user_id) => svc.get_technician_exceptions(user_id, q.portal, q.start, q.end).await?,
        None => Vec::new(),
    };
    Ok(Json(convert_to_calendar_events(&assignments, &exceptions)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_gate() {
        assert!(require_confirmation(&Confirm { confirm: true }, "x").is_ok());
        assert!(matches!(
            require_confirmation(&Confirm::default(), "deleting availability"),
            Err(AppError::ConfirmationRequired(_))
        ));
    }
}

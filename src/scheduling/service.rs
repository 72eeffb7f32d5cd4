//! Scheduling service façade over PostgreSQL.

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use super::models::{
    NewTimeOffRequest, PortalType, Technician, TechnicianAssignment, TechnicianAvailability,
    TechnicianException, TimeOffFilter, TimeOffRequest, TimeOffStatus,
};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct SchedulingService {
    pool: PgPool,
}

impl SchedulingService {
    // ---
    pub fn new(pool: PgPool) -> Self {
        SchedulingService { pool }
    }

    /// Active technicians for a portal, optionally limited to a division.
    pub async fn get_available_technicians(
        &self,
        portal: PortalType,
        division: Option<&str>,
    ) -> AppResult<Vec<Technician>> {
        // ---
        let rows = sqlx::query_as::<_, Technician>(
            r#"
            SELECT user_id, full_name, email, portal_type, division
              FROM technicians
             WHERE active
               AND portal_type = $1
               AND ($2::TEXT IS NULL OR division = $2)
             ORDER BY full_name
            "#,
        )
        .bind(portal.as_str())
        .bind(division)
        .fetch_all(&self.pool)
        .await?;

        debug!(portal = portal.as_str(), ?division, count = rows.len(), "fetched technicians");
        Ok(rows)
    }

    pub async fn get_technician_availability(
        &self,
        user_id: Uuid,
        portal: PortalType,
    ) -> AppResult<Vec<TechnicianAvailability>> {
        // ---
        let rows = sqlx::query_as::<_, TechnicianAvailability>(
            r#"
            SELECT id, user_id, portal_type, day_of_week, start_time, end_time,
                   recurring, effective_from, effective_to
              FROM technician_availability
             WHERE user_id = $1 AND portal_type = $2
             ORDER BY day_of_week, start_time
            "#,
        )
        .bind(user_id)
        .bind(portal.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Exceptions dated within `[start, end]`.
    pub async fn get_technician_exceptions(
        &self,
        user_id: Uuid,
        portal: PortalType,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<TechnicianException>> {
        // ---
        check_range(start, end)?;
        let rows = sqlx::query_as::<_, TechnicianException>(
            r#"
            SELECT id, user_id, portal_type, exception_date, start_time, end_time,
                   is_available, reason
              FROM technician_exceptions
             WHERE user_id = $1 AND portal_type = $2
               AND exception_date BETWEEN $3 AND $4
             ORDER BY exception_date, start_time NULLS FIRST
            "#,
        )
        .bind(user_id)
        .bind(portal.as_str())
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Insert or replace a weekly availability window.
    pub async fn save_technician_availability(
        &self,
        record: TechnicianAvailability,
    ) -> AppResult<TechnicianAvailability> {
        // ---
        record.validate()?;
        sqlx::query(
            r#"
            INSERT INTO technician_availability
                (id, user_id, portal_type, day_of_week, start_time, end_time,
                 recurring, effective_from, effective_to)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                day_of_week    = EXCLUDED.day_of_week,
                start_time     = EXCLUDED.start_time,
                end_time       = EXCLUDED.end_time,
                recurring      = EXCLUDED.recurring,
                effective_from = EXCLUDED.effective_from,
                effective_to   = EXCLUDED.effective_to
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.portal_type.as_str())
        .bind(record.day_of_week)
        .bind(record.start_time)
        .bind(record.end_time)
        .bind(record.recurring)
        .bind(record.effective_from)
        .bind(record.effective_to)
        .execute(&self.pool)
        .await?;

        info!(id = %record.id, user_id = %record.user_id, "saved technician availability");
        Ok(record)
    }

    /// Insert or replace a date exception.
    pub async fn save_technician_exception(
        &self,
        record: TechnicianException,
    ) -> AppResult<TechnicianException> {
        // ---
        record.validate()?;
        sqlx::query(
            r#"
            INSERT INTO technician_exceptions
                (id, user_id, portal_type, exception_date, start_time, end_time,
                 is_available, reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                exception_date = EXCLUDED.exception_date,
                start_time     = EXCLUDED.start_time,
                end_time       = EXCLUDED.end_time,
                is_available   = EXCLUDED.is_available,
                reason         = EXCLUDED.reason
            "#,
        )
        .bind(record.id)
        .bind(record.user_id)
        .bind(record.portal_type.as_str())
        .bind(record.exception_date)
        .bind(record.start_time)
        .bind(record.end_time)
        .bind(record.is_available)
        .bind(&record.reason)
        .execute(&self.pool)
        .await?;

        info!(id = %record.id, user_id = %record.user_id, "saved technician exception");
        Ok(record)
    }

    pub async fn delete_technician_availability(&self, id: Uuid) -> AppResult<()> {
        self.delete_by_id("technician_availability", "Availability", id).await
    }

    pub async fn delete_technician_exception(&self, id: Uuid) -> AppResult<()> {
        self.delete_by_id("technician_exceptions", "Exception", id).await
    }

    async fn delete_by_id(&self, table: &'static str, label: &str, id: Uuid) -> AppResult<()> {
        // ---
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} {}", label, id)));
        }
        info!(%id, table, "deleted scheduling record");
        Ok(())
    }

    // ---

    pub async fn get_time_off_requests(&self, filter: &TimeOffFilter) -> AppResult<Vec<TimeOffRequest>> {
        // ---
        let mut qb = time_off_query(filter);
        let rows = qb
            .build_query_as::<TimeOffRequest>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create_time_off_request(&self, request: NewTimeOffRequest) -> AppResult<TimeOffRequest> {
        // ---
        request.validate()?;
        let row = sqlx::query_as::<_, TimeOffRequest>(
            r#"
            INSERT INTO time_off_requests
                (id, user_id, portal_type, start_date, end_date, reason, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, portal_type, start_date, end_date, reason,
                      status, approver_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(request.portal_type.as_str())
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.reason)
        .bind(TimeOffStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;

        info!(id = %row.id, user_id = %row.user_id, "created time-off request");
        Ok(row)
    }

    /// Approve or reject a request. Only pending requests can be decided.
    pub async fn update_time_off_request_status(
        &self,
        id: Uuid,
        status: TimeOffStatus,
        approver_id: Uuid,
    ) -> AppResult<TimeOffRequest> {
        // ---
        if !matches!(status, TimeOffStatus::Approved | TimeOffStatus::Rejected) {
            return Err(AppError::InvalidInput(format!(
                "status must be approved or rejected, got {}",
                status.as_str()
            )));
        }
        self.transition(id, status, Some(approver_id)).await
    }

    pub async fn cancel_time_off_request(&self, id: Uuid) -> AppResult<TimeOffRequest> {
        self.transition(id, TimeOffStatus::Cancelled, None).await
    }

    async fn transition(
        &self,
        id: Uuid,
        next: TimeOffStatus,
        approver_id: Option<Uuid>,
    ) -> AppResult<TimeOffRequest> {
        // ---
        let current = self.get_time_off_request(id).await?;
        current.status.transition_to(next)?;

        // Guard on the status we validated against so a concurrent decision
        // is reported rather than overwritten.
        let updated = sqlx::query_as::<_, TimeOffRequest>(
            r#"
            UPDATE time_off_requests
               SET status = $3,
                   approver_id = COALESCE($4, approver_id),
                   updated_at = now()
             WHERE id = $1 AND status = $2
            RETURNING id, user_id, portal_type, start_date, end_date, reason,
                      status, approver_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(current.status.as_str())
        .bind(next.as_str())
        .bind(approver_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("time-off request {} changed concurrently", id)))?;

        info!(%id, from = current.status.as_str(), to = next.as_str(), "time-off request updated");
        Ok(updated)
    }

    async fn get_time_off_request(&self, id: Uuid) -> AppResult<TimeOffRequest> {
        sqlx::query_as::<_, TimeOffRequest>(
            r#"
            SELECT id, user_id, portal_type, start_date, end_date, reason,
                   status, approver_id, created_at, updated_at
              FROM time_off_requests
             WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Time-off request {}", id)))
    }

    // ---

    /// Assignments in `[start, end]`, with the job title joined in.
    pub async fn get_technician_assignments(
        &self,
        user_id: Option<Uuid>,
        portal: PortalType,
        start: NaiveDate,
        end: NaiveDate,
        division: Option<&str>,
    ) -> AppResult<Vec<TechnicianAssignment>> {
        // ---
        check_range(start, end)?;
        let mut qb = assignments_query(user_id, portal, start, end, division);
        let rows = qb
            .build_query_as::<TechnicianAssignment>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

fn check_range(start: NaiveDate, end: NaiveDate) -> AppResult<()> {
    if start > end {
        return Err(AppError::InvalidInput("start must not be after end".into()));
    }
    Ok(())
}

fn time_off_query(filter: &TimeOffFilter) -> QueryBuilder<'static, Postgres> {
    // ---
    let mut qb = QueryBuilder::new(
        "SELECT id, user_id, portal_type, start_date, end_date, reason, \
         status, approver_id, created_at, updated_at FROM time_off_requests WHERE TRUE",
    );
    if let Some(user_id) = filter.user_id {
        qb.push(" AND user_id = ").push_bind(user_id);
    }
    if let Some(portal) = filter.portal_type {
        qb.push(" AND portal_type = ").push_bind(portal.as_str());
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(start) = filter.start {
        qb.push(" AND end_date >= ").push_bind(start);
    }
    if let Some(end) = filter.end {
        qb.push(" AND start_date <= ").push_bind(end);
    }
    qb.push(" ORDER BY start_date, created_at");
    qb
}

fn assignments_query<'a>(
    user_id: Option<Uuid>,
    portal: PortalType,
    start: NaiveDate,
    end: NaiveDate,
    division: Option<&'a str>,
) -> QueryBuilder<'a, Postgres> {
    // ---
    let mut qb = QueryBuilder::new(
        "SELECT a.id, a.user_id, a.job_id, j.title AS job_title, a.portal_type, a.division, \
         a.assignment_date, a.start_time, a.end_time, a.status, a.notes \
         FROM technician_assignments a LEFT JOIN jobs j ON j.id = a.job_id \
         WHERE a.portal_type = ",
    );
    qb.push_bind(portal.as_str());
    qb.push(" AND a.assignment_date BETWEEN ").push_bind(start);
    qb.push(" AND ").push_bind(end);
    if let Some(user_id) = user_id {
        qb.push(" AND a.user_id = ").push_bind(user_id);
    }
    if let Some(division) = division {
        qb.push(" AND a.division = ").push_bind(division);
    }
    qb.push(" ORDER BY a.assignment_date, a.start_time NULLS FIRST");
    qb
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_time_off_query_without_filters() {
        let qb = time_off_query(&TimeOffFilter::default());
        assert_eq!(
            qb.sql(),
            "SELECT id, user_id, portal_type, start_date, end_date, reason, \
             status, approver_id, created_at, updated_at FROM time_off_requests WHERE TRUE \
             ORDER BY start_date, created_at"
        );
    }

    #[test]
    fn test_time_off_query_with_filters() {
        // ---
        let filter = TimeOffFilter {
            user_id: Some(Uuid::nil()),
            status: Some(TimeOffStatus::Pending),
            start: NaiveDate::from_ymd_opt(2026, 12, 1),
            ..Default::default()
        };
        let qb = time_off_query(&filter);
        let sql = qb.sql();
        assert!(sql.contains("AND user_id = $1"));
        assert!(sql.contains("AND status = $2"));
        assert!(sql.contains("AND end_date >= $3"));
        assert!(!sql.contains("portal_type ="));
    }

    #[test]
    fn test_assignments_query_binds_in_order() {
        // ---
        let start = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 11, 30).unwrap();
        let qb = assignments_query(None, PortalType::Neta, start, end, Some("north"));
        let sql = qb.sql();
        assert!(sql.contains("WHERE a.portal_type = $1"));
        assert!(sql.contains("BETWEEN $2 AND $3"));
        assert!(sql.contains("AND a.division = $4"));
        assert!(!sql.contains("a.user_id = $"));
    }

    #[test]
    fn test_check_range() {
        let a = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let b = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(check_range(b, a).is_ok());
        assert!(check_range(a, a).is_ok());
        assert!(matches!(check_range(a, b), Err(AppError::InvalidInput(_))));
    }
}

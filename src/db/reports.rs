//! Report row persistence.
//!
//! Rows are read in whatever layout they were written in and normalized on
//! the way out. Saves try the newest layout first and step back through
//! older ones only when PostgreSQL rejects a column as undefined, which is
//! how an older deployment's schema shows up.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::report::shape::{
    SplitColumns, COL_COMMENTS, COL_CONTACT_RESISTANCE, COL_DATA, COL_INSULATION_RESISTANCE,
    COL_REPORT_DATA, COL_REPORT_INFO, COL_TEST_EQUIPMENT, COL_VISUAL_INSPECTION,
};
use crate::report::{
    normalize_loaded, serialize_for_save, ReportForm, ReportKind, SaveShape, StoredRow,
    StoredShape,
};

/// SQLSTATE for `undefined_column`.
const UNDEFINED_COLUMN: &str = "42703";

// ---

/// A loaded report with its ownership metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRecord {
    // ---
    pub id: Uuid,
    pub kind: ReportKind,
    pub job_id: Uuid,
    pub user_id: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
    pub form: ReportForm,
}

/// Fetch and normalize one report. `Ok(None)` when no such row exists.
pub async fn fetch_report(pool: &PgPool, kind: ReportKind, id: Uuid) -> AppResult<Option<ReportRecord>> {
    // ---
    let sql = format!("SELECT * FROM {} WHERE id = $1", kind.table());
    let Some(row) = sqlx::query(&sql).bind(id).fetch_optional(pool).await? else {
        debug!(%kind, %id, "report not found");
        return Ok(None);
    };

    let job_id: Uuid = row.try_get("job_id")?;
    let user_id: Option<Uuid> = row.try_get("user_id").ok().flatten();
    let updated_at: Option<DateTime<Utc>> = row.try_get("updated_at").ok();

    let form = match StoredShape::detect(stored_row(&row)) {
        Some(shape) => normalize_loaded(kind, shape),
        None => {
            warn!(%kind, %id, "report row carries no data columns, using initial form");
            ReportForm::initial(kind)
        }
    };

    Ok(Some(ReportRecord {
        id,
        kind,
        job_id,
        user_id,
        updated_at,
        form,
    }))
}

/// Insert or overwrite a report row. Last write wins.
///
/// Returns the layout that was accepted by the database.
pub async fn save_report(
    pool: &PgPool,
    kind: ReportKind,
    id: Uuid,
    job_id: Uuid,
    user_id: Option<Uuid>,
    form: &ReportForm,
) -> AppResult<SaveShape> {
    // ---
    let mut last_error = None;

    for shape in SaveShape::FALLBACK_ORDER {
        match upsert(pool, kind, id, job_id, user_id, form, shape).await {
            Ok(()) => {
                info!(%kind, %id, %shape, "report saved");
                return Ok(shape);
            }
            Err(e) if is_undefined_column(&e) => {
                warn!(%kind, %id, %shape, error = %e, "schema rejected layout, trying older one");
                last_error = Some(e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Database(format!(
        "no known layout accepted by {}: {}",
        kind.table(),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    )))
}

async fn upsert(
    pool: &PgPool,
    kind: ReportKind,
    id: Uuid,
    job_id: Uuid,
    user_id: Option<Uuid>,
    form: &ReportForm,
    shape: SaveShape,
) -> Result<(), sqlx::Error> {
    // ---
    let payload = serialize_for_save(form, shape);
    let sql = upsert_sql(kind.table(), shape.columns());

    let mut query = sqlx::query(&sql).bind(id).bind(job_id).bind(user_id);
    for (_, value) in payload {
        query = query.bind(value);
    }
    query.execute(pool).await?;
    Ok(())
}

fn upsert_sql(table: &str, columns: &[&str]) -> String {
    // ---
    let names = columns.join(", ");
    let placeholders = (0..columns.len())
        .map(|i| format!("${}", i + 4))
        .collect::<Vec<_>>()
        .join(", ");
    let updates = columns
        .iter()
        .map(|c| format!("{c} = EXCLUDED.{c}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO {table} (id, job_id, user_id, {names}) \
         VALUES ($1, $2, $3, {placeholders}) \
         ON CONFLICT (id) DO UPDATE SET {updates}, user_id = EXCLUDED.user_id, updated_at = now()"
    )
}

fn is_undefined_column(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => is_undefined_column_code(db.code().as_deref()),
        _ => false,
    }
}

fn is_undefined_column_code(code: Option<&str>) -> bool {
    code == Some(UNDEFINED_COLUMN)
}

/// Pull the shape columns out of a row. Columns the table does not have
/// read as `None`.
fn stored_row(row: &PgRow) -> StoredRow {
    // ---
    StoredRow {
        data: json_column(row, COL_DATA),
        report_data: json_column(row, COL_REPORT_DATA),
        split: SplitColumns {
            report_info: json_column(row, COL_REPORT_INFO),
            visual_inspection: json_column(row, COL_VISUAL_INSPECTION),
            insulation_resistance: json_column(row, COL_INSULATION_RESISTANCE),
            contact_resistance: json_column(row, COL_CONTACT_RESISTANCE),
            test_equipment: json_column(row, COL_TEST_EQUIPMENT),
            comments: json_column(row, COL_COMMENTS),
        },
    }
}

/// Read a JSON column, accepting plain `TEXT` columns from the oldest
/// tables as JSON strings.
fn json_column(row: &PgRow, name: &str) -> Option<Value> {
    if let Ok(value) = row.try_get::<Option<Value>, _>(name) {
        return value;
    }
    row.try_get::<Option<String>, _>(name)
        .ok()
        .flatten()
        .map(Value::String)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_upsert_sql_for_blob() {
        let sql = upsert_sql("dry_type_transformer_reports", SaveShape::Blob.columns());
        assert_eq!(
            sql,
            "INSERT INTO dry_type_transformer_reports (id, job_id, user_id, data) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data, user_id = EXCLUDED.user_id, updated_at = now()"
        );
    }

    #[test]
    fn test_upsert_sql_for_split_columns() {
        // ---
        let sql = upsert_sql("t", SaveShape::SplitColumns.columns());
        assert!(sql.contains("(id, job_id, user_id, report_info, visual_inspection, insulation_resistance, contact_resistance, test_equipment, comments)"));
        assert!(sql.contains("VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"));
        assert!(sql.contains("comments = EXCLUDED.comments"));
    }

    #[test]
    fn test_undefined_column_detection() {
        assert!(is_undefined_column_code(Some("42703")));
        assert!(!is_undefined_column_code(Some("23505")));
        assert!(!is_undefined_column_code(None));
        assert!(!is_undefined_column(&sqlx::Error::RowNotFound));
    }
}

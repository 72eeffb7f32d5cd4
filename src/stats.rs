//! Database stats for the dashboard widget.

use serde::Serialize;
use sqlx::PgPool;

use crate::error::AppResult;

/// Raw numbers returned by the `get_database_stats()` function.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct DatabaseStats {
    pub total_size_bytes: i64,
    pub total_rows_estimate: i64,
    pub table_count: i64,
    pub function_count: i64,
}

/// Stats with display strings alongside.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormattedStats {
    #[serde(flatten)]
    pub raw: DatabaseStats,
    pub total_size: String,
    pub total_rows: String,
    pub tables: String,
    pub functions: String,
}

pub async fn fetch_stats(pool: &PgPool) -> AppResult<DatabaseStats> {
    let stats = sqlx::query_as::<_, DatabaseStats>("SELECT * FROM get_database_stats()")
        .fetch_one(pool)
        .await?;
    tracing::debug!(?stats, "fetched database stats");
    Ok(stats)
}

impl From<DatabaseStats> for FormattedStats {
    fn from(raw: DatabaseStats) -> Self {
        FormattedStats {
            total_size: format_bytes(raw.total_size_bytes),
            total_rows: format_count(raw.total_rows_estimate),
            tables: format_count(raw.table_count),
            functions: format_count(raw.function_count),
            raw,
        }
    }
}

/// Human-readable byte size using binary units, e.g. `"1.50 MB"`.
pub fn format_bytes(bytes: i64) -> String {
    // ---
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes <= 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}

/// Integer with thousands separators, e.g. `"1,234,567"`.
pub fn format_count(n: i64) -> String {
    // ---
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(-5), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(10 * 1024 * 1024), "10.00 MB");
        assert_eq!(format_bytes(3 * 1024_i64.pow(4)), "3.00 TB");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_count(-45210), "-45,210");
    }

    #[test]
    fn test_formatted_stats() {
        // ---
        let formatted = FormattedStats::from(DatabaseStats {
            total_size_bytes: 8 * 1024 * 1024,
            total_rows_estimate: 12045,
            table_count: 14,
            function_count: 3,
        });
        assert_eq!(formatted.total_size, "8.00 MB");
        assert_eq!(formatted.total_rows, "12,045");

        let json = serde_json::to_value(&formatted).unwrap();
        assert_eq!(json["total_size_bytes"], 8 * 1024 * 1024);
        assert_eq!(json["tables"], "14");
    }
}

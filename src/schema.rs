//! Database schema management for `fieldops-reports`.
//!
//! Ensures required tables, indexes and the stats function exist before
//! serving requests. Applied once on startup from `main.rs`.

use anyhow::Result;
use sqlx::PgPool;

use crate::report::ReportKind;

// ---

/// Create or update the database schema (idempotent).
///
/// Report tables are created with every storage-shape column so rows written
/// by older releases can still be read. Safe to call on every startup.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS customers (
            id           UUID PRIMARY KEY,
            name         TEXT NOT NULL DEFAULT '',
            company_name TEXT,
            address      TEXT
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id          UUID PRIMARY KEY,
            title       TEXT NOT NULL DEFAULT '',
            job_number  TEXT,
            customer_id UUID REFERENCES customers (id),
            division    TEXT
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS assets (
            id         UUID PRIMARY KEY,
            name       TEXT        NOT NULL,
            file_url   TEXT        NOT NULL,
            user_id    UUID,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS job_assets (
            job_id   UUID NOT NULL REFERENCES jobs (id),
            asset_id UUID NOT NULL REFERENCES assets (id),
            user_id  UUID,
            PRIMARY KEY (job_id, asset_id)
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // One table per report kind, all sharing the same column set
    for kind in ReportKind::ALL {
        let table = kind.table();
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                id                    UUID PRIMARY KEY,
                job_id                UUID        NOT NULL REFERENCES jobs (id),
                user_id               UUID,
                data                  JSONB,
                report_data           JSONB,
                report_info           JSONB,
                visual_inspection     JSONB,
                insulation_resistance JSONB,
                contact_resistance    JSONB,
                test_equipment        JSONB,
                comments              JSONB,
                created_at            TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at            TIMESTAMPTZ NOT NULL DEFAULT now()
            );
            "#
        ))
        .execute(&mut *tx)
        .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_job_id ON {table} (job_id);"
        ))
        .execute(&mut *tx)
        .await?;
    }

    create_scheduling_tables(&mut tx).await?;

    // Stats RPC used by the dashboard widget
    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION get_database_stats()
        RETURNS TABLE (
            total_size_bytes    BIGINT,
            total_rows_estimate BIGINT,
            table_count         BIGINT,
            function_count      BIGINT
        )
        LANGUAGE sql STABLE AS $$
            SELECT
                pg_database_size(current_database())::BIGINT,
                (SELECT COALESCE(SUM(GREATEST(c.reltuples, 0)), 0)::BIGINT
                   FROM pg_class c
                   JOIN pg_namespace n ON n.oid = c.relnamespace
                  WHERE c.relkind = 'r' AND n.nspname = 'public'),
                (SELECT COUNT(*) FROM information_schema.tables
                  WHERE table_schema = 'public' AND table_type = 'BASE TABLE')::BIGINT,
                (SELECT COUNT(*) FROM pg_proc p
                   JOIN pg_namespace n ON n.oid = p.pronamespace
                  WHERE n.nspname = 'public')::BIGINT
        $$;
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

async fn create_scheduling_tables(tx: &mut sqlx::Transaction<'_, sqlx::Postgres>) -> Result<()> {
    // ---
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS technicians (
            user_id     UUID PRIMARY KEY,
            full_name   TEXT    NOT NULL,
            email       TEXT,
            portal_type TEXT    NOT NULL,
            division    TEXT,
            active      BOOLEAN NOT NULL DEFAULT TRUE
        );
        "#,
    )
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS technician_availability (
            id             UUID PRIMARY KEY,
            user_id        UUID     NOT NULL,
            portal_type    TEXT     NOT NULL,
            day_of_week    SMALLINT NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
            start_time     TIME     NOT NULL,
            end_time       TIME     NOT NULL,
            recurring      BOOLEAN  NOT NULL DEFAULT TRUE,
            effective_from DATE,
            effective_to   DATE
        );
        "#,
    )
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS technician_exceptions (
            id             UUID PRIMARY KEY,
            user_id        UUID    NOT NULL,
            portal_type    TEXT    NOT NULL,
            exception_date DATE    NOT NULL,
            start_time     TIME,
            end_time       TIME,
            is_available   BOOLEAN NOT NULL DEFAULT FALSE,
            reason         TEXT
        );
        "#,
    )
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS time_off_requests (
            id          UUID PRIMARY KEY,
            user_id     UUID        NOT NULL,
            portal_type TEXT        NOT NULL,
            start_date  DATE        NOT NULL,
            end_date    DATE        NOT NULL,
            reason      TEXT,
            status      TEXT        NOT NULL DEFAULT 'pending',
            approver_id UUID,
            created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
        );
        "#,
    )
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS technician_assignments (
            id              UUID PRIMARY KEY,
            user_id         UUID NOT NULL,
            job_id          UUID REFERENCES jobs (id),
            portal_type     TEXT NOT NULL,
            division        TEXT,
            assignment_date DATE NOT NULL,
            start_time      TIME,
            end_time        TIME,
            status          TEXT NOT NULL DEFAULT 'scheduled',
            notes           TEXT
        );
        "#,
    )
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_technician_exceptions_user_date
            ON technician_exceptions (user_id, exception_date);
        "#,
    )
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_technician_assignments_date
            ON technician_assignments (assignment_date);
        "#,
    )
    .execute(&mut **tx)
    .await?;

    Ok(())
}

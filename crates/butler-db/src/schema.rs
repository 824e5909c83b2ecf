//! Idempotent bootstrap schema

use sqlx::PgPool;
use tracing::info;

const INITIAL_SCHEMA: &str = include_str!("../migrations/0001_initial.sql");

/// Create every table and index that does not exist yet
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(INITIAL_SCHEMA).execute(pool).await?;
    info!("Database schema is up to date");
    Ok(())
}

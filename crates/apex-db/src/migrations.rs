//! # Schema Migrations
//!
//! SQL files under `migrations/sqlite/` at the workspace root, compiled into
//! the binary and applied in filename order.
//!
//! ```text
//! 001_initial_schema.sql   documents, document_items (cascade on delete)
//! 002_counters.sql         document_sequences (type, day)
//!                          lineage_versions   (root, type)
//! ```
//!
//! Applied files are checksummed by sqlx: edit the schema with a new
//! `NNN_*.sql` file, never by changing an applied one.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies every migration not yet recorded in `_sqlx_migrations`.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(known = MIGRATOR.migrations.len(), "Applying pending migrations");
    MIGRATOR.run(pool).await?;
    info!("Document schema up to date");
    Ok(())
}

/// `(known, applied)` migration counts.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((
        MIGRATOR.migrations.len(),
        usize::try_from(applied).unwrap_or_default(),
    ))
}

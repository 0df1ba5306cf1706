//! Situation store database schema.
//!
//! The SQL lives in the workspace `migrations/` directory and is embedded
//! at compile time.

use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};

/// Embedded migrations for the `situations` and `photos` tables.
pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// Applies any pending migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history diverges.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

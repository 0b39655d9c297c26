//! Schema management and startup migrations.
//!
//! Migrations are compiled into the binary and applied at startup through
//! [`run_startup_migrations`]. Applied versions are tracked in the
//! `cartage_migrations` state table; DDL is built with `sea-query` through
//! [`SchemaManager`].

pub mod migrations;

use std::fmt;
use std::time::Instant;

use chrono::Utc;
use sea_query::{PostgresQueryBuilder, TableCreateStatement};

use crate::db::{DbError, DbExecutor};

/// Migration error type
#[derive(Debug)]
pub enum MigrationError {
    /// Underlying database failure
    Database(DbError),
    /// Registry ordering or duplicate-version problem
    InvalidRegistry(String),
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationError::Database(e) => write!(f, "Migration database error: {e}"),
            MigrationError::InvalidRegistry(s) => write!(f, "Invalid migration registry: {s}"),
        }
    }
}

impl std::error::Error for MigrationError {}

impl From<DbError> for MigrationError {
    fn from(err: DbError) -> Self {
        MigrationError::Database(err)
    }
}

/// Trait that all migrations implement.
///
/// Note: the runtime is coroutine-based (`may`), so `up` is synchronous; the
/// executor handles scheduling internally.
pub trait Migration: Send + Sync {
    /// Human-readable identifier
    fn name(&self) -> &str;

    /// Version (timestamp: YYYYMMDDHHMMSS)
    fn version(&self) -> i64;

    /// Apply the migration.
    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), DbError>;
}

/// Provides schema operations for migrations.
pub struct SchemaManager<'a> {
    executor: &'a dyn DbExecutor,
}

impl<'a> SchemaManager<'a> {
    pub fn new(executor: &'a dyn DbExecutor) -> Self {
        Self { executor }
    }

    /// Create a table from a `sea-query` statement.
    pub fn create_table(&self, table: TableCreateStatement) -> Result<(), DbError> {
        let sql = table.build(PostgresQueryBuilder);
        self.executor.execute(&sql, &[]).map(|_| ())
    }

    /// Execute raw DDL. Used for indexes and composite unique constraints.
    pub fn execute(&self, sql: &str) -> Result<(), DbError> {
        self.executor.execute(sql, &[]).map(|_| ())
    }
}

/// Initialize the migration state table.
///
/// Idempotent: `IF NOT EXISTS` makes re-runs a no-op.
fn initialize_state_table(executor: &dyn DbExecutor) -> Result<(), DbError> {
    let sql = r#"
        CREATE TABLE IF NOT EXISTS cartage_migrations (
            version BIGINT PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            applied_at TIMESTAMPTZ NOT NULL,
            execution_time_ms INTEGER,
            success BOOLEAN NOT NULL DEFAULT true
        )
    "#;
    executor.execute(sql, &[])?;
    Ok(())
}

/// Apply all pending migrations on application startup.
///
/// The first failing migration aborts startup; the application should not
/// serve traffic against a half-migrated schema.
///
/// # Errors
///
/// Returns `MigrationError` if the registry is malformed or any migration
/// fails to apply.
pub fn run_startup_migrations(executor: &dyn DbExecutor) -> Result<usize, MigrationError> {
    initialize_state_table(executor)?;

    let registry = migrations::registry();
    let mut seen = std::collections::HashSet::new();
    for m in &registry {
        if !seen.insert(m.version()) {
            return Err(MigrationError::InvalidRegistry(format!(
                "duplicate migration version {}",
                m.version()
            )));
        }
    }

    let applied: Vec<i64> = executor
        .query_all("SELECT version FROM cartage_migrations WHERE success", &[])?
        .iter()
        .map(|row| row.get(0))
        .collect();

    let manager = SchemaManager::new(executor);
    let mut count = 0usize;
    for migration in &registry {
        if applied.contains(&migration.version()) {
            continue;
        }
        let start = Instant::now();
        migration.up(&manager)?;
        let elapsed_ms = start.elapsed().as_millis() as i32;
        executor.execute(
            "INSERT INTO cartage_migrations (version, name, applied_at, execution_time_ms, success) \
             VALUES ($1, $2, $3, $4, true)",
            &[
                &migration.version(),
                &migration.name(),
                &Utc::now(),
                &elapsed_ms,
            ],
        )?;
        tracing::info!(
            "applied migration {} ({}) in {}ms",
            migration.version(),
            migration.name(),
            elapsed_ms
        );
        count += 1;
    }

    if count > 0 {
        tracing::info!("Applied {count} migration(s) on startup");
    } else {
        tracing::debug!("No pending migrations to apply");
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_versions_are_unique_and_ordered() {
        let registry = migrations::registry();
        assert!(!registry.is_empty());
        let versions: Vec<i64> = registry.iter().map(|m| m.version()).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(versions, sorted, "registry must be ordered with unique versions");
    }

    #[test]
    fn test_migration_error_display() {
        let err = MigrationError::InvalidRegistry("dup".to_string());
        assert!(err.to_string().contains("Invalid migration registry"));

        let err2 = MigrationError::Database(DbError::Other("x".to_string()));
        assert!(err2.to_string().contains("Migration database error"));
    }
}

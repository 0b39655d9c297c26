//! The [`DbExecutor`] trait and its client-backed implementation.
//!
//! Everything that talks to the database — repositories, the provisioning
//! hook, migrations — goes through this trait so the same code runs against a
//! plain client or an open [`crate::db::Transaction`].

use may_postgres::types::ToSql;
use may_postgres::{Client, Error as PostgresError, Row};
use std::fmt;
use std::time::Instant;

use crate::metrics::METRICS;

/// Database error type
#[derive(Debug)]
pub enum DbError {
    /// `PostgreSQL` error from `may_postgres`
    Postgres(PostgresError),
    /// Row decoding or enum-parse error
    Parse(String),
    /// Other execution errors
    Other(String),
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbError::Postgres(e) => write!(f, "PostgreSQL error: {e}"),
            DbError::Parse(s) => write!(f, "Parse error: {s}"),
            DbError::Other(s) => write!(f, "Execution error: {s}"),
        }
    }
}

impl std::error::Error for DbError {}

impl From<PostgresError> for DbError {
    fn from(err: PostgresError) -> Self {
        DbError::Postgres(err)
    }
}

impl DbError {
    /// Whether the underlying Postgres error is a unique-constraint violation
    /// (SQLSTATE 23505). Used for duplicate detection on create paths and the
    /// locker code collision race.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DbError::Postgres(e) => e
                .code()
                .map(|c| c.code() == "23505")
                .unwrap_or(false),
            _ => false,
        }
    }
}

/// Trait for executing database operations.
///
/// Queries are SQL strings with `$1`, `$2`, ... placeholders; parameters are
/// bound positionally.
pub trait DbExecutor {
    /// Execute a statement and return the number of rows affected.
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, DbError>;

    /// Execute a query expecting exactly one row.
    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, DbError>;

    /// Execute a query and return all rows.
    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError>;

    /// Execute a query and return the first row, if any.
    fn query_opt(&self, query: &str, params: &[&dyn ToSql]) -> Result<Option<Row>, DbError> {
        let mut rows = self.query_all(query, params)?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.swap_remove(0)))
        }
    }
}

/// Primary `DbExecutor` implementation over a `may_postgres::Client`.
pub struct ClientExecutor {
    client: Client,
}

impl ClientExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Start a transaction on a clone of the underlying client.
    ///
    /// # Errors
    ///
    /// Returns `DbError` if `BEGIN` cannot be issued.
    pub fn begin(&self) -> Result<crate::db::Transaction, DbError> {
        crate::db::Transaction::new(self.client.clone())
    }
}

impl DbExecutor for ClientExecutor {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, DbError> {
        let start = Instant::now();
        let result = self.client.execute(query, params).map_err(|e| {
            METRICS.record_query_error();
            DbError::Postgres(e)
        });
        METRICS.record_query_duration(start.elapsed());
        result
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, DbError> {
        let start = Instant::now();
        let result = self.client.query_one(query, params).map_err(|e| {
            METRICS.record_query_error();
            DbError::Postgres(e)
        });
        METRICS.record_query_duration(start.elapsed());
        result
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError> {
        let start = Instant::now();
        let result = self.client.query(query, params).map_err(|e| {
            METRICS.record_query_error();
            DbError::Postgres(e)
        });
        METRICS.record_query_duration(start.elapsed());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_display() {
        let err = DbError::Parse("bad enum value".to_string());
        assert!(err.to_string().contains("Parse error"));

        let err2 = DbError::Other("boom".to_string());
        assert!(err2.to_string().contains("Execution error"));
        assert!(err2.to_string().contains("boom"));
    }

    #[test]
    fn test_non_postgres_errors_are_not_unique_violations() {
        assert!(!DbError::Parse("x".to_string()).is_unique_violation());
        assert!(!DbError::Other("x".to_string()).is_unique_violation());
    }
}

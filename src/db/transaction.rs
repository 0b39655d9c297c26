//! Database transactions.
//!
//! A [`Transaction`] owns a clone of the client, issues `BEGIN` on creation
//! and must be finished with [`commit`](Transaction::commit) or
//! [`rollback`](Transaction::rollback). It implements [`DbExecutor`] so
//! repository functions run unchanged inside one.

use may_postgres::types::ToSql;
use may_postgres::{Client, Row};
use std::fmt;
use std::time::Instant;

use crate::db::executor::{DbError, DbExecutor};
use crate::metrics::METRICS;

/// Transaction error type
#[derive(Debug)]
pub enum TransactionError {
    /// PostgreSQL error from may_postgres
    Postgres(may_postgres::Error),
    /// Transaction already committed or rolled back
    Closed,
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionError::Postgres(e) => write!(f, "PostgreSQL error: {e}"),
            TransactionError::Closed => {
                write!(f, "Transaction has already been committed or rolled back")
            }
        }
    }
}

impl std::error::Error for TransactionError {}

impl From<TransactionError> for DbError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::Postgres(e) => DbError::Postgres(e),
            TransactionError::Closed => DbError::Other("Transaction closed".to_string()),
        }
    }
}

/// An open database transaction.
///
/// All statements executed through it are committed together or rolled back
/// together. Dropping a transaction without committing leaves the `BEGIN`
/// unterminated; the connection rolls it back when reused.
pub struct Transaction {
    client: Client,
    closed: bool,
}

impl Transaction {
    /// Begin a transaction on the given client.
    pub(crate) fn new(client: Client) -> Result<Self, DbError> {
        client.execute("BEGIN", &[]).map_err(DbError::Postgres)?;
        Ok(Self {
            client,
            closed: false,
        })
    }

    /// Commit the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the transaction is already closed or `COMMIT`
    /// fails.
    pub fn commit(mut self) -> Result<(), TransactionError> {
        if self.closed {
            return Err(TransactionError::Closed);
        }
        self.client
            .execute("COMMIT", &[])
            .map_err(TransactionError::Postgres)?;
        self.closed = true;
        Ok(())
    }

    /// Roll back the transaction, discarding every statement since `BEGIN`.
    pub fn rollback(mut self) -> Result<(), TransactionError> {
        if self.closed {
            return Err(TransactionError::Closed);
        }
        self.client
            .execute("ROLLBACK", &[])
            .map_err(TransactionError::Postgres)?;
        self.closed = true;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl DbExecutor for Transaction {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, DbError> {
        if self.closed {
            return Err(DbError::Other("Transaction is closed".to_string()));
        }
        let start = Instant::now();
        let result = self.client.execute(query, params).map_err(|e| {
            METRICS.record_query_error();
            DbError::Postgres(e)
        });
        METRICS.record_query_duration(start.elapsed());
        result
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, DbError> {
        if self.closed {
            return Err(DbError::Other("Transaction is closed".to_string()));
        }
        let start = Instant::now();
        let result = self.client.query_one(query, params).map_err(|e| {
            METRICS.record_query_error();
            DbError::Postgres(e)
        });
        METRICS.record_query_duration(start.elapsed());
        result
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, DbError> {
        if self.closed {
            return Err(DbError::Other("Transaction is closed".to_string()));
        }
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
    fn test_transaction_error_display() {
        let err = TransactionError::Closed;
        assert!(err
            .to_string()
            .contains("Transaction has already been committed"));
    }

    #[test]
    fn test_transaction_error_conversion() {
        let err = TransactionError::Closed;
        let db_err: DbError = err.into();
        assert!(db_err.to_string().contains("Transaction closed"));
    }
}

//! Database access layer.
//!
//! Wraps `may_postgres` behind the [`DbExecutor`] trait so repositories,
//! migrations and transactions share one execution surface. Queries are plain
//! `$n`-parameterized SQL; dynamically assembled statements go through
//! [`params::with_bound_params`].

pub mod connection;
pub mod executor;
pub mod params;
pub mod transaction;

pub use connection::{connect, validate_connection_string, ConnectionError};
pub use executor::{ClientExecutor, DbError, DbExecutor};
pub use transaction::Transaction;

use may_postgres::Row;

/// Conversion from a database row into a typed record.
///
/// Implementations read columns by name and surface decode or enum-parse
/// failures as [`DbError::Parse`].
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, DbError>;
}

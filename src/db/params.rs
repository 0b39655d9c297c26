//! SeaQuery-to-postgres parameter binding.
//!
//! Statements assembled with `sea-query` build into a SQL string plus a
//! `Values` list; this module converts those values into `ToSql` trait
//! objects for `may_postgres`.
//!
//! The conversion is two-pass: values are first collected into typed storage
//! vectors, then referenced in order, so the borrows handed to the closure
//! stay valid for its whole scope.
//!
//! Fixed-shape queries with `Uuid`/`chrono`/`Decimal` parameters bind those
//! types directly through `DbExecutor` instead of going through here.

use may_postgres::types::ToSql;
use sea_query::Value;

use crate::db::executor::DbError;

/// Convert SeaQuery values to `ToSql` parameters and run `f` with them.
///
/// # Errors
///
/// Returns `DbError::Other` for value types this shim does not carry.
pub fn with_bound_params<F, R>(values: &sea_query::Values, f: F) -> Result<R, DbError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, DbError>,
{
    let mut bools: Vec<bool> = Vec::new();
    let mut ints: Vec<i32> = Vec::new();
    let mut big_ints: Vec<i64> = Vec::new();
    let mut strings: Vec<String> = Vec::new();
    let mut doubles: Vec<f64> = Vec::new();
    let mut nulls: Vec<Option<String>> = Vec::new();

    // First pass: collect values into typed vectors.
    for value in values.iter() {
        match value {
            Value::Bool(Some(b)) => bools.push(*b),
            Value::Int(Some(i)) => ints.push(*i),
            Value::BigInt(Some(i)) => big_ints.push(*i),
            Value::TinyInt(Some(i)) => ints.push(*i as i32),
            Value::SmallInt(Some(i)) => ints.push(*i as i32),
            Value::TinyUnsigned(Some(u)) => ints.push(*u as i32),
            Value::SmallUnsigned(Some(u)) => ints.push(*u as i32),
            Value::Unsigned(Some(u)) => big_ints.push(*u as i64),
            Value::Float(Some(f)) => doubles.push(*f as f64),
            Value::Double(Some(d)) => doubles.push(*d),
            Value::String(Some(s)) => strings.push(s.clone()),
            Value::Bool(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None) => nulls.push(None),
            other => {
                return Err(DbError::Other(format!(
                    "Unsupported value type in query: {other:?}"
                )));
            }
        }
    }

    // Second pass: reference the stored values in statement order.
    let mut bool_idx = 0;
    let mut int_idx = 0;
    let mut big_int_idx = 0;
    let mut string_idx = 0;
    let mut double_idx = 0;
    let mut null_idx = 0;

    let mut params: Vec<&dyn ToSql> = Vec::new();
    for value in values.iter() {
        match value {
            Value::Bool(Some(_)) => {
                params.push(&bools[bool_idx] as &dyn ToSql);
                bool_idx += 1;
            }
            Value::Int(Some(_))
            | Value::TinyInt(Some(_))
            | Value::SmallInt(Some(_))
            | Value::TinyUnsigned(Some(_))
            | Value::SmallUnsigned(Some(_)) => {
                params.push(&ints[int_idx] as &dyn ToSql);
                int_idx += 1;
            }
            Value::BigInt(Some(_)) | Value::Unsigned(Some(_)) => {
                params.push(&big_ints[big_int_idx] as &dyn ToSql);
                big_int_idx += 1;
            }
            Value::Float(Some(_)) | Value::Double(Some(_)) => {
                params.push(&doubles[double_idx] as &dyn ToSql);
                double_idx += 1;
            }
            Value::String(Some(_)) => {
                params.push(&strings[string_idx] as &dyn ToSql);
                string_idx += 1;
            }
            _ => {
                params.push(&nulls[null_idx] as &dyn ToSql);
                null_idx += 1;
            }
        }
    }

    f(&params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::Values;

    #[test]
    fn test_with_bound_params_orders_mixed_types() {
        let values = Values(vec![
            Value::String(Some("in_transit".to_string())),
            Value::Int(Some(7)),
            Value::Bool(Some(true)),
            Value::Double(Some(2.5)),
        ]);
        let n = with_bound_params(&values, |params| Ok(params.len())).unwrap();
        assert_eq!(n, 4);
    }

    #[test]
    fn test_with_bound_params_rejects_unsupported() {
        let values = Values(vec![Value::Bytes(Some(vec![1, 2, 3]))]);
        let err = with_bound_params(&values, |params| Ok(params.len())).unwrap_err();
        assert!(err.to_string().contains("Unsupported value type"));
    }
}

//! Locker auto-provisioning.
//!
//! Post-commit hook run by the account service after a customer account is
//! durably created: every warehouse existing at that moment gets one locker
//! for the new customer, all inside a single transaction. Warehouses added
//! later are not provisioned retroactively.
//!
//! Provisioning is best-effort by policy: the caller logs a returned fault
//! and swallows it, so account creation never fails on a locker problem.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::db::transaction::TransactionError;
use crate::db::{ClientExecutor, DbError, DbExecutor};
use crate::domain::{locker, warehouse, Locker, User, Warehouse};

/// Provisioning error type
#[derive(Debug)]
pub enum ProvisionError {
    /// A statement inside the provisioning transaction failed
    Database(DbError),
    /// The surrounding transaction could not commit or roll back
    Transaction(TransactionError),
}

impl fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionError::Database(e) => write!(f, "Provisioning failed: {e}"),
            ProvisionError::Transaction(e) => write!(f, "Provisioning transaction failed: {e}"),
        }
    }
}

impl std::error::Error for ProvisionError {}

impl From<DbError> for ProvisionError {
    fn from(err: DbError) -> Self {
        ProvisionError::Database(err)
    }
}

impl From<TransactionError> for ProvisionError {
    fn from(err: TransactionError) -> Self {
        ProvisionError::Transaction(err)
    }
}

/// First `n` non-whitespace characters, uppercased.
fn code_fragment(source: &str, n: usize) -> String {
    source
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(n)
        .collect::<String>()
        .to_uppercase()
}

/// Derive the primary locker code for a (warehouse, customer) pair.
///
/// `{first 3 of city, or name when city is absent}-{first 5 of username}-{seq}`
/// with both fragments uppercased and whitespace-stripped, and the sequence
/// zero-padded to three digits.
pub fn derive_locker_code(warehouse: &Warehouse, username: &str, sequence: i64) -> String {
    let warehouse_code = match warehouse.city {
        Some(ref city) if !city.trim().is_empty() => code_fragment(city, 3),
        _ => code_fragment(&warehouse.name, 3),
    };
    let user_code = code_fragment(username, 5);
    format!("{warehouse_code}-{user_code}-{sequence:03}")
}

/// Alternate code used when the primary collides with an existing locker:
/// the primary plus an `ALT` tag and a 3-digit value derived from the
/// current time.
pub fn alternate_code(primary: &str, now: DateTime<Utc>) -> String {
    format!("{primary}-ALT{:03}", now.timestamp_subsec_millis())
}

/// Create one locker per existing warehouse for a freshly created customer.
///
/// The whole warehouse loop runs in one transaction: a fault anywhere aborts
/// every locker for this user. Returns the lockers created; zero when no
/// warehouses exist or the account is not a customer.
///
/// # Errors
///
/// Returns `ProvisionError` when any statement or the commit fails; the
/// transaction is rolled back on a best-effort basis first.
pub fn provision_customer_lockers(
    executor: &ClientExecutor,
    user: &User,
) -> Result<Vec<Locker>, ProvisionError> {
    if !user.is_customer() {
        return Ok(Vec::new());
    }

    let txn = executor.begin()?;
    match provision_in_txn(&txn, user) {
        Ok(created) => {
            txn.commit()?;
            tracing::info!(
                "provisioned {} locker(s) for customer {}",
                created.len(),
                user.username
            );
            Ok(created)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback() {
                tracing::warn!("provisioning rollback failed: {rollback_err}");
            }
            Err(e)
        }
    }
}

fn provision_in_txn(txn: &dyn DbExecutor, user: &User) -> Result<Vec<Locker>, ProvisionError> {
    // Snapshot of warehouses at firing time.
    let warehouses = warehouse::list_all(txn)?;
    let mut created = Vec::with_capacity(warehouses.len());

    for wh in &warehouses {
        let sequence = locker::count_for_customer_at_warehouse(txn, user.id, wh.id)? + 1;
        let mut code = derive_locker_code(wh, &user.username, sequence);
        if locker::code_exists(txn, &code)? {
            code = alternate_code(&code, Utc::now());
        }
        let new_locker = Locker::new(
            code,
            Some(format!("Auto-assigned locker for {}", user.username)),
            user.id,
            wh.id,
        );
        locker::insert(txn, &new_locker)?;
        created.push(new_locker);
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Warehouse;
    use chrono::TimeZone;

    fn warehouse(name: &str, city: Option<&str>) -> Warehouse {
        Warehouse::new(name.to_string(), None, city.map(str::to_string), None)
    }

    #[test]
    fn test_derive_code_uses_city() {
        let wh = warehouse("Shipped UAE Warehouse", Some("Dubai"));
        assert_eq!(derive_locker_code(&wh, "john_doe", 1), "DUB-JOHN_-001");
    }

    #[test]
    fn test_derive_code_falls_back_to_name() {
        let wh = warehouse("Egypt Warehouse", None);
        assert_eq!(derive_locker_code(&wh, "john_doe", 1), "EGY-JOHN_-001");

        let blank_city = warehouse("Egypt Warehouse", Some("   "));
        assert_eq!(derive_locker_code(&blank_city, "john_doe", 2), "EGY-JOHN_-002");
    }

    #[test]
    fn test_derive_code_strips_spaces_before_truncating() {
        let wh = warehouse("x", Some("New York"));
        assert_eq!(derive_locker_code(&wh, "mary jane", 3), "NEW-MARYJ-003");
    }

    #[test]
    fn test_derive_code_short_fragments() {
        let wh = warehouse("AB", None);
        assert_eq!(derive_locker_code(&wh, "jo", 1), "AB-JO-001");
    }

    #[test]
    fn test_sequence_padding() {
        let wh = warehouse("x", Some("Dubai"));
        assert_eq!(derive_locker_code(&wh, "john_doe", 12), "DUB-JOHN_-012");
        assert_eq!(derive_locker_code(&wh, "john_doe", 123), "DUB-JOHN_-123");
    }

    #[test]
    fn test_alternate_code_appends_alt_tag() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(alternate_code("DUB-JOHN_-001", now), "DUB-JOHN_-001-ALT042");
    }

    #[test]
    fn test_provision_error_display() {
        let err = ProvisionError::Database(DbError::Other("boom".to_string()));
        assert!(err.to_string().contains("Provisioning failed"));
    }
}

//! Customer lockers.
//!
//! One locker per (customer, warehouse) pair, keyed by a globally unique
//! code. Lockers are normally created by the provisioning hook, not by an
//! explicit API call.

use chrono::{DateTime, Utc};
use may_postgres::Row;
use uuid::Uuid;

use crate::db::{DbError, DbExecutor, FromRow};

#[derive(Debug, Clone)]
pub struct Locker {
    pub id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub customer_id: Uuid,
    pub warehouse_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Locker {
    pub fn new(code: String, description: Option<String>, customer_id: Uuid, warehouse_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            code,
            description,
            customer_id,
            warehouse_id,
            created_at: now,
            updated_at: now,
        }
    }
}

impl FromRow for Locker {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Locker {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            description: row.try_get("description")?,
            customer_id: row.try_get("customer_id")?,
            warehouse_id: row.try_get("warehouse_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

const LOCKER_COLUMNS: &str =
    "id, code, description, customer_id, warehouse_id, created_at, updated_at";

pub fn insert(db: &dyn DbExecutor, locker: &Locker) -> Result<(), DbError> {
    db.execute(
        "INSERT INTO lockers (id, code, description, customer_id, warehouse_id, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
        &[
            &locker.id,
            &locker.code,
            &locker.description,
            &locker.customer_id,
            &locker.warehouse_id,
            &locker.created_at,
            &locker.updated_at,
        ],
    )?;
    Ok(())
}

pub fn code_exists(db: &dyn DbExecutor, code: &str) -> Result<bool, DbError> {
    let row = db.query_one("SELECT EXISTS(SELECT 1 FROM lockers WHERE code = $1)", &[&code])?;
    Ok(row.get(0))
}

/// Lockers a customer already holds at a warehouse. Feeds the sequence
/// number in the locker code.
pub fn count_for_customer_at_warehouse(
    db: &dyn DbExecutor,
    customer_id: Uuid,
    warehouse_id: Uuid,
) -> Result<i64, DbError> {
    let row = db.query_one(
        "SELECT COUNT(*) FROM lockers WHERE customer_id = $1 AND warehouse_id = $2",
        &[&customer_id, &warehouse_id],
    )?;
    Ok(row.get(0))
}

pub fn list_for_customer(db: &dyn DbExecutor, customer_id: Uuid) -> Result<Vec<Locker>, DbError> {
    let sql = format!(
        "SELECT {LOCKER_COLUMNS} FROM lockers WHERE customer_id = $1 ORDER BY created_at"
    );
    db.query_all(&sql, &[&customer_id])?
        .iter()
        .map(Locker::from_row)
        .collect()
}

pub fn list_all(db: &dyn DbExecutor) -> Result<Vec<Locker>, DbError> {
    let sql = format!("SELECT {LOCKER_COLUMNS} FROM lockers ORDER BY created_at");
    db.query_all(&sql, &[])?
        .iter()
        .map(Locker::from_row)
        .collect()
}

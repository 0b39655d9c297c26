//! Warehouse records.

use chrono::{DateTime, Utc};
use may_postgres::Row;
use uuid::Uuid;

use crate::db::{DbError, DbExecutor, FromRow};

#[derive(Debug, Clone)]
pub struct Warehouse {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Warehouse {
    pub fn new(name: String, address: Option<String>, city: Option<String>, country: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            address,
            city,
            country,
            created_at: now,
            updated_at: now,
        }
    }
}

impl FromRow for Warehouse {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(Warehouse {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            country: row.try_get("country")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

const WAREHOUSE_COLUMNS: &str = "id, name, address, city, country, created_at, updated_at";

pub fn insert(db: &dyn DbExecutor, warehouse: &Warehouse) -> Result<(), DbError> {
    db.execute(
        "INSERT INTO warehouses (id, name, address, city, country, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
        &[
            &warehouse.id,
            &warehouse.name,
            &warehouse.address,
            &warehouse.city,
            &warehouse.country,
            &warehouse.created_at,
            &warehouse.updated_at,
        ],
    )?;
    Ok(())
}

pub fn find_by_id(db: &dyn DbExecutor, id: Uuid) -> Result<Option<Warehouse>, DbError> {
    let sql = format!("SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE id = $1");
    db.query_opt(&sql, &[&id])?
        .map(|row| Warehouse::from_row(&row))
        .transpose()
}

pub fn find_by_name(db: &dyn DbExecutor, name: &str) -> Result<Option<Warehouse>, DbError> {
    let sql = format!("SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE name = $1");
    db.query_opt(&sql, &[&name])?
        .map(|row| Warehouse::from_row(&row))
        .transpose()
}

/// All warehouses, oldest first. The provisioning hook snapshots this list.
pub fn list_all(db: &dyn DbExecutor) -> Result<Vec<Warehouse>, DbError> {
    let sql = format!("SELECT {WAREHOUSE_COLUMNS} FROM warehouses ORDER BY created_at");
    db.query_all(&sql, &[])?
        .iter()
        .map(Warehouse::from_row)
        .collect()
}

//! International shipping boxes and their item links.

use chrono::{DateTime, Utc};
use may_postgres::Row;
use sea_query::{Expr, ExprTrait, Order, PostgresQueryBuilder, Query};
use std::str::FromStr;
use uuid::Uuid;

use crate::db::params::with_bound_params;
use crate::db::{DbError, DbExecutor, FromRow};
use crate::domain::enums::BoxStatus;

/// International shipping box/container.
#[derive(Debug, Clone)]
pub struct InternationalBox {
    pub id: Uuid,
    pub box_number: String,
    pub tracking_number: Option<String>,
    pub status: BoxStatus,
    pub origin_country: Option<String>,
    pub destination_country: Option<String>,
    pub total_weight_kg: f64,
    pub items_count: i32,
    pub warehouse_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for InternationalBox {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        let status_raw: String = row.try_get("status")?;
        Ok(InternationalBox {
            id: row.try_get("id")?,
            box_number: row.try_get("box_number")?,
            tracking_number: row.try_get("tracking_number")?,
            status: BoxStatus::from_str(&status_raw).map_err(|e| DbError::Parse(e.to_string()))?,
            origin_country: row.try_get("origin_country")?,
            destination_country: row.try_get("destination_country")?,
            total_weight_kg: row.try_get("total_weight_kg")?,
            items_count: row.try_get("items_count")?,
            warehouse_id: row.try_get("warehouse_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

const BOX_COLUMNS: &str = "id, box_number, tracking_number, status, origin_country, \
     destination_country, total_weight_kg, items_count, warehouse_id, created_at, updated_at";

pub fn insert(db: &dyn DbExecutor, b: &InternationalBox) -> Result<(), DbError> {
    db.execute(
        "INSERT INTO international_boxes (id, box_number, tracking_number, status, origin_country, \
         destination_country, total_weight_kg, items_count, warehouse_id, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        &[
            &b.id,
            &b.box_number,
            &b.tracking_number,
            &b.status.as_str(),
            &b.origin_country,
            &b.destination_country,
            &b.total_weight_kg,
            &b.items_count,
            &b.warehouse_id,
            &b.created_at,
            &b.updated_at,
        ],
    )?;
    Ok(())
}

pub fn find_by_id(db: &dyn DbExecutor, id: Uuid) -> Result<Option<InternationalBox>, DbError> {
    let sql = format!("SELECT {BOX_COLUMNS} FROM international_boxes WHERE id = $1");
    db.query_opt(&sql, &[&id])?
        .map(|row| InternationalBox::from_row(&row))
        .transpose()
}

/// Box listing with an optional status filter, newest first.
pub fn list(db: &dyn DbExecutor, status: Option<BoxStatus>) -> Result<Vec<InternationalBox>, DbError> {
    let mut query = Query::select();
    query
        .expr(Expr::cust(BOX_COLUMNS))
        .from("international_boxes")
        .order_by("created_at", Order::Desc);
    if let Some(status) = status {
        query.and_where(Expr::col("status").eq(status.as_str()));
    }

    let (sql, values) = query.build(PostgresQueryBuilder);
    with_bound_params(&values, |params| {
        db.query_all(&sql, params)?
            .iter()
            .map(InternationalBox::from_row)
            .collect()
    })
}

pub fn count_all(db: &dyn DbExecutor) -> Result<i64, DbError> {
    let row = db.query_one("SELECT COUNT(*) FROM international_boxes", &[])?;
    Ok(row.get(0))
}

pub fn count_by_status(db: &dyn DbExecutor, status: BoxStatus) -> Result<i64, DbError> {
    let row = db.query_one(
        "SELECT COUNT(*) FROM international_boxes WHERE status = $1",
        &[&status.as_str()],
    )?;
    Ok(row.get(0))
}

pub fn update_status(db: &dyn DbExecutor, id: Uuid, status: BoxStatus) -> Result<u64, DbError> {
    db.execute(
        "UPDATE international_boxes SET status = $1, updated_at = $2 WHERE id = $3",
        &[&status.as_str(), &Utc::now(), &id],
    )
}

/// Recompute the box aggregates from its linked items.
pub fn refresh_aggregates(db: &dyn DbExecutor, box_id: Uuid) -> Result<(), DbError> {
    db.execute(
        "UPDATE international_boxes SET \
         items_count = (SELECT COUNT(*) FROM box_items WHERE box_id = $1), \
         total_weight_kg = (SELECT COALESCE(SUM(i.weight_kg), 0) \
             FROM box_items bi JOIN items i ON i.id = bi.item_id WHERE bi.box_id = $1), \
         updated_at = $2 \
         WHERE id = $1",
        &[&box_id, &Utc::now()],
    )?;
    Ok(())
}

/// Link row between a box and an item.
#[derive(Debug, Clone)]
pub struct BoxItem {
    pub id: Uuid,
    pub box_id: Uuid,
    pub item_id: Uuid,
    pub added_at: DateTime<Utc>,
    pub added_by: Option<Uuid>,
    pub note: Option<String>,
}

impl FromRow for BoxItem {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(BoxItem {
            id: row.try_get("id")?,
            box_id: row.try_get("box_id")?,
            item_id: row.try_get("item_id")?,
            added_at: row.try_get("added_at")?,
            added_by: row.try_get("added_by")?,
            note: row.try_get("note")?,
        })
    }
}

pub fn insert_box_item(db: &dyn DbExecutor, link: &BoxItem) -> Result<(), DbError> {
    db.execute(
        "INSERT INTO box_items (id, box_id, item_id, added_at, added_by, note) \
         VALUES ($1, $2, $3, $4, $5, $6)",
        &[
            &link.id,
            &link.box_id,
            &link.item_id,
            &link.added_at,
            &link.added_by,
            &link.note,
        ],
    )?;
    Ok(())
}

pub fn list_box_items(db: &dyn DbExecutor, box_id: Uuid) -> Result<Vec<BoxItem>, DbError> {
    db.query_all(
        "SELECT id, box_id, item_id, added_at, added_by, note FROM box_items \
         WHERE box_id = $1 ORDER BY added_at",
        &[&box_id],
    )?
    .iter()
    .map(BoxItem::from_row)
    .collect()
}

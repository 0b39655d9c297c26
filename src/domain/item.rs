//! Physical items and customer-service requests.

use chrono::{DateTime, Utc};
use may_postgres::Row;
use rust_decimal::Decimal;
use sea_query::{Expr, ExprTrait, Order, PostgresQueryBuilder, Query};
use std::str::FromStr;
use uuid::Uuid;

use crate::db::params::with_bound_params;
use crate::db::{DbError, DbExecutor, FromRow};
use crate::domain::enums::{ItemCondition, ItemStatus, RequestStatus};

/// Physical item scanned at a warehouse.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: Uuid,
    pub tracking_number: String,
    pub scanning_date: Option<DateTime<Utc>>,
    pub weight_kg: Option<f64>,
    pub category: Option<String>,
    pub quantity: i32,
    pub country_origin: Option<String>,
    pub status: ItemStatus,
    pub condition: ItemCondition,
    pub customer_id: Uuid,
    pub locker_id: Uuid,
    pub international_order_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Item {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        let status_raw: String = row.try_get("status")?;
        let condition_raw: String = row.try_get("condition")?;
        Ok(Item {
            id: row.try_get("id")?,
            tracking_number: row.try_get("tracking_number")?,
            scanning_date: row.try_get("scanning_date")?,
            weight_kg: row.try_get("weight_kg")?,
            category: row.try_get("category")?,
            quantity: row.try_get("quantity")?,
            country_origin: row.try_get("country_origin")?,
            status: ItemStatus::from_str(&status_raw).map_err(|e| DbError::Parse(e.to_string()))?,
            condition: ItemCondition::from_str(&condition_raw)
                .map_err(|e| DbError::Parse(e.to_string()))?,
            customer_id: row.try_get("customer_id")?,
            locker_id: row.try_get("locker_id")?,
            international_order_id: row.try_get("international_order_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

const ITEM_COLUMNS: &[&str] = &[
    "id",
    "tracking_number",
    "scanning_date",
    "weight_kg",
    "category",
    "quantity",
    "country_origin",
    "status",
    "condition",
    "customer_id",
    "locker_id",
    "international_order_id",
    "created_at",
    "updated_at",
];

/// Optional filters for item listings.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub status: Option<ItemStatus>,
    pub category: Option<String>,
}

pub fn insert(db: &dyn DbExecutor, item: &Item) -> Result<(), DbError> {
    db.execute(
        "INSERT INTO items (id, tracking_number, scanning_date, weight_kg, category, quantity, \
         country_origin, status, condition, customer_id, locker_id, international_order_id, \
         created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        &[
            &item.id,
            &item.tracking_number,
            &item.scanning_date,
            &item.weight_kg,
            &item.category,
            &item.quantity,
            &item.country_origin,
            &item.status.as_str(),
            &item.condition.as_str(),
            &item.customer_id,
            &item.locker_id,
            &item.international_order_id,
            &item.created_at,
            &item.updated_at,
        ],
    )?;
    Ok(())
}

pub fn find_by_id(db: &dyn DbExecutor, id: Uuid) -> Result<Option<Item>, DbError> {
    let sql = format!(
        "SELECT {} FROM items WHERE id = $1",
        ITEM_COLUMNS.join(", ")
    );
    db.query_opt(&sql, &[&id])?
        .map(|row| Item::from_row(&row))
        .transpose()
}

pub fn find_by_tracking_number(db: &dyn DbExecutor, tracking: &str) -> Result<Option<Item>, DbError> {
    let sql = format!(
        "SELECT {} FROM items WHERE tracking_number = $1",
        ITEM_COLUMNS.join(", ")
    );
    db.query_opt(&sql, &[&tracking])?
        .map(|row| Item::from_row(&row))
        .transpose()
}

/// Item listing with optional status/category filters, newest first.
///
/// The statement is assembled with `sea-query` because the filter set is
/// dynamic; parameters are bound through the conversion shim.
pub fn list(db: &dyn DbExecutor, filter: &ItemFilter) -> Result<Vec<Item>, DbError> {
    let mut query = Query::select();
    for col in ITEM_COLUMNS {
        query.expr(Expr::col(*col));
    }
    query.from("items").order_by("created_at", Order::Desc);
    if let Some(status) = filter.status {
        query.and_where(Expr::col("status").eq(status.as_str()));
    }
    if let Some(ref category) = filter.category {
        query.and_where(Expr::col("category").eq(category.as_str()));
    }

    let (sql, values) = query.build(PostgresQueryBuilder);
    with_bound_params(&values, |params| {
        db.query_all(&sql, params)?
            .iter()
            .map(Item::from_row)
            .collect()
    })
}

pub fn update_status(
    db: &dyn DbExecutor,
    id: Uuid,
    status: ItemStatus,
    condition: Option<ItemCondition>,
) -> Result<u64, DbError> {
    match condition {
        Some(condition) => db.execute(
            "UPDATE items SET status = $1, condition = $2, updated_at = $3 WHERE id = $4",
            &[&status.as_str(), &condition.as_str(), &Utc::now(), &id],
        ),
        None => db.execute(
            "UPDATE items SET status = $1, updated_at = $2 WHERE id = $3",
            &[&status.as_str(), &Utc::now(), &id],
        ),
    }
}

/// Customer-service request (mismatches, returns, refunds).
#[derive(Debug, Clone)]
pub struct ItemRequest {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub subject: String,
    pub message: String,
    pub charge: Decimal,
    pub item_id: Option<Uuid>,
    pub box_id: Option<Uuid>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for ItemRequest {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        let status_raw: String = row.try_get("status")?;
        Ok(ItemRequest {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            subject: row.try_get("subject")?,
            message: row.try_get("message")?,
            charge: row.try_get("charge")?,
            item_id: row.try_get("item_id")?,
            box_id: row.try_get("box_id")?,
            status: RequestStatus::from_str(&status_raw)
                .map_err(|e| DbError::Parse(e.to_string()))?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

const REQUEST_COLUMNS: &str =
    "id, customer_id, subject, message, charge, item_id, box_id, status, created_at, updated_at";

pub fn insert_request(db: &dyn DbExecutor, request: &ItemRequest) -> Result<(), DbError> {
    db.execute(
        "INSERT INTO item_requests (id, customer_id, subject, message, charge, item_id, box_id, \
         status, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        &[
            &request.id,
            &request.customer_id,
            &request.subject,
            &request.message,
            &request.charge,
            &request.item_id,
            &request.box_id,
            &request.status.as_str(),
            &request.created_at,
            &request.updated_at,
        ],
    )?;
    Ok(())
}

pub fn find_request_by_id(db: &dyn DbExecutor, id: Uuid) -> Result<Option<ItemRequest>, DbError> {
    let sql = format!("SELECT {REQUEST_COLUMNS} FROM item_requests WHERE id = $1");
    db.query_opt(&sql, &[&id])?
        .map(|row| ItemRequest::from_row(&row))
        .transpose()
}

pub fn list_requests(db: &dyn DbExecutor) -> Result<Vec<ItemRequest>, DbError> {
    let sql = format!("SELECT {REQUEST_COLUMNS} FROM item_requests ORDER BY created_at DESC");
    db.query_all(&sql, &[])?
        .iter()
        .map(ItemRequest::from_row)
        .collect()
}

pub fn update_request_status(
    db: &dyn DbExecutor,
    id: Uuid,
    status: RequestStatus,
) -> Result<u64, DbError> {
    db.execute(
        "UPDATE item_requests SET status = $1, updated_at = $2 WHERE id = $3",
        &[&status.as_str(), &Utc::now(), &id],
    )
}

//! Orders: external marketplace orders, their shipment labels, and final
//! domestic deliveries.

use chrono::{DateTime, Utc};
use may_postgres::Row;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::db::{DbError, DbExecutor, FromRow};
use crate::domain::enums::{DomesticOrderStatus, SourceOrderStatus};

/// External marketplace order (Amazon, Noon, ...).
#[derive(Debug, Clone)]
pub struct InternationalOrder {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub marketplace: String,
    pub marketplace_order_ref: Option<String>,
    pub order_url: Option<String>,
    pub currency: Option<String>,
    pub total_amount: Option<Decimal>,
    pub status: SourceOrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for InternationalOrder {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        let status_raw: String = row.try_get("status")?;
        Ok(InternationalOrder {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            marketplace: row.try_get("marketplace")?,
            marketplace_order_ref: row.try_get("marketplace_order_ref")?,
            order_url: row.try_get("order_url")?,
            currency: row.try_get("currency")?,
            total_amount: row.try_get("total_amount")?,
            status: SourceOrderStatus::from_str(&status_raw)
                .map_err(|e| DbError::Parse(e.to_string()))?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

const ORDER_COLUMNS: &str = "id, customer_id, marketplace, marketplace_order_ref, order_url, \
     currency, total_amount, status, created_at, updated_at";

pub fn insert(db: &dyn DbExecutor, order: &InternationalOrder) -> Result<(), DbError> {
    db.execute(
        "INSERT INTO international_orders (id, customer_id, marketplace, marketplace_order_ref, \
         order_url, currency, total_amount, status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        &[
            &order.id,
            &order.customer_id,
            &order.marketplace,
            &order.marketplace_order_ref,
            &order.order_url,
            &order.currency,
            &order.total_amount,
            &order.status.as_str(),
            &order.created_at,
            &order.updated_at,
        ],
    )?;
    Ok(())
}

pub fn find_by_id(db: &dyn DbExecutor, id: Uuid) -> Result<Option<InternationalOrder>, DbError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM international_orders WHERE id = $1");
    db.query_opt(&sql, &[&id])?
        .map(|row| InternationalOrder::from_row(&row))
        .transpose()
}

pub fn list_all(db: &dyn DbExecutor) -> Result<Vec<InternationalOrder>, DbError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM international_orders ORDER BY created_at DESC");
    db.query_all(&sql, &[])?
        .iter()
        .map(InternationalOrder::from_row)
        .collect()
}

pub fn update_status(
    db: &dyn DbExecutor,
    id: Uuid,
    status: SourceOrderStatus,
) -> Result<u64, DbError> {
    db.execute(
        "UPDATE international_orders SET status = $1, updated_at = $2 WHERE id = $3",
        &[&status.as_str(), &Utc::now(), &id],
    )
}

/// Internal barcode record for package tracking. One per order.
#[derive(Debug, Clone)]
pub struct ShipmentLabel {
    pub id: Uuid,
    pub barcode_number: String,
    pub customer_id: Uuid,
    pub international_order_id: Uuid,
    pub is_printed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for ShipmentLabel {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        Ok(ShipmentLabel {
            id: row.try_get("id")?,
            barcode_number: row.try_get("barcode_number")?,
            customer_id: row.try_get("customer_id")?,
            international_order_id: row.try_get("international_order_id")?,
            is_printed: row.try_get("is_printed")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

pub fn insert_label(db: &dyn DbExecutor, label: &ShipmentLabel) -> Result<(), DbError> {
    db.execute(
        "INSERT INTO shipment_labels (id, barcode_number, customer_id, international_order_id, \
         is_printed, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7)",
        &[
            &label.id,
            &label.barcode_number,
            &label.customer_id,
            &label.international_order_id,
            &label.is_printed,
            &label.created_at,
            &label.updated_at,
        ],
    )?;
    Ok(())
}

pub fn find_label_by_barcode(
    db: &dyn DbExecutor,
    barcode: &str,
) -> Result<Option<ShipmentLabel>, DbError> {
    db.query_opt(
        "SELECT id, barcode_number, customer_id, international_order_id, is_printed, \
         created_at, updated_at FROM shipment_labels WHERE barcode_number = $1",
        &[&barcode],
    )?
    .map(|row| ShipmentLabel::from_row(&row))
    .transpose()
}

/// Final-mile delivery order.
#[derive(Debug, Clone)]
pub struct DomesticOrder {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub shipping_address: String,
    pub status: DomesticOrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for DomesticOrder {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        let status_raw: String = row.try_get("status")?;
        Ok(DomesticOrder {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            shipping_address: row.try_get("shipping_address")?,
            status: DomesticOrderStatus::from_str(&status_raw)
                .map_err(|e| DbError::Parse(e.to_string()))?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

pub fn insert_domestic(db: &dyn DbExecutor, order: &DomesticOrder) -> Result<(), DbError> {
    db.execute(
        "INSERT INTO domestic_orders (id, customer_id, shipping_address, status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
        &[
            &order.id,
            &order.customer_id,
            &order.shipping_address,
            &order.status.as_str(),
            &order.created_at,
            &order.updated_at,
        ],
    )?;
    Ok(())
}

pub fn list_domestic_for_customer(
    db: &dyn DbExecutor,
    customer_id: Uuid,
) -> Result<Vec<DomesticOrder>, DbError> {
    db.query_all(
        "SELECT id, customer_id, shipping_address, status, created_at, updated_at \
         FROM domestic_orders WHERE customer_id = $1 ORDER BY created_at DESC",
        &[&customer_id],
    )?
    .iter()
    .map(DomesticOrder::from_row)
    .collect()
}

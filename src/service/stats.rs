//! Read/query surface: dashboard counts and the public listings.

use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::DbExecutor;
use crate::domain::{item, locker, shipment, user, warehouse, BoxStatus, ItemFilter};
use crate::service::logistics::{box_json, item_json};
use crate::service::ServiceError;

/// Aggregate dashboard counts.
pub fn dashboard_stats(db: &dyn DbExecutor) -> Result<Value, ServiceError> {
    Ok(json!({
        "total_boxes": shipment::count_all(db)?,
        "boxes_in_transit": shipment::count_by_status(db, BoxStatus::InTransit)?,
        "total_customers": user::count_customers(db)?,
    }))
}

/// Boxes with their warehouse embedded.
pub fn boxes_with_warehouse(db: &dyn DbExecutor) -> Result<Value, ServiceError> {
    let boxes = shipment::list(db, None)?;
    let warehouses: HashMap<Uuid, _> = warehouse::list_all(db)?
        .into_iter()
        .map(|w| (w.id, w))
        .collect();

    Ok(Value::Array(
        boxes
            .iter()
            .map(|b| box_json(b, b.warehouse_id.and_then(|id| warehouses.get(&id))))
            .collect(),
    ))
}

/// Customer accounts with their locker codes.
pub fn customers_overview(db: &dyn DbExecutor) -> Result<Value, ServiceError> {
    let customers = user::list_customers(db)?;
    let mut out = Vec::with_capacity(customers.len());
    for customer in &customers {
        let codes: Vec<String> = locker::list_for_customer(db, customer.id)?
            .into_iter()
            .map(|l| l.code)
            .collect();
        out.push(json!({
            "id": customer.id,
            "username": customer.username,
            "email": customer.email,
            "lockers": codes,
        }));
    }
    Ok(Value::Array(out))
}

/// Item listing for the dashboard.
pub fn items_overview(db: &dyn DbExecutor, filter: &ItemFilter) -> Result<Value, ServiceError> {
    let items = item::list(db, filter)?;
    Ok(Value::Array(items.iter().map(item_json).collect()))
}

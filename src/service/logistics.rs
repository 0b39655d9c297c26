//! Warehouse, item, box, order and request operations.
//!
//! Status writes on items and boxes append to the audit trail in the same
//! call. Box/item linking runs in one transaction so the link row, the item
//! status and the box aggregates move together.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db::{ClientExecutor, DbExecutor};
use crate::domain::{
    item, locker, order, shipment, status_log, warehouse, BoxStatus, DomesticOrderStatus,
    EntityKind, InternationalBox, InternationalOrder, Item, ItemCondition, ItemRequest,
    ItemStatus, RequestStatus, ShipmentLabel, SourceOrderStatus, Warehouse,
};
use crate::service::ServiceError;

#[derive(Debug, Deserialize)]
pub struct CreateWarehouseRequest {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

pub fn create_warehouse(
    db: &dyn DbExecutor,
    req: CreateWarehouseRequest,
) -> Result<Warehouse, ServiceError> {
    if req.name.trim().is_empty() {
        return Err(ServiceError::Validation("name is required".into()));
    }
    if warehouse::find_by_name(db, &req.name)?.is_some() {
        return Err(ServiceError::Conflict("warehouse name already exists".into()));
    }
    let wh = Warehouse::new(req.name, req.address, req.city, req.country);
    warehouse::insert(db, &wh)?;
    Ok(wh)
}

pub fn list_warehouses(db: &dyn DbExecutor) -> Result<Vec<Warehouse>, ServiceError> {
    Ok(warehouse::list_all(db)?)
}

#[derive(Debug, Deserialize)]
pub struct ReceiveItemRequest {
    pub tracking_number: String,
    pub customer_id: Uuid,
    pub locker_id: Uuid,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub country_origin: Option<String>,
    #[serde(default)]
    pub condition: Option<ItemCondition>,
    #[serde(default)]
    pub international_order_id: Option<Uuid>,
}

/// Scan an item into a customer locker.
pub fn receive_item(db: &dyn DbExecutor, req: ReceiveItemRequest) -> Result<Item, ServiceError> {
    if req.tracking_number.trim().is_empty() {
        return Err(ServiceError::Validation("tracking_number is required".into()));
    }
    if item::find_by_tracking_number(db, &req.tracking_number)?.is_some() {
        return Err(ServiceError::Conflict("tracking number already scanned".into()));
    }

    let now = Utc::now();
    let new_item = Item {
        id: Uuid::new_v4(),
        tracking_number: req.tracking_number,
        scanning_date: Some(now),
        weight_kg: req.weight_kg,
        category: req.category,
        quantity: req.quantity.unwrap_or(1),
        country_origin: req.country_origin,
        status: ItemStatus::ArrivedWarehouse,
        condition: req.condition.unwrap_or(ItemCondition::Ok),
        customer_id: req.customer_id,
        locker_id: req.locker_id,
        international_order_id: req.international_order_id,
        created_at: now,
        updated_at: now,
    };
    item::insert(db, &new_item)?;
    Ok(new_item)
}

#[derive(Debug, Deserialize)]
pub struct SetItemStatusRequest {
    pub status: ItemStatus,
    #[serde(default)]
    pub condition: Option<ItemCondition>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Set an item's status and append the audit row.
pub fn set_item_status(
    db: &dyn DbExecutor,
    item_id: Uuid,
    req: SetItemStatusRequest,
    changed_by: Option<Uuid>,
) -> Result<Item, ServiceError> {
    let existing = item::find_by_id(db, item_id)?
        .ok_or_else(|| ServiceError::NotFound("Item not found".into()))?;

    item::update_status(db, existing.id, req.status, req.condition)?;
    status_log::append(
        db,
        EntityKind::Item,
        existing.id,
        req.status.as_str(),
        req.note.as_deref(),
        changed_by,
    )?;

    item::find_by_id(db, item_id)?
        .ok_or_else(|| ServiceError::NotFound("Item not found".into()))
}

#[derive(Debug, Deserialize)]
pub struct CreateBoxRequest {
    pub box_number: String,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub origin_country: Option<String>,
    #[serde(default)]
    pub destination_country: Option<String>,
    #[serde(default)]
    pub warehouse_id: Option<Uuid>,
}

pub fn create_box(
    db: &dyn DbExecutor,
    req: CreateBoxRequest,
) -> Result<InternationalBox, ServiceError> {
    if req.box_number.trim().is_empty() {
        return Err(ServiceError::Validation("box_number is required".into()));
    }
    if let Some(wh_id) = req.warehouse_id {
        if warehouse::find_by_id(db, wh_id)?.is_none() {
            return Err(ServiceError::NotFound("Warehouse not found".into()));
        }
    }

    let now = Utc::now();
    let new_box = InternationalBox {
        id: Uuid::new_v4(),
        box_number: req.box_number,
        tracking_number: req.tracking_number,
        status: BoxStatus::Building,
        origin_country: req.origin_country,
        destination_country: req.destination_country,
        total_weight_kg: 0.0,
        items_count: 0,
        warehouse_id: req.warehouse_id,
        created_at: now,
        updated_at: now,
    };
    shipment::insert(db, &new_box).map_err(|e| {
        if e.is_unique_violation() {
            ServiceError::Conflict("box number or tracking number already exists".into())
        } else {
            e.into()
        }
    })?;
    Ok(new_box)
}

#[derive(Debug, Deserialize)]
pub struct SetBoxStatusRequest {
    pub status: BoxStatus,
    #[serde(default)]
    pub note: Option<String>,
}

/// Set a box's status and append the audit row.
pub fn set_box_status(
    db: &dyn DbExecutor,
    box_id: Uuid,
    req: SetBoxStatusRequest,
    changed_by: Option<Uuid>,
) -> Result<InternationalBox, ServiceError> {
    let existing = shipment::find_by_id(db, box_id)?
        .ok_or_else(|| ServiceError::NotFound("Box not found".into()))?;

    shipment::update_status(db, existing.id, req.status)?;
    status_log::append(
        db,
        EntityKind::Box,
        existing.id,
        req.status.as_str(),
        req.note.as_deref(),
        changed_by,
    )?;

    shipment::find_by_id(db, box_id)?
        .ok_or_else(|| ServiceError::NotFound("Box not found".into()))
}

#[derive(Debug, Deserialize)]
pub struct AddBoxItemRequest {
    pub item_id: Uuid,
    #[serde(default)]
    pub note: Option<String>,
}

/// Link an item into a box.
///
/// One transaction covers the link row, the item's move to `in_box` and the
/// box aggregate refresh.
pub fn add_item_to_box(
    executor: &ClientExecutor,
    box_id: Uuid,
    req: AddBoxItemRequest,
    added_by: Option<Uuid>,
) -> Result<Value, ServiceError> {
    let the_box = shipment::find_by_id(executor, box_id)?
        .ok_or_else(|| ServiceError::NotFound("Box not found".into()))?;
    let the_item = item::find_by_id(executor, req.item_id)?
        .ok_or_else(|| ServiceError::NotFound("Item not found".into()))?;

    let txn = executor.begin()?;
    let link = shipment::BoxItem {
        id: Uuid::new_v4(),
        box_id: the_box.id,
        item_id: the_item.id,
        added_at: Utc::now(),
        added_by,
        note: req.note,
    };
    let outcome = shipment::insert_box_item(&txn, &link)
        .and_then(|_| item::update_status(&txn, the_item.id, ItemStatus::InBox, None))
        .and_then(|_| shipment::refresh_aggregates(&txn, the_box.id));

    match outcome {
        Ok(_) => {
            txn.commit()
                .map_err(|e| ServiceError::Internal(e.to_string()))?;
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback() {
                tracing::warn!("box-item rollback failed: {rollback_err}");
            }
            if e.is_unique_violation() {
                return Err(ServiceError::Conflict("item is already in this box".into()));
            }
            return Err(e.into());
        }
    }

    status_log::append(
        executor,
        EntityKind::Item,
        the_item.id,
        ItemStatus::InBox.as_str(),
        link.note.as_deref(),
        added_by,
    )?;

    Ok(json!({
        "box_id": the_box.id,
        "item_id": the_item.id,
        "added_at": link.added_at,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    pub marketplace: String,
    #[serde(default)]
    pub marketplace_order_ref: Option<String>,
    #[serde(default)]
    pub order_url: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
}

/// Create a marketplace order together with its shipment label.
pub fn create_order(
    db: &dyn DbExecutor,
    req: CreateOrderRequest,
) -> Result<(InternationalOrder, ShipmentLabel), ServiceError> {
    if req.marketplace.trim().is_empty() {
        return Err(ServiceError::Validation("marketplace is required".into()));
    }

    let now = Utc::now();
    let new_order = InternationalOrder {
        id: Uuid::new_v4(),
        customer_id: req.customer_id,
        marketplace: req.marketplace,
        marketplace_order_ref: req.marketplace_order_ref,
        order_url: req.order_url,
        currency: req.currency,
        total_amount: req.total_amount,
        status: SourceOrderStatus::Placed,
        created_at: now,
        updated_at: now,
    };
    order::insert(db, &new_order)?;

    let label = ShipmentLabel {
        id: Uuid::new_v4(),
        barcode_number: format!("SL-{}", new_order.id.simple()),
        customer_id: new_order.customer_id,
        international_order_id: new_order.id,
        is_printed: false,
        created_at: now,
        updated_at: now,
    };
    order::insert_label(db, &label)?;

    Ok((new_order, label))
}

pub fn list_orders(db: &dyn DbExecutor) -> Result<Vec<InternationalOrder>, ServiceError> {
    Ok(order::list_all(db)?)
}

#[derive(Debug, Deserialize)]
pub struct SetOrderStatusRequest {
    pub status: SourceOrderStatus,
}

/// Set a marketplace order's status. Orders are outside the audited entity
/// set, so no StatusLog row is written.
pub fn set_order_status(
    db: &dyn DbExecutor,
    order_id: Uuid,
    req: SetOrderStatusRequest,
) -> Result<InternationalOrder, ServiceError> {
    let updated = order::update_status(db, order_id, req.status)?;
    if updated == 0 {
        return Err(ServiceError::NotFound("Order not found".into()));
    }
    order::find_by_id(db, order_id)?
        .ok_or_else(|| ServiceError::NotFound("Order not found".into()))
}

/// Look up a shipment label by its barcode (the scan-station path).
pub fn find_label(db: &dyn DbExecutor, barcode: &str) -> Result<Value, ServiceError> {
    let label = order::find_label_by_barcode(db, barcode)?
        .ok_or_else(|| ServiceError::NotFound("Label not found".into()))?;
    Ok(json!({
        "id": label.id,
        "barcode_number": label.barcode_number,
        "customer_id": label.customer_id,
        "international_order_id": label.international_order_id,
        "is_printed": label.is_printed,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateRequestRequest {
    pub customer_id: Uuid,
    pub subject: String,
    pub message: String,
    #[serde(default)]
    pub charge: Option<Decimal>,
    #[serde(default)]
    pub item_id: Option<Uuid>,
    #[serde(default)]
    pub box_id: Option<Uuid>,
}

pub fn create_request(
    db: &dyn DbExecutor,
    req: CreateRequestRequest,
) -> Result<ItemRequest, ServiceError> {
    if req.subject.trim().is_empty() {
        return Err(ServiceError::Validation("subject is required".into()));
    }
    if req.message.trim().is_empty() {
        return Err(ServiceError::Validation("message is required".into()));
    }

    let now = Utc::now();
    let new_request = ItemRequest {
        id: Uuid::new_v4(),
        customer_id: req.customer_id,
        subject: req.subject,
        message: req.message,
        charge: req.charge.unwrap_or_default(),
        item_id: req.item_id,
        box_id: req.box_id,
        status: RequestStatus::Open,
        created_at: now,
        updated_at: now,
    };
    item::insert_request(db, &new_request)?;
    Ok(new_request)
}

pub fn list_requests(db: &dyn DbExecutor) -> Result<Vec<ItemRequest>, ServiceError> {
    Ok(item::list_requests(db)?)
}

#[derive(Debug, Deserialize)]
pub struct SetRequestStatusRequest {
    pub status: RequestStatus,
}

pub fn set_request_status(
    db: &dyn DbExecutor,
    request_id: Uuid,
    req: SetRequestStatusRequest,
) -> Result<ItemRequest, ServiceError> {
    let updated = item::update_request_status(db, request_id, req.status)?;
    if updated == 0 {
        return Err(ServiceError::NotFound("Request not found".into()));
    }
    item::find_request_by_id(db, request_id)?
        .ok_or_else(|| ServiceError::NotFound("Request not found".into()))
}

pub fn list_lockers(db: &dyn DbExecutor, customer_id: Option<Uuid>) -> Result<Value, ServiceError> {
    let lockers = match customer_id {
        Some(id) => locker::list_for_customer(db, id)?,
        None => locker::list_all(db)?,
    };
    Ok(Value::Array(lockers.iter().map(locker_json).collect()))
}

pub fn list_status_logs(
    db: &dyn DbExecutor,
    entity_type: EntityKind,
    entity_id: Uuid,
) -> Result<Value, ServiceError> {
    let logs = status_log::list_for_entity(db, entity_type, entity_id)?;
    Ok(Value::Array(
        logs.iter()
            .map(|log| {
                json!({
                    "entity_type": log.entity_type,
                    "entity_id": log.entity_id,
                    "status": log.status,
                    "note": log.note,
                    "changed_by": log.changed_by,
                    "created_at": log.created_at,
                })
            })
            .collect(),
    ))
}

pub fn warehouse_json(wh: &Warehouse) -> Value {
    json!({
        "id": wh.id,
        "name": wh.name,
        "address": wh.address,
        "city": wh.city,
        "country": wh.country,
    })
}

pub fn locker_json(l: &crate::domain::Locker) -> Value {
    json!({
        "id": l.id,
        "code": l.code,
        "description": l.description,
        "customer_id": l.customer_id,
        "warehouse_id": l.warehouse_id,
    })
}

pub fn item_json(i: &Item) -> Value {
    json!({
        "id": i.id,
        "tracking_number": i.tracking_number,
        "scanning_date": i.scanning_date,
        "weight_kg": i.weight_kg,
        "category": i.category,
        "quantity": i.quantity,
        "country_origin": i.country_origin,
        "status": i.status,
        "condition": i.condition,
        "customer_id": i.customer_id,
        "locker_id": i.locker_id,
        "international_order_id": i.international_order_id,
    })
}

pub fn order_json(o: &InternationalOrder) -> Value {
    json!({
        "id": o.id,
        "customer_id": o.customer_id,
        "marketplace": o.marketplace,
        "marketplace_order_ref": o.marketplace_order_ref,
        "order_url": o.order_url,
        "currency": o.currency,
        "total_amount": o.total_amount,
        "status": o.status,
    })
}

pub fn request_json(r: &ItemRequest) -> Value {
    json!({
        "id": r.id,
        "customer_id": r.customer_id,
        "subject": r.subject,
        "message": r.message,
        "charge": r.charge,
        "item_id": r.item_id,
        "box_id": r.box_id,
        "status": r.status,
        "created_at": r.created_at,
    })
}

pub fn box_json(b: &InternationalBox, wh: Option<&Warehouse>) -> Value {
    json!({
        "id": b.id,
        "box_number": b.box_number,
        "tracking_number": b.tracking_number,
        "status": b.status,
        "origin_country": b.origin_country,
        "destination_country": b.destination_country,
        "total_weight_kg": b.total_weight_kg,
        "items_count": b.items_count,
        "warehouse": wh.map(|w| json!({ "name": w.name, "country": w.country })),
    })
}

/// Contents of a box, as link rows.
pub fn list_box_contents(db: &dyn DbExecutor, box_id: Uuid) -> Result<Value, ServiceError> {
    if shipment::find_by_id(db, box_id)?.is_none() {
        return Err(ServiceError::NotFound("Box not found".into()));
    }
    let links = shipment::list_box_items(db, box_id)?;
    Ok(Value::Array(
        links
            .iter()
            .map(|link| {
                json!({
                    "item_id": link.item_id,
                    "added_at": link.added_at,
                    "added_by": link.added_by,
                    "note": link.note,
                })
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct CreateDomesticOrderRequest {
    pub customer_id: Uuid,
    pub shipping_address: String,
}

pub fn create_domestic_order(
    db: &dyn DbExecutor,
    req: CreateDomesticOrderRequest,
) -> Result<crate::domain::DomesticOrder, ServiceError> {
    if req.shipping_address.trim().is_empty() {
        return Err(ServiceError::Validation("shipping_address is required".into()));
    }
    let now = Utc::now();
    let new_order = crate::domain::DomesticOrder {
        id: Uuid::new_v4(),
        customer_id: req.customer_id,
        shipping_address: req.shipping_address,
        status: DomesticOrderStatus::Cart,
        created_at: now,
        updated_at: now,
    };
    order::insert_domestic(db, &new_order)?;
    Ok(new_order)
}

pub fn list_domestic_orders(db: &dyn DbExecutor, customer_id: Uuid) -> Result<Value, ServiceError> {
    let orders = order::list_domestic_for_customer(db, customer_id)?;
    Ok(Value::Array(orders.iter().map(domestic_order_json).collect()))
}

pub fn domestic_order_json(o: &crate::domain::DomesticOrder) -> Value {
    json!({
        "id": o.id,
        "customer_id": o.customer_id,
        "shipping_address": o.shipping_address,
        "status": o.status,
        "created_at": o.created_at,
    })
}

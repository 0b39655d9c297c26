//! Compiled-in migration registry.

use sea_query::{ColumnDef, Table};

use super::{Migration, SchemaManager};
use crate::db::DbError;

/// All migrations, oldest first.
pub fn registry() -> Vec<Box<dyn Migration>> {
    vec![
        Box::new(CreateCoreTables),
        Box::new(CreateRevokedTokens),
    ]
}

/// Initial schema: accounts, logistics entities and the audit trail.
struct CreateCoreTables;

impl Migration for CreateCoreTables {
    fn name(&self) -> &str {
        "create_core_tables"
    }

    fn version(&self) -> i64 {
        20250301120000
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), DbError> {
        manager.create_table(
            Table::create()
                .table("users")
                .if_not_exists()
                .col(ColumnDef::new("id").uuid().not_null().primary_key())
                .col(ColumnDef::new("username").string_len(150).not_null().unique_key())
                .col(ColumnDef::new("email").string_len(255).not_null().unique_key())
                .col(ColumnDef::new("password_hash").text().not_null())
                .col(ColumnDef::new("first_name").string_len(150).not_null())
                .col(ColumnDef::new("last_name").string_len(150).not_null())
                .col(ColumnDef::new("role").string_len(20).not_null())
                .col(ColumnDef::new("is_superuser").boolean().not_null())
                .col(ColumnDef::new("is_staff").boolean().not_null())
                .col(ColumnDef::new("is_active").boolean().not_null())
                .col(ColumnDef::new("phone").string_len(50).null())
                .col(ColumnDef::new("country").string_len(100).null())
                .col(ColumnDef::new("city").string_len(100).null())
                .col(ColumnDef::new("address").text().null())
                .col(ColumnDef::new("email_notifications").boolean().not_null())
                .col(ColumnDef::new("sms_notifications").boolean().not_null())
                .col(ColumnDef::new("timezone").string_len(64).null())
                .col(ColumnDef::new("created_at").timestamp_with_time_zone().not_null())
                .col(ColumnDef::new("updated_at").timestamp_with_time_zone().not_null())
                .to_owned(),
        )?;

        manager.create_table(
            Table::create()
                .table("warehouses")
                .if_not_exists()
                .col(ColumnDef::new("id").uuid().not_null().primary_key())
                .col(ColumnDef::new("name").string_len(255).not_null().unique_key())
                .col(ColumnDef::new("address").text().null())
                .col(ColumnDef::new("city").string_len(100).null())
                .col(ColumnDef::new("country").string_len(100).null())
                .col(ColumnDef::new("created_at").timestamp_with_time_zone().not_null())
                .col(ColumnDef::new("updated_at").timestamp_with_time_zone().not_null())
                .to_owned(),
        )?;

        manager.create_table(
            Table::create()
                .table("lockers")
                .if_not_exists()
                .col(ColumnDef::new("id").uuid().not_null().primary_key())
                .col(ColumnDef::new("code").string_len(50).not_null().unique_key())
                .col(ColumnDef::new("description").text().null())
                .col(ColumnDef::new("customer_id").uuid().not_null())
                .col(ColumnDef::new("warehouse_id").uuid().not_null())
                .col(ColumnDef::new("created_at").timestamp_with_time_zone().not_null())
                .col(ColumnDef::new("updated_at").timestamp_with_time_zone().not_null())
                .to_owned(),
        )?;
        manager.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_lockers_customer_warehouse \
             ON lockers (customer_id, warehouse_id)",
        )?;

        manager.create_table(
            Table::create()
                .table("international_orders")
                .if_not_exists()
                .col(ColumnDef::new("id").uuid().not_null().primary_key())
                .col(ColumnDef::new("customer_id").uuid().not_null())
                .col(ColumnDef::new("marketplace").string_len(50).not_null())
                .col(ColumnDef::new("marketplace_order_ref").string_len(100).null())
                .col(ColumnDef::new("order_url").text().null())
                .col(ColumnDef::new("currency").string_len(10).null())
                .col(ColumnDef::new("total_amount").decimal_len(10, 2).null())
                .col(ColumnDef::new("status").string_len(20).not_null())
                .col(ColumnDef::new("created_at").timestamp_with_time_zone().not_null())
                .col(ColumnDef::new("updated_at").timestamp_with_time_zone().not_null())
                .to_owned(),
        )?;
        manager.execute(
            "CREATE INDEX IF NOT EXISTS idx_international_orders_customer_status \
             ON international_orders (customer_id, status)",
        )?;
        manager.execute(
            "CREATE INDEX IF NOT EXISTS idx_international_orders_marketplace_ref \
             ON international_orders (marketplace, marketplace_order_ref)",
        )?;

        manager.create_table(
            Table::create()
                .table("shipment_labels")
                .if_not_exists()
                .col(ColumnDef::new("id").uuid().not_null().primary_key())
                .col(ColumnDef::new("barcode_number").string_len(100).not_null().unique_key())
                .col(ColumnDef::new("customer_id").uuid().not_null())
                .col(ColumnDef::new("international_order_id").uuid().not_null().unique_key())
                .col(ColumnDef::new("is_printed").boolean().not_null())
                .col(ColumnDef::new("created_at").timestamp_with_time_zone().not_null())
                .col(ColumnDef::new("updated_at").timestamp_with_time_zone().not_null())
                .to_owned(),
        )?;

        manager.create_table(
            Table::create()
                .table("items")
                .if_not_exists()
                .col(ColumnDef::new("id").uuid().not_null().primary_key())
                .col(ColumnDef::new("tracking_number").string_len(255).not_null().unique_key())
                .col(ColumnDef::new("scanning_date").timestamp_with_time_zone().null())
                .col(ColumnDef::new("weight_kg").double().null())
                .col(ColumnDef::new("category").string_len(100).null())
                .col(ColumnDef::new("quantity").integer().not_null())
                .col(ColumnDef::new("country_origin").string_len(100).null())
                .col(ColumnDef::new("status").string_len(30).not_null())
                .col(ColumnDef::new("condition").string_len(20).not_null())
                .col(ColumnDef::new("customer_id").uuid().not_null())
                .col(ColumnDef::new("locker_id").uuid().not_null())
                .col(ColumnDef::new("international_order_id").uuid().null())
                .col(ColumnDef::new("created_at").timestamp_with_time_zone().not_null())
                .col(ColumnDef::new("updated_at").timestamp_with_time_zone().not_null())
                .to_owned(),
        )?;
        manager.execute(
            "CREATE INDEX IF NOT EXISTS idx_items_customer_status ON items (customer_id, status)",
        )?;

        manager.create_table(
            Table::create()
                .table("international_boxes")
                .if_not_exists()
                .col(ColumnDef::new("id").uuid().not_null().primary_key())
                .col(ColumnDef::new("box_number").string_len(100).not_null().unique_key())
                .col(ColumnDef::new("tracking_number").string_len(255).null().unique_key())
                .col(ColumnDef::new("status").string_len(20).not_null())
                .col(ColumnDef::new("origin_country").string_len(100).null())
                .col(ColumnDef::new("destination_country").string_len(100).null())
                .col(ColumnDef::new("total_weight_kg").double().not_null())
                .col(ColumnDef::new("items_count").integer().not_null())
                .col(ColumnDef::new("warehouse_id").uuid().null())
                .col(ColumnDef::new("created_at").timestamp_with_time_zone().not_null())
                .col(ColumnDef::new("updated_at").timestamp_with_time_zone().not_null())
                .to_owned(),
        )?;

        manager.create_table(
            Table::create()
                .table("box_items")
                .if_not_exists()
                .col(ColumnDef::new("id").uuid().not_null().primary_key())
                .col(ColumnDef::new("box_id").uuid().not_null())
                .col(ColumnDef::new("item_id").uuid().not_null())
                .col(ColumnDef::new("added_at").timestamp_with_time_zone().not_null())
                .col(ColumnDef::new("added_by").uuid().null())
                .col(ColumnDef::new("note").text().null())
                .to_owned(),
        )?;
        manager.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS uq_box_items_box_item ON box_items (box_id, item_id)",
        )?;

        manager.create_table(
            Table::create()
                .table("domestic_orders")
                .if_not_exists()
                .col(ColumnDef::new("id").uuid().not_null().primary_key())
                .col(ColumnDef::new("customer_id").uuid().not_null())
                .col(ColumnDef::new("shipping_address").text().not_null())
                .col(ColumnDef::new("status").string_len(20).not_null())
                .col(ColumnDef::new("created_at").timestamp_with_time_zone().not_null())
                .col(ColumnDef::new("updated_at").timestamp_with_time_zone().not_null())
                .to_owned(),
        )?;

        manager.create_table(
            Table::create()
                .table("item_requests")
                .if_not_exists()
                .col(ColumnDef::new("id").uuid().not_null().primary_key())
                .col(ColumnDef::new("customer_id").uuid().not_null())
                .col(ColumnDef::new("subject").string_len(255).not_null())
                .col(ColumnDef::new("message").text().not_null())
                .col(ColumnDef::new("charge").decimal_len(10, 2).not_null())
                .col(ColumnDef::new("item_id").uuid().null())
                .col(ColumnDef::new("box_id").uuid().null())
                .col(ColumnDef::new("status").string_len(20).not_null())
                .col(ColumnDef::new("created_at").timestamp_with_time_zone().not_null())
                .col(ColumnDef::new("updated_at").timestamp_with_time_zone().not_null())
                .to_owned(),
        )?;

        manager.create_table(
            Table::create()
                .table("status_logs")
                .if_not_exists()
                .col(ColumnDef::new("id").uuid().not_null().primary_key())
                .col(ColumnDef::new("entity_type").string_len(20).not_null())
                .col(ColumnDef::new("entity_id").uuid().not_null())
                .col(ColumnDef::new("status").string_len(50).not_null())
                .col(ColumnDef::new("note").text().null())
                .col(ColumnDef::new("changed_by").uuid().null())
                .col(ColumnDef::new("created_at").timestamp_with_time_zone().not_null())
                .to_owned(),
        )?;
        manager.execute(
            "CREATE INDEX IF NOT EXISTS idx_status_logs_entity \
             ON status_logs (entity_type, entity_id, created_at)",
        )?;

        Ok(())
    }
}

/// Refresh-token revocation list.
struct CreateRevokedTokens;

impl Migration for CreateRevokedTokens {
    fn name(&self) -> &str {
        "create_revoked_tokens"
    }

    fn version(&self) -> i64 {
        20250301120100
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), DbError> {
        manager.create_table(
            Table::create()
                .table("revoked_tokens")
                .if_not_exists()
                .col(ColumnDef::new("digest").string_len(64).not_null().primary_key())
                .col(ColumnDef::new("jti").string_len(64).not_null())
                .col(ColumnDef::new("user_id").uuid().null())
                .col(ColumnDef::new("revoked_at").timestamp_with_time_zone().not_null())
                .to_owned(),
        )
    }
}

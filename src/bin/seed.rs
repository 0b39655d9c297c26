//! `cartage-seed`: populate the development database with demo data.
//!
//! `cartage-seed` creates warehouses, staff accounts, sample customers (which
//! exercises locker provisioning) and a set of boxes. `cartage-seed --clear`
//! instead deletes seeded data — development only, never run it against
//! production data.

use chrono::Utc;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;

use cartage::auth::password;
use cartage::db::{ClientExecutor, DbExecutor};
use cartage::domain::{shipment, user, warehouse, BoxStatus, InternationalBox, UserRole, Warehouse};
use cartage::schema::run_startup_migrations;
use cartage::service::accounts::{self, CreateUserRequest};
use cartage::AppConfig;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cfg = AppConfig::load()?;
    let client = cartage::connect(&cfg.database.url)?;
    let executor = ClientExecutor::new(client);
    run_startup_migrations(&executor)?;

    if std::env::args().any(|a| a == "--clear") {
        clear_data(&executor)?;
        println!("Cleared all data!");
        return Ok(());
    }

    println!("Creating fresh seed data...");
    seed_warehouses(&executor)?;
    seed_staff(&executor)?;
    let customers = seed_customers(&executor)?;
    seed_boxes(&executor)?;
    println!(
        "Successfully created fresh seed data! ({} new customer(s))",
        customers
    );
    Ok(())
}

fn seed_warehouses(db: &dyn DbExecutor) -> Result<(), Box<dyn std::error::Error>> {
    let wanted = [
        ("Cartage UAE Warehouse", Some("Dubai"), Some("UAE")),
        ("Egypt Warehouse", None, Some("Egypt")),
    ];
    for (name, city, country) in wanted {
        if warehouse::find_by_name(db, name)?.is_none() {
            let wh = Warehouse::new(
                name.to_string(),
                None,
                city.map(str::to_string),
                country.map(str::to_string),
            );
            warehouse::insert(db, &wh)?;
            println!("Created warehouse: {name}");
        }
    }
    Ok(())
}

/// Staff accounts with fixed credentials for local dashboards.
fn seed_staff(db: &dyn DbExecutor) -> Result<(), Box<dyn std::error::Error>> {
    let staff = [
        ("admin", "admin@cartage.local", UserRole::SuperAdmin, true),
        ("superadmin", "superadmin@cartage.local", UserRole::SuperAdmin, false),
        ("admin1", "admin1@cartage.local", UserRole::Admin, false),
        ("employee1", "employee1@cartage.local", UserRole::Employee, false),
    ];
    for (username, email, role, superuser) in staff {
        if user::find_by_username(db, username)?.is_some() {
            continue;
        }
        let now = Utc::now();
        let account = cartage::domain::User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password::hash_password("password123")?,
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            role,
            is_superuser: superuser,
            is_staff: true,
            is_active: true,
            phone: Some(PhoneNumber().fake()),
            country: Some("UAE".to_string()),
            city: Some("Dubai".to_string()),
            address: None,
            email_notifications: true,
            sms_notifications: false,
            timezone: None,
            created_at: now,
            updated_at: now,
        };
        user::insert(db, &account)?;
        println!("Created staff account: {username}");
    }
    Ok(())
}

/// Sample customers. Going through the account service exercises the locker
/// provisioning hook against the seeded warehouses.
fn seed_customers(executor: &ClientExecutor) -> Result<usize, Box<dyn std::error::Error>> {
    let mut created = 0;
    for i in 1..=5 {
        let username = format!("customer{i}");
        if user::find_by_username(executor, &username)?.is_some() {
            continue;
        }
        let (account, lockers) = accounts::create_user(
            executor,
            CreateUserRequest {
                username: username.clone(),
                email: format!("{username}@example.com"),
                password: "pass123".to_string(),
                first_name: Some(FirstName().fake()),
                last_name: Some(LastName().fake()),
                role: None,
                phone: Some(PhoneNumber().fake()),
                country: Some("Egypt".to_string()),
                city: Some("Cairo".to_string()),
                address: None,
            },
        )?;
        println!(
            "Created customer: {} with {} locker(s)",
            account.username,
            lockers.len()
        );
        created += 1;
    }
    Ok(created)
}

fn seed_boxes(db: &dyn DbExecutor) -> Result<(), Box<dyn std::error::Error>> {
    let uae = warehouse::find_by_name(db, "Cartage UAE Warehouse")?;
    let statuses = [
        BoxStatus::Building,
        BoxStatus::ReadyToShip,
        BoxStatus::Shipped,
        BoxStatus::InTransit,
    ];
    let mut rng = rand::thread_rng();

    for i in 1..=10 {
        let box_number = format!("BOX-{i:03}");
        let exists: bool = db
            .query_one(
                "SELECT EXISTS(SELECT 1 FROM international_boxes WHERE box_number = $1)",
                &[&box_number],
            )?
            .get(0);
        if exists {
            continue;
        }
        let now = Utc::now();
        let sample = InternationalBox {
            id: Uuid::new_v4(),
            box_number: box_number.clone(),
            tracking_number: Some(format!("CTG-TRK-{i:05}")),
            status: *statuses.choose(&mut rng).unwrap_or(&BoxStatus::Building),
            origin_country: Some("UAE".to_string()),
            destination_country: Some("Egypt".to_string()),
            total_weight_kg: rng.gen_range(5.0..30.0),
            items_count: rng.gen_range(3..15),
            warehouse_id: uae.as_ref().map(|w| w.id),
            created_at: now,
            updated_at: now,
        };
        shipment::insert(db, &sample)?;
        println!("Created box: {box_number}");
    }
    Ok(())
}

/// Destructive: deletes everything except the `admin` account.
fn clear_data(db: &dyn DbExecutor) -> Result<(), Box<dyn std::error::Error>> {
    let statements = [
        "DELETE FROM box_items",
        "DELETE FROM status_logs",
        "DELETE FROM items",
        "DELETE FROM international_boxes",
        "DELETE FROM shipment_labels",
        "DELETE FROM international_orders",
        "DELETE FROM item_requests",
        "DELETE FROM domestic_orders",
        "DELETE FROM lockers",
        "DELETE FROM revoked_tokens",
        "DELETE FROM users WHERE username <> 'admin'",
        "DELETE FROM warehouses",
    ];
    for sql in statements {
        db.execute(sql, &[])?;
    }
    Ok(())
}

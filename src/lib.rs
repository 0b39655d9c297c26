//! # Cartage
//!
//! Coroutine-native logistics and package-forwarding back end on the `may`
//! runtime: warehouses, customer lockers, items, international boxes and
//! shipment tracking, behind a JSON/REST surface with JWT sessions.

pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod http;
pub mod metrics;
pub mod provision;
pub mod schema;
pub mod service;

pub use config::AppConfig;
pub use db::{connect, ClientExecutor, DbError, DbExecutor, FromRow, Transaction};
pub use service::ServiceError;

//! Domain records and their repositories.
//!
//! Each module pairs a record struct ([`crate::db::FromRow`]) with the
//! repository functions that read and write it through a
//! [`crate::db::DbExecutor`].

pub mod enums;
pub mod item;
pub mod locker;
pub mod order;
pub mod shipment;
pub mod status_log;
pub mod user;
pub mod warehouse;

pub use enums::{
    BoxStatus, DomesticOrderStatus, EntityKind, InvalidEnumValue, ItemCondition, ItemStatus,
    RequestStatus, SourceOrderStatus, UserRole,
};
pub use item::{Item, ItemFilter, ItemRequest};
pub use locker::Locker;
pub use order::{DomesticOrder, InternationalOrder, ShipmentLabel};
pub use shipment::{BoxItem, InternationalBox};
pub use status_log::StatusLog;
pub use user::User;
pub use warehouse::Warehouse;

//! Closed status sets shared by the domain records and the audit trail.
//!
//! Every set maps to the lowercase wire/database token via `as_str` and back
//! via `FromStr`. No transition table is enforced: any status in a set may be
//! written over any other.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error for strings outside a closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEnumValue {
    pub set: &'static str,
    pub value: String,
}

impl fmt::Display for InvalidEnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} value: {:?}", self.set, self.value)
    }
}

impl std::error::Error for InvalidEnumValue {}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }
        }

        impl FromStr for $name {
            type Err = InvalidEnumValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok($name::$variant),)+
                    other => Err(InvalidEnumValue {
                        set: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// Account roles. The stored value is the base role; effective role is
    /// derived from the privilege flags at read time.
    UserRole {
        SuperAdmin => "super_admin",
        Admin => "admin",
        Employee => "employee",
        Customer => "customer",
    }
}

string_enum! {
    /// Lifecycle of a physical item from marketplace to doorstep.
    ItemStatus {
        AwaitingArrival => "awaiting_arrival",
        ArrivedWarehouse => "arrived_warehouse",
        Validated => "validated",
        InBox => "in_box",
        Shipped => "shipped",
        InTransit => "in_transit",
        ArrivedDestinationWarehouse => "arrived_destination_warehouse",
        AtCustoms => "at_customs",
        ReleasedCustoms => "released_customs",
        OutForDelivery => "out_for_delivery",
        Delivered => "delivered",
        Returned => "returned",
        Refunded => "refunded",
        Mismatched => "mismatched",
    }
}

string_enum! {
    /// Lifecycle of an international shipping box.
    BoxStatus {
        Building => "building",
        ReadyToShip => "ready_to_ship",
        Shipped => "shipped",
        InTransit => "in_transit",
        Arrived => "arrived",
        AtCustoms => "at_customs",
        ReleasedCustoms => "released_customs",
        OutForDelivery => "out_for_delivery",
        Delivered => "delivered",
        Returned => "returned",
        Refunded => "refunded",
    }
}

string_enum! {
    /// External marketplace order states.
    SourceOrderStatus {
        Placed => "placed",
        ShippedToWarehouse => "shipped_to_warehouse",
        ArrivedWarehouse => "arrived_warehouse",
        Cancelled => "cancelled",
        Refunded => "refunded",
    }
}

string_enum! {
    /// Final-mile domestic order states.
    DomesticOrderStatus {
        Cart => "cart",
        Placed => "placed",
        OutForDelivery => "out_for_delivery",
        Delivered => "delivered",
    }
}

string_enum! {
    /// Customer-service request states.
    RequestStatus {
        Open => "open",
        InProgress => "in_progress",
        Resolved => "resolved",
        Closed => "closed",
    }
}

string_enum! {
    /// Physical condition recorded when an item is scanned.
    ItemCondition {
        Ok => "ok",
        Damaged => "damaged",
        Mismatched => "mismatched",
    }
}

string_enum! {
    /// Entity tag for audit-log rows.
    EntityKind {
        Item => "item",
        Box => "box",
        ShipmentDestination => "shipment_destination",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_sets() {
        for v in UserRole::ALL {
            assert_eq!(UserRole::from_str(v.as_str()).unwrap(), *v);
        }
        for v in ItemStatus::ALL {
            assert_eq!(ItemStatus::from_str(v.as_str()).unwrap(), *v);
        }
        for v in BoxStatus::ALL {
            assert_eq!(BoxStatus::from_str(v.as_str()).unwrap(), *v);
        }
        for v in SourceOrderStatus::ALL {
            assert_eq!(SourceOrderStatus::from_str(v.as_str()).unwrap(), *v);
        }
        for v in DomesticOrderStatus::ALL {
            assert_eq!(DomesticOrderStatus::from_str(v.as_str()).unwrap(), *v);
        }
        for v in RequestStatus::ALL {
            assert_eq!(RequestStatus::from_str(v.as_str()).unwrap(), *v);
        }
        for v in ItemCondition::ALL {
            assert_eq!(ItemCondition::from_str(v.as_str()).unwrap(), *v);
        }
        for v in EntityKind::ALL {
            assert_eq!(EntityKind::from_str(v.as_str()).unwrap(), *v);
        }
    }

    #[test]
    fn test_rejects_values_outside_closed_set() {
        assert!(ItemStatus::from_str("teleported").is_err());
        assert!(BoxStatus::from_str("BUILDING").is_err(), "tokens are lowercase");
        assert!(UserRole::from_str("").is_err());
        let err = RequestStatus::from_str("done").unwrap_err();
        assert!(err.to_string().contains("RequestStatus"));
    }

    #[test]
    fn test_serde_uses_snake_case_tokens() {
        let s = serde_json::to_string(&ItemStatus::ArrivedDestinationWarehouse).unwrap();
        assert_eq!(s, "\"arrived_destination_warehouse\"");
        let back: BoxStatus = serde_json::from_str("\"ready_to_ship\"").unwrap();
        assert_eq!(back, BoxStatus::ReadyToShip);
    }

    #[test]
    fn test_item_status_set_size() {
        assert_eq!(ItemStatus::ALL.len(), 14);
        assert_eq!(BoxStatus::ALL.len(), 11);
    }
}

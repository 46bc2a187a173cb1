//! # Domain Identity Newtypes
//!
//! Newtype wrappers for all domain identifiers in the marketplace back end.
//! These prevent accidental identifier confusion — you cannot pass a
//! `PartnerId` where a `BookingId` is expected.
//!
//! Internal identifiers (`BookingId`, `CustomerId`, `PartnerId`,
//! `WalletTxnId`) are random UUIDs minted by this service. Gateway-assigned
//! identifiers (`IntentId`, `RefundId`) are opaque strings issued by the
//! external payment gateway and are validated to be non-empty on
//! construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Unique identifier for a booking (one customer service request).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(pub Uuid);

/// Unique identifier for a customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub Uuid);

/// Unique identifier for a field partner (the karigar doing the work).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartnerId(pub Uuid);

/// Unique identifier for a wallet transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletTxnId(pub Uuid);

macro_rules! impl_uuid_id {
    ($ty:ident, $prefix:literal) => {
        impl $ty {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

impl_uuid_id!(BookingId, "booking");
impl_uuid_id!(CustomerId, "customer");
impl_uuid_id!(PartnerId, "partner");
impl_uuid_id!(WalletTxnId, "wtxn");

/// Gateway-assigned identifier for a payment order / intent.
///
/// Issued by the external payment gateway when an order is created
/// (e.g., `order_NQz3x…`). Opaque to this service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntentId(String);

/// Gateway-assigned identifier for a refund.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefundId(String);

macro_rules! impl_gateway_id {
    ($ty:ident, $label:literal) => {
        impl $ty {
            /// Wrap a gateway-assigned identifier, rejecting empty input.
            pub fn new(raw: impl Into<String>) -> Result<Self, CoreError> {
                let raw = raw.into();
                if raw.trim().is_empty() {
                    return Err(CoreError::Validation(format!(
                        concat!($label, " identifier must be non-empty, got {:?}"),
                        raw
                    )));
                }
                Ok(Self(raw))
            }

            /// The raw gateway-side identifier string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

impl_gateway_id!(IntentId, "intent");
impl_gateway_id!(RefundId, "refund");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_distinct_per_call() {
        assert_ne!(BookingId::new(), BookingId::new());
        assert_ne!(PartnerId::new(), PartnerId::new());
    }

    #[test]
    fn display_carries_namespace_prefix() {
        let id = BookingId::new();
        assert!(id.to_string().starts_with("booking:"));
        let id = WalletTxnId::new();
        assert!(id.to_string().starts_with("wtxn:"));
    }

    #[test]
    fn intent_id_rejects_empty() {
        assert!(IntentId::new("").is_err());
        assert!(IntentId::new("   ").is_err());
        assert!(IntentId::new("order_abc123").is_ok());
    }

    #[test]
    fn refund_id_roundtrips_serde() {
        let id = RefundId::new("rfnd_42").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"rfnd_42\"");
        let parsed: RefundId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}

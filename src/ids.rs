//! Newtype identifiers for every persisted entity.
//!
//! Every id wraps a `Uuid` and round-trips through Postgres as the native
//! `uuid` type and through JSON as a string. Keeping one macro-generated
//! family avoids the parameter-order mistakes that plain `Uuid` arguments
//! invite (e.g. swapping `order_id` and `payment_id` in a call).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(u: Uuid) -> Self {
                Self(u)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> <sqlx::Postgres as sqlx::Database>::TypeInfo {
                <Uuid as sqlx::Type<sqlx::Postgres>>::type_info()
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as sqlx::Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
                <Uuid as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as sqlx::Database>::ValueRef<'r>,
            ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
                Ok(Self(<Uuid as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
            }
        }
    };
}

entity_id!(TenantId);
entity_id!(UserId);
entity_id!(TableId);
entity_id!(TableSessionId);
entity_id!(DraftOrderId);
entity_id!(DraftLineItemId);
entity_id!(OrderId);
entity_id!(OrderLineItemId);
entity_id!(MenuItemId);
entity_id!(MenuStationId);
entity_id!(KitchenCourseId);
entity_id!(TicketId);
entity_id!(TicketLineItemId);
entity_id!(PaymentIntentId);
entity_id!(PaymentId);
entity_id!(RefundId);
entity_id!(ShiftId);
entity_id!(CashDrawerEventId);
entity_id!(OrderAdjustmentId);
entity_id!(LocationId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_roundtrip_through_uuid() {
        let id = DraftOrderId::new();
        let raw: Uuid = id.into();
        assert_eq!(DraftOrderId::from(raw), id);
    }

    #[test]
    fn ids_display_as_plain_uuid_string() {
        let raw = Uuid::nil();
        let id = OrderId::from(raw);
        assert_eq!(id.to_string(), raw.to_string());
    }
}

//! Wire format for the live push channel and the event→subject routing
//! table.

use crate::events::DomainEvent;
use crate::ids::{MenuStationId, TableSessionId, UserId};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct PushFrame {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub timestamp: chrono::DateTime<Utc>,
    #[serde(flatten)]
    pub payload: Value,
}

/// Which subject set an event fans out to.
pub enum Subject {
    Table(TableSessionId),
    Station(MenuStationId),
    User(UserId),
}

impl DomainEvent {
    /// Resolve the subject this event routes to, or `None` if the event
    /// carries no subject-scoping id the hub can key on (should not occur
    /// for any variant in the closed set, but keeps routing total rather
    /// than panicking on an unmatched arm).
    pub fn subject(&self) -> Option<Subject> {
        use DomainEvent::*;
        Some(match self {
            DraftCreated { table_session_id, .. }
            | DraftSubmitted { table_session_id, .. }
            | DraftAcquired { table_session_id, .. }
            | DraftConfirmed { table_session_id, .. }
            | DraftRejected { table_session_id, .. } => Subject::Table(*table_session_id),
            DraftReassigned { new_session, .. } => Subject::Table(*new_session),

            TicketCreated { station_id, .. }
            | TicketUpdated { station_id, .. }
            | TicketBumped { station_id, .. }
            | TicketHeld { station_id, .. }
            | TicketFired { station_id, .. }
            | TicketVoided { station_id, .. } => Subject::Station(*station_id),

            OrderCreated { table_session_id, .. }
            | OrderUpdated { table_session_id, .. }
            | OrderInProgress { table_session_id, .. }
            | OrderPaid { table_session_id, .. }
            | OrderCompleted { table_session_id, .. }
            | OrderCancelled { table_session_id, .. } => Subject::Table(*table_session_id),

            PaymentCreated { table_session_id, .. }
            | PaymentCompleted { table_session_id, .. }
            | PaymentFailed { table_session_id, .. } => Subject::Table(*table_session_id),
            RefundCreated { table_session_id, .. } => Subject::Table(*table_session_id),

            ShiftOpened { server_id, .. }
            | ShiftClosed { server_id, .. }
            | ShiftReconciled { server_id, .. } => Subject::User(*server_id),
        })
    }

    pub fn to_frame(&self) -> PushFrame {
        let payload = serde_json::to_value(EventPayload(self)).unwrap_or(Value::Null);
        PushFrame {
            frame_type: self.type_name(),
            timestamp: self.occurred_at(),
            payload,
        }
    }
}

/// Serializes just the event's own fields (no `type`/`timestamp`, those
/// are added by `PushFrame`) by delegating to serde's derive on a mirrored
/// shape. Implemented by hand rather than deriving `Serialize` directly on
/// `DomainEvent` so the frame's top-level keys stay exactly `type`,
/// `timestamp`, plus payload fields.
struct EventPayload<'a>(&'a DomainEvent);

impl Serialize for EventPayload<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        use DomainEvent::*;
        let mut map = serializer.serialize_map(None)?;
        match self.0 {
            DraftCreated { draft_id, table_session_id }
            | DraftSubmitted { draft_id, table_session_id }
            | DraftAcquired { draft_id, table_session_id, .. } => {
                map.serialize_entry("draft_id", draft_id)?;
                map.serialize_entry("table_session_id", table_session_id)?;
            }
            DraftConfirmed { draft_id, table_session_id, order_id, total } => {
                map.serialize_entry("draft_id", draft_id)?;
                map.serialize_entry("table_session_id", table_session_id)?;
                map.serialize_entry("order_id", order_id)?;
                map.serialize_entry("total", total)?;
            }
            DraftRejected { draft_id, table_session_id, reason } => {
                map.serialize_entry("draft_id", draft_id)?;
                map.serialize_entry("table_session_id", table_session_id)?;
                map.serialize_entry("reason", reason)?;
            }
            DraftReassigned { draft_id, old_session, new_session } => {
                map.serialize_entry("draft_id", draft_id)?;
                map.serialize_entry("old_session", old_session)?;
                map.serialize_entry("new_session", new_session)?;
            }
            TicketCreated { ticket_id, station_id }
            | TicketUpdated { ticket_id, station_id }
            | TicketBumped { ticket_id, station_id }
            | TicketHeld { ticket_id, station_id }
            | TicketFired { ticket_id, station_id }
            | TicketVoided { ticket_id, station_id } => {
                map.serialize_entry("ticket_id", ticket_id)?;
                map.serialize_entry("station_id", station_id)?;
            }
            OrderCreated { order_id, table_session_id }
            | OrderUpdated { order_id, table_session_id }
            | OrderInProgress { order_id, table_session_id }
            | OrderPaid { order_id, table_session_id }
            | OrderCompleted { order_id, table_session_id }
            | OrderCancelled { order_id, table_session_id } => {
                map.serialize_entry("order_id", order_id)?;
                map.serialize_entry("table_session_id", table_session_id)?;
            }
            PaymentCreated { payment_id, order_id, table_session_id } => {
                map.serialize_entry("payment_id", payment_id)?;
                map.serialize_entry("order_id", order_id)?;
                map.serialize_entry("table_session_id", table_session_id)?;
            }
            PaymentCompleted { payment_id, order_id, table_session_id, amount } => {
                map.serialize_entry("payment_id", payment_id)?;
                map.serialize_entry("order_id", order_id)?;
                map.serialize_entry("table_session_id", table_session_id)?;
                map.serialize_entry("amount", amount)?;
            }
            PaymentFailed { payment_id, order_id, table_session_id } => {
                map.serialize_entry("payment_id", payment_id)?;
                map.serialize_entry("order_id", order_id)?;
                map.serialize_entry("table_session_id", table_session_id)?;
            }
            RefundCreated { refund_id, order_id, table_session_id } => {
                map.serialize_entry("refund_id", refund_id)?;
                map.serialize_entry("order_id", order_id)?;
                map.serialize_entry("table_session_id", table_session_id)?;
            }
            ShiftOpened { shift_id, server_id }
            | ShiftClosed { shift_id, server_id }
            | ShiftReconciled { shift_id, server_id } => {
                map.serialize_entry("shift_id", shift_id)?;
                map.serialize_entry("server_id", server_id)?;
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{DraftOrderId, TableSessionId};

    #[test]
    fn frame_serializes_type_and_timestamp_at_top_level() {
        let event = DomainEvent::DraftCreated {
            draft_id: DraftOrderId::new(),
            table_session_id: TableSessionId::new(),
        };
        let frame = event.to_frame();
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "DraftCreated");
        assert!(json.get("timestamp").is_some());
        assert!(json.get("draft_id").is_some());
    }
}

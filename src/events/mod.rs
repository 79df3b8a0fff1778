//! In-process event bus.
//!
//! An explicit process-lifetime service created at startup and passed to
//! every component, not a module global. `EventBus` wraps a
//! `tokio::sync::broadcast` channel; every domain-writing service holds a
//! clone of it and calls `publish` synchronously after its transaction
//! commits, so fan-out only ever reflects committed state.

use crate::ids::{
    DraftOrderId, MenuStationId, OrderId, PaymentId, RefundId, ShiftId, TableSessionId, TicketId,
    UserId,
};
use crate::money::Money;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub enum DomainEvent {
    DraftCreated {
        draft_id: DraftOrderId,
        table_session_id: TableSessionId,
    },
    DraftSubmitted {
        draft_id: DraftOrderId,
        table_session_id: TableSessionId,
    },
    DraftAcquired {
        draft_id: DraftOrderId,
        table_session_id: TableSessionId,
        locked_by: UserId,
    },
    DraftConfirmed {
        draft_id: DraftOrderId,
        table_session_id: TableSessionId,
        order_id: OrderId,
        total: Money,
    },
    DraftRejected {
        draft_id: DraftOrderId,
        table_session_id: TableSessionId,
        reason: String,
    },
    DraftReassigned {
        draft_id: DraftOrderId,
        old_session: TableSessionId,
        new_session: TableSessionId,
    },

    TicketCreated {
        ticket_id: TicketId,
        station_id: MenuStationId,
    },
    TicketUpdated {
        ticket_id: TicketId,
        station_id: MenuStationId,
    },
    TicketBumped {
        ticket_id: TicketId,
        station_id: MenuStationId,
    },
    TicketHeld {
        ticket_id: TicketId,
        station_id: MenuStationId,
    },
    TicketFired {
        ticket_id: TicketId,
        station_id: MenuStationId,
    },
    TicketVoided {
        ticket_id: TicketId,
        station_id: MenuStationId,
    },

    OrderCreated {
        order_id: OrderId,
        table_session_id: TableSessionId,
    },
    OrderUpdated {
        order_id: OrderId,
        table_session_id: TableSessionId,
    },
    OrderInProgress {
        order_id: OrderId,
        table_session_id: TableSessionId,
    },
    OrderPaid {
        order_id: OrderId,
        table_session_id: TableSessionId,
    },
    OrderCompleted {
        order_id: OrderId,
        table_session_id: TableSessionId,
    },
    OrderCancelled {
        order_id: OrderId,
        table_session_id: TableSessionId,
    },

    PaymentCreated {
        payment_id: PaymentId,
        order_id: OrderId,
        table_session_id: TableSessionId,
    },
    PaymentCompleted {
        payment_id: PaymentId,
        order_id: OrderId,
        table_session_id: TableSessionId,
        amount: Money,
    },
    PaymentFailed {
        payment_id: PaymentId,
        order_id: OrderId,
        table_session_id: TableSessionId,
    },
    RefundCreated {
        refund_id: RefundId,
        order_id: OrderId,
        table_session_id: TableSessionId,
    },

    ShiftOpened {
        shift_id: ShiftId,
        server_id: UserId,
    },
    ShiftClosed {
        shift_id: ShiftId,
        server_id: UserId,
    },
    ShiftReconciled {
        shift_id: ShiftId,
        server_id: UserId,
    },
}

impl DomainEvent {
    pub fn type_name(&self) -> &'static str {
        match self {
            DomainEvent::DraftCreated { .. } => "DraftCreated",
            DomainEvent::DraftSubmitted { .. } => "DraftSubmitted",
            DomainEvent::DraftAcquired { .. } => "DraftAcquired",
            DomainEvent::DraftConfirmed { .. } => "DraftConfirmed",
            DomainEvent::DraftRejected { .. } => "DraftRejected",
            DomainEvent::DraftReassigned { .. } => "DraftReassigned",
            DomainEvent::TicketCreated { .. } => "TicketCreated",
            DomainEvent::TicketUpdated { .. } => "TicketUpdated",
            DomainEvent::TicketBumped { .. } => "TicketBumped",
            DomainEvent::TicketHeld { .. } => "TicketHeld",
            DomainEvent::TicketFired { .. } => "TicketFired",
            DomainEvent::TicketVoided { .. } => "TicketVoided",
            DomainEvent::OrderCreated { .. } => "OrderCreated",
            DomainEvent::OrderUpdated { .. } => "OrderUpdated",
            DomainEvent::OrderInProgress { .. } => "OrderInProgress",
            DomainEvent::OrderPaid { .. } => "OrderPaid",
            DomainEvent::OrderCompleted { .. } => "OrderCompleted",
            DomainEvent::OrderCancelled { .. } => "OrderCancelled",
            DomainEvent::PaymentCreated { .. } => "PaymentCreated",
            DomainEvent::PaymentCompleted { .. } => "PaymentCompleted",
            DomainEvent::PaymentFailed { .. } => "PaymentFailed",
            DomainEvent::RefundCreated { .. } => "RefundCreated",
            DomainEvent::ShiftOpened { .. } => "ShiftOpened",
            DomainEvent::ShiftClosed { .. } => "ShiftClosed",
            DomainEvent::ShiftReconciled { .. } => "ShiftReconciled",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Process-lifetime pub/sub service. Cloning an `EventBus` is cheap (it
/// clones the broadcast `Sender`); every service holds one instance.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1024);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Called only after the originating transaction has
    /// committed, so every subscriber observes committed state only.
    pub fn publish(&self, event: DomainEvent) {
        tracing::debug!(event = event.type_name(), "publishing domain event");
        // No subscribers is not an error — the push hub may not have any
        // connections on the relevant subject yet.
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::new();
        bus.publish(DomainEvent::DraftCreated {
            draft_id: DraftOrderId::new(),
            table_session_id: TableSessionId::new(),
        });
    }

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let draft_id = DraftOrderId::new();
        bus.publish(DomainEvent::DraftSubmitted {
            draft_id,
            table_session_id: TableSessionId::new(),
        });
        let event = rx.recv().await.unwrap();
        assert_eq!(event.type_name(), "DraftSubmitted");
    }
}

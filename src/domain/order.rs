//! A confirmed order: the record created when a draft is confirmed and
//! fanned out to kitchen stations. Line items mirror the draft's at
//! confirmation time; subsequent changes go through adjustments
//! (`adjustment.rs`), not direct line-item edits.

use crate::error::DomainError;
use crate::ids::{DraftOrderId, MenuItemId, OrderId, OrderLineItemId, TableSessionId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    InProgress,
    Paid,
    Completed,
    Cancelled,
    Voided,
}

impl OrderStatus {
    fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled | OrderStatus::Voided)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub id: OrderLineItemId,
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
    pub unit_price: Money,
    pub notes: Option<String>,
}

impl OrderLineItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub draft_order_id: DraftOrderId,
    pub table_session_id: TableSessionId,
    pub status: OrderStatus,
    pub line_items: Vec<OrderLineItem>,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub discount_amount: Money,
    pub service_charge: Money,
    pub tip_amount: Money,
    pub total_amount: Money,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl Order {
    pub fn from_confirmed_draft(
        draft_order_id: DraftOrderId,
        table_session_id: TableSessionId,
        line_items: Vec<OrderLineItem>,
    ) -> Self {
        let subtotal = line_items.iter().map(|item| item.line_total()).sum();
        Self {
            id: OrderId::new(),
            draft_order_id,
            table_session_id,
            status: OrderStatus::Pending,
            line_items,
            subtotal,
            tax_amount: Money::ZERO,
            discount_amount: Money::ZERO,
            service_charge: Money::ZERO,
            tip_amount: Money::ZERO,
            total_amount: subtotal,
            created_at: Utc::now(),
            completed_at: None,
            version: 1,
        }
    }

    /// `total = subtotal + tax + service_charge + tip − discount`.
    pub fn recalculate_total(&mut self) {
        self.total_amount =
            self.subtotal + self.tax_amount + self.service_charge + self.tip_amount - self.discount_amount;
    }

    /// The line-item subtotal only, kept for callers (ticket dispatch,
    /// draft-confirmation events) that want the pre-tax figure rather than
    /// the settled total.
    pub fn total(&self) -> Money {
        self.total_amount
    }

    pub fn add_tip(&mut self, amount: Money) {
        self.tip_amount += amount;
        self.recalculate_total();
    }

    /// `paid_sum < total` — at least one payment settled but the order
    /// isn't fully covered yet.
    pub fn mark_in_progress(&mut self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidTransition(format!(
                "cannot mark an order in_progress from {:?}",
                self.status
            )));
        }
        self.status = OrderStatus::InProgress;
        Ok(())
    }

    /// `paid_sum >= total` — fully covered by settled payments.
    pub fn mark_paid(&mut self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidTransition(format!(
                "cannot mark an order paid from {:?}",
                self.status
            )));
        }
        self.status = OrderStatus::Paid;
        Ok(())
    }

    /// Requires the order to already be `paid` — the caller is responsible
    /// for checking every ticket is `completed`/`voided` before calling
    /// this, since `Order` itself has no knowledge of tickets.
    pub fn complete(&mut self) -> Result<(), DomainError> {
        if self.status != OrderStatus::Paid {
            return Err(DomainError::InvalidTransition(format!(
                "cannot complete an order in {:?}, it must be paid first",
                self.status
            )));
        }
        self.status = OrderStatus::Completed;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidTransition(format!("cannot cancel an order in {:?}", self.status)));
        }
        self.status = OrderStatus::Cancelled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{DraftOrderId, TableSessionId};

    fn new_order() -> Order {
        Order::from_confirmed_draft(DraftOrderId::new(), TableSessionId::new(), vec![])
    }

    #[test]
    fn fresh_order_starts_pending_with_zeroed_extras() {
        let order = new_order();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.tax_amount, Money::ZERO);
        assert_eq!(order.total_amount, order.subtotal);
    }

    #[test]
    fn recalculate_total_applies_the_full_formula() {
        let mut order = new_order();
        order.tax_amount = Money::from_major_minor(2, 0);
        order.service_charge = Money::from_major_minor(1, 0);
        order.tip_amount = Money::from_major_minor(3, 0);
        order.discount_amount = Money::from_major_minor(1, 0);
        order.recalculate_total();
        assert_eq!(order.total_amount, Money::from_major_minor(5, 0));
    }

    #[test]
    fn cannot_complete_before_paid() {
        let mut order = new_order();
        assert!(order.complete().is_err());
        order.mark_in_progress().unwrap();
        assert!(order.complete().is_err());
        order.mark_paid().unwrap();
        assert!(order.complete().is_ok());
        assert!(order.completed_at.is_some());
    }

    #[test]
    fn cannot_cancel_a_completed_order() {
        let mut order = new_order();
        order.mark_paid().unwrap();
        order.complete().unwrap();
        assert!(order.cancel().is_err());
    }
}

//! Shift and cash-drawer ledger. At most one active shift per
//! server is enforced at the storage layer (`db/schema.rs`'s partial unique
//! index), not here — this module only knows the arithmetic and the
//! open/close/reconcile transitions.

use crate::error::DomainError;
use crate::ids::{CashDrawerEventId, ShiftId, UserId};
use crate::money::{Money, SignedMoney};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Active,
    Closed,
    Reconciled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub server_id: UserId,
    pub status: ShiftStatus,
    pub opening_balance: Money,
    pub cash_sales: Money,
    pub card_sales: Money,
    pub tip_sales: Money,
    pub closing_cash_count: Option<Money>,
    pub expected_cash: Option<Money>,
    pub cash_variance: Option<Money>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl Shift {
    pub fn open(server_id: UserId, opening_balance: Money) -> Self {
        Self {
            id: ShiftId::new(),
            server_id,
            status: ShiftStatus::Active,
            opening_balance,
            cash_sales: Money::ZERO,
            card_sales: Money::ZERO,
            tip_sales: Money::ZERO,
            closing_cash_count: None,
            expected_cash: None,
            cash_variance: None,
            opened_at: Utc::now(),
            closed_at: None,
            version: 1,
        }
    }

    pub fn record_cash_sale(&mut self, amount: Money) -> Result<(), DomainError> {
        self.require_active()?;
        self.cash_sales += amount;
        Ok(())
    }

    pub fn record_card_sale(&mut self, amount: Money) -> Result<(), DomainError> {
        self.require_active()?;
        self.card_sales += amount;
        Ok(())
    }

    pub fn record_tip(&mut self, amount: Money) -> Result<(), DomainError> {
        self.require_active()?;
        self.tip_sales += amount;
        Ok(())
    }

    fn require_active(&self) -> Result<(), DomainError> {
        if self.status != ShiftStatus::Active {
            return Err(DomainError::InvalidTransition(format!(
                "shift is {:?}, not active",
                self.status
            )));
        }
        Ok(())
    }

    /// Closes the shift with the server's counted cash, computing
    /// `expected_cash = opening_balance + cash_sales` and the variance
    /// against what was actually counted in the drawer.
    pub fn close(&mut self, closing_cash_count: Money) -> Result<(), DomainError> {
        self.require_active()?;
        let expected = self.opening_balance + self.cash_sales;
        self.expected_cash = Some(expected);
        self.cash_variance = Some(Money::from_major_minor(0, 0) + closing_cash_count - expected);
        self.closing_cash_count = Some(closing_cash_count);
        self.status = ShiftStatus::Closed;
        self.closed_at = Some(Utc::now());
        Ok(())
    }

    pub fn reconcile(&mut self) -> Result<(), DomainError> {
        if self.status != ShiftStatus::Closed {
            return Err(DomainError::InvalidTransition(
                "only a closed shift can be reconciled".into(),
            ));
        }
        self.status = ShiftStatus::Reconciled;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashDrawerEventKind {
    /// The float a server starts their shift with. Written once, by
    /// `ShiftLedger::open`, as the first entry in a shift's ledger.
    OpeningBalance,
    PaymentIn,
    ChangeOut,
    CashDrop,
    TipPayout,
    CashAdjustment,
    /// A till that came up short counted against a cash refund or a
    /// reconciliation variance.
    CashShortage,
    PettyCash,
    Other,
}

/// An append-only entry in a shift's cash-drawer ledger, ordered by
/// `sequence` — never updated or deleted once written, only appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashDrawerEvent {
    pub id: CashDrawerEventId,
    pub shift_id: ShiftId,
    pub sequence: i64,
    pub kind: CashDrawerEventKind,
    pub amount: SignedMoney,
    pub recorded_by: UserId,
    pub approved_by: Option<UserId>,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_computes_expected_cash_and_variance() {
        let mut shift = Shift::open(UserId::new(), Money::from_major_minor(100, 0));
        shift.record_cash_sale(Money::from_major_minor(50, 0)).unwrap();
        shift.close(Money::from_major_minor(148, 0)).unwrap();
        assert_eq!(shift.expected_cash, Some(Money::from_major_minor(150, 0)));
        assert_eq!(shift.cash_variance, Some(Money::from_major_minor(0, 0) - Money::from_major_minor(2, 0)));
    }

    #[test]
    fn cannot_record_sales_after_closing() {
        let mut shift = Shift::open(UserId::new(), Money::ZERO);
        shift.close(Money::ZERO).unwrap();
        assert!(shift.record_cash_sale(Money::from_major_minor(1, 0)).is_err());
    }

    #[test]
    fn reconcile_requires_closed_status() {
        let mut shift = Shift::open(UserId::new(), Money::ZERO);
        assert!(shift.reconcile().is_err());
        shift.close(Money::ZERO).unwrap();
        assert!(shift.reconcile().is_ok());
    }
}

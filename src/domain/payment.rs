//! Payment lifecycle. A `PaymentIntent` captures the attempt to collect
//! money: cash settles immediately, card/terminal/QR move through an
//! `in_progress` state while an external processor or provider resolves
//! them. A `Payment` is the settled record a completed intent produces.
//! Only one `Refund` is permitted per payment — no partial refunds.

use crate::error::DomainError;
use crate::ids::{OrderId, PaymentId, PaymentIntentId, RefundId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Terminal,
    Qr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: PaymentIntentId,
    pub order_id: OrderId,
    pub method: PaymentMethod,
    pub amount: Money,
    pub status: PaymentIntentStatus,
    pub idempotency_key: String,
    pub qr_payload: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

impl PaymentIntent {
    fn base(order_id: OrderId, method: PaymentMethod, amount: Money, idempotency_key: String) -> Self {
        Self {
            id: PaymentIntentId::new(),
            order_id,
            method,
            amount,
            status: PaymentIntentStatus::Pending,
            idempotency_key,
            qr_payload: None,
            expires_at: None,
            created_at: Utc::now(),
            version: 1,
        }
    }

    pub fn new_cash(order_id: OrderId, amount: Money, idempotency_key: String) -> Self {
        Self::base(order_id, PaymentMethod::Cash, amount, idempotency_key)
    }

    pub fn new_card(order_id: OrderId, amount: Money, idempotency_key: String) -> Self {
        Self::base(order_id, PaymentMethod::Card, amount, idempotency_key)
    }

    pub fn new_terminal(order_id: OrderId, amount: Money, idempotency_key: String) -> Self {
        Self::base(order_id, PaymentMethod::Terminal, amount, idempotency_key)
    }

    pub fn new_qr(order_id: OrderId, amount: Money, idempotency_key: String, qr_payload: String, ttl: chrono::Duration) -> Self {
        let mut intent = Self::base(order_id, PaymentMethod::Qr, amount, idempotency_key);
        intent.qr_payload = Some(qr_payload);
        intent.expires_at = Some(intent.created_at + ttl);
        intent
    }

    pub fn check_not_expired(&self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if let Some(expires_at) = self.expires_at {
            if now > expires_at {
                return Err(DomainError::ExpiredQr);
            }
        }
        Ok(())
    }

    /// Hands the intent off to an external processor/provider. Cash never
    /// calls this — it completes straight from `pending`.
    pub fn start_processing(&mut self) -> Result<(), DomainError> {
        if self.status != PaymentIntentStatus::Pending {
            return Err(DomainError::InvalidTransition(format!(
                "cannot start processing a payment intent in {:?}",
                self.status
            )));
        }
        self.status = PaymentIntentStatus::InProgress;
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), DomainError> {
        if !matches!(self.status, PaymentIntentStatus::Pending | PaymentIntentStatus::InProgress) {
            return Err(DomainError::InvalidTransition(format!(
                "cannot complete a payment intent in {:?}",
                self.status
            )));
        }
        self.status = PaymentIntentStatus::Completed;
        Ok(())
    }

    pub fn fail(&mut self) -> Result<(), DomainError> {
        if !matches!(self.status, PaymentIntentStatus::Pending | PaymentIntentStatus::InProgress) {
            return Err(DomainError::InvalidTransition(format!(
                "cannot fail a payment intent in {:?}",
                self.status
            )));
        }
        self.status = PaymentIntentStatus::Failed;
        Ok(())
    }

    /// Used for a QR code that aged past its TTL or a processor charge the
    /// customer backed out of, as opposed to `fail` (processor declined it).
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if !matches!(self.status, PaymentIntentStatus::Pending | PaymentIntentStatus::InProgress) {
            return Err(DomainError::InvalidTransition(format!(
                "cannot cancel a payment intent in {:?}",
                self.status
            )));
        }
        self.status = PaymentIntentStatus::Cancelled;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
    Refunded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub payment_intent_id: Option<PaymentIntentId>,
    pub method: PaymentMethod,
    pub amount: Money,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

impl Payment {
    pub fn from_intent(intent: &PaymentIntent) -> Self {
        Self {
            id: PaymentId::new(),
            order_id: intent.order_id,
            payment_intent_id: Some(intent.id),
            method: intent.method,
            amount: intent.amount,
            status: PaymentStatus::Completed,
            created_at: Utc::now(),
            version: 1,
        }
    }

    pub fn refund(&mut self) -> Result<(), DomainError> {
        if self.status != PaymentStatus::Completed {
            return Err(DomainError::InvalidTransition(
                "payment has already been refunded".into(),
            ));
        }
        self.status = PaymentStatus::Refunded;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundReasonCode {
    CustomerRequest,
    OrderError,
    QualityIssue,
    Duplicate,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Requested,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: RefundId,
    pub payment_id: PaymentId,
    pub order_id: OrderId,
    pub amount: Money,
    pub reason_code: RefundReasonCode,
    pub reason: String,
    pub status: RefundStatus,
    pub created_at: DateTime<Utc>,
}

impl Refund {
    pub fn request(payment: &Payment, reason_code: RefundReasonCode, reason: String) -> Self {
        Self {
            id: RefundId::new(),
            payment_id: payment.id,
            order_id: payment.order_id,
            amount: payment.amount,
            reason_code,
            reason,
            status: RefundStatus::Requested,
            created_at: Utc::now(),
        }
    }

    pub fn complete(&mut self) -> Result<(), DomainError> {
        if self.status != RefundStatus::Requested {
            return Err(DomainError::InvalidTransition(format!(
                "cannot complete a refund in {:?}",
                self.status
            )));
        }
        self.status = RefundStatus::Completed;
        Ok(())
    }

    pub fn fail(&mut self) -> Result<(), DomainError> {
        if self.status != RefundStatus::Requested {
            return Err(DomainError::InvalidTransition(format!(
                "cannot fail a refund in {:?}",
                self.status
            )));
        }
        self.status = RefundStatus::Failed;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_qr_intent_rejects_completion_check() {
        let intent = PaymentIntent::new_qr(
            OrderId::new(),
            Money::from_major_minor(10, 0),
            "idem-1".into(),
            "qr-payload".into(),
            chrono::Duration::seconds(-1),
        );
        assert!(matches!(
            intent.check_not_expired(Utc::now()),
            Err(DomainError::ExpiredQr)
        ));
    }

    #[test]
    fn card_intent_must_go_through_in_progress_before_completing() {
        let mut intent = PaymentIntent::new_card(OrderId::new(), Money::from_major_minor(5, 0), "idem-2".into());
        intent.start_processing().unwrap();
        assert_eq!(intent.status, PaymentIntentStatus::InProgress);
        intent.complete().unwrap();
        assert_eq!(intent.status, PaymentIntentStatus::Completed);
    }

    #[test]
    fn cannot_start_processing_twice() {
        let mut intent = PaymentIntent::new_terminal(OrderId::new(), Money::from_major_minor(5, 0), "idem-3".into());
        intent.start_processing().unwrap();
        assert!(intent.start_processing().is_err());
    }

    #[test]
    fn payment_cannot_be_refunded_twice() {
        let intent = PaymentIntent::new_cash(OrderId::new(), Money::from_major_minor(5, 0), "idem-4".into());
        let mut payment = Payment::from_intent(&intent);
        payment.refund().unwrap();
        assert!(payment.refund().is_err());
    }

    #[test]
    fn refund_state_machine_rejects_double_completion() {
        let intent = PaymentIntent::new_cash(OrderId::new(), Money::from_major_minor(5, 0), "idem-5".into());
        let payment = Payment::from_intent(&intent);
        let mut refund = Refund::request(&payment, RefundReasonCode::CustomerRequest, "mischarged".into());
        refund.complete().unwrap();
        assert!(refund.complete().is_err());
    }
}

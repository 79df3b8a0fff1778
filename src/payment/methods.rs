//! Per-method intent creation rules. Cash settles immediately. Card,
//! terminal, and QR all create a pending intent and move to `in_progress`
//! while something outside this process resolves them — a reader
//! authorization, a processor callback, or a QR provider webhook.

use super::provider::{CreateChargeRequest, QrProvider};
use crate::domain::payment::PaymentIntent;
use crate::error::DomainResult;
use crate::ids::OrderId;
use crate::money::Money;
use chrono::Duration;

pub fn new_cash_intent(order_id: OrderId, amount: Money, idempotency_key: String) -> PaymentIntent {
    PaymentIntent::new_cash(order_id, amount, idempotency_key)
}

pub fn new_card_intent(order_id: OrderId, amount: Money, idempotency_key: String) -> PaymentIntent {
    PaymentIntent::new_card(order_id, amount, idempotency_key)
}

pub fn new_terminal_intent(order_id: OrderId, amount: Money, idempotency_key: String) -> PaymentIntent {
    PaymentIntent::new_terminal(order_id, amount, idempotency_key)
}

/// Requests a charge from the QR provider and wraps the returned payload
/// in a pending intent with the given TTL (the `ExpiredQr` window).
pub async fn new_qr_intent(
    provider: &dyn QrProvider,
    order_id: OrderId,
    amount: Money,
    idempotency_key: String,
    ttl: Duration,
) -> DomainResult<PaymentIntent> {
    let response = provider
        .create_charge(CreateChargeRequest {
            external_reference: idempotency_key.clone(),
            amount: amount.as_decimal(),
            description: format!("order {order_id}"),
        })
        .await?;

    Ok(PaymentIntent::new_qr(order_id, amount, idempotency_key, response.qr_payload, ttl))
}

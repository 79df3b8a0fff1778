//! Payment endpoints: cash settles immediately; card, terminal, and QR
//! all start pending and are resolved later, either by `resolve_payment`
//! (card/terminal) or `api::webhooks::qr_webhook` (QR).

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::state::AppState;
use crate::auth::{AuthContext, Permission};
use crate::domain::payment::{Payment, PaymentIntent, PaymentMethod, Refund, RefundReasonCode};
use crate::ids::{OrderId, PaymentId, PaymentIntentId};
use crate::money::Money;
use crate::payment::Settlement;
use axum::extract::{Extension, Path, State};
use axum::Json;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct TakePaymentRequest {
    pub order_id: OrderId,
    pub amount: Money,
    pub idempotency_key: String,
}

pub async fn pay(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(method): Path<PaymentMethod>,
    Json(request): Json<TakePaymentRequest>,
) -> ApiResult<PaymentOutcome> {
    auth.require(Permission::TakePayment)?;
    let ctx = auth.tenant_ctx();
    let outcome = match method {
        PaymentMethod::Cash => PaymentOutcome::Settled(
            state
                .payments
                .pay_cash(&ctx, request.order_id, request.amount, request.idempotency_key, auth.user_id)
                .await?,
        ),
        PaymentMethod::Card => PaymentOutcome::Pending(
            state.payments.pay_card(&ctx, request.order_id, request.amount, request.idempotency_key).await?,
        ),
        PaymentMethod::Terminal => PaymentOutcome::Pending(
            state.payments.pay_terminal(&ctx, request.order_id, request.amount, request.idempotency_key).await?,
        ),
        PaymentMethod::Qr => PaymentOutcome::Pending(
            state.payments.start_qr_payment(&ctx, request.order_id, request.amount, request.idempotency_key).await?,
        ),
    };
    Ok(ApiResponse::new(outcome))
}

/// Cash settles synchronously and returns a `Payment`; card, terminal, and
/// QR all return a pending `PaymentIntent`.
#[derive(serde::Serialize)]
#[serde(untagged)]
pub enum PaymentOutcome {
    Settled(Payment),
    Pending(PaymentIntent),
}

impl From<Settlement> for PaymentOutcome {
    fn from(settlement: Settlement) -> Self {
        match settlement {
            Settlement::Paid(payment) => PaymentOutcome::Settled(payment),
            Settlement::Processing(intent) => PaymentOutcome::Pending(intent),
        }
    }
}

#[derive(Deserialize)]
pub struct SplitPaymentLeg {
    pub method: PaymentMethod,
    pub amount: Money,
}

#[derive(Deserialize)]
pub struct SplitPaymentRequest {
    pub order_id: OrderId,
    pub legs: Vec<SplitPaymentLeg>,
    pub idempotency_key: String,
}

pub async fn split_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<SplitPaymentRequest>,
) -> ApiResult<Vec<PaymentOutcome>> {
    auth.require(Permission::TakePayment)?;
    let ctx = auth.tenant_ctx();
    let legs = request.legs.into_iter().map(|leg| (leg.method, leg.amount)).collect();
    let settlements = state
        .payments
        .split(&ctx, request.order_id, legs, request.idempotency_key, auth.user_id)
        .await?;
    Ok(ApiResponse::new(settlements.into_iter().map(PaymentOutcome::from).collect()))
}

#[derive(Deserialize)]
pub struct ResolvePaymentRequest {
    pub succeeded: bool,
}

pub async fn resolve_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(intent_id): Path<PaymentIntentId>,
    Json(request): Json<ResolvePaymentRequest>,
) -> ApiResult<()> {
    auth.require(Permission::ResolvePayment)?;
    let ctx = auth.tenant_ctx();
    state.payments.resolve_intent(&ctx, intent_id, request.succeeded).await?;
    Ok(ApiResponse::new(()))
}

#[derive(Deserialize)]
pub struct RefundRequest {
    pub reason_code: RefundReasonCode,
    pub reason: String,
}

pub async fn refund_payment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(payment_id): Path<PaymentId>,
    Json(request): Json<RefundRequest>,
) -> ApiResult<Refund> {
    auth.require(Permission::RefundPayment)?;
    let ctx = auth.tenant_ctx();
    let refund = state
        .payments
        .refund(&ctx, payment_id, request.reason_code, request.reason, auth.user_id)
        .await?;
    Ok(ApiResponse::new(refund))
}

//! Payment engine: creates payment intents, settles them into
//! `Payment` records, recomputes split-payment completion, couples cash
//! settlement to the server's shift drawer, and handles refunds. QR webhook
//! ingestion lives in `webhook.rs`; the provider seam is `provider.rs`.

pub mod methods;
pub mod provider;
pub mod repository;
pub mod webhook;

use crate::db::TenantCtx;
use crate::domain::payment::{Payment, PaymentIntent, PaymentMethod, Refund, RefundReasonCode};
use crate::domain::shift::CashDrawerEventKind;
use crate::draft::repository::OrderRepository;
use crate::error::{DomainError, DomainResult};
use crate::events::{DomainEvent, EventBus};
use crate::ids::{OrderId, PaymentId, PaymentIntentId, TableSessionId, UserId};
use crate::money::{Money, SignedMoney};
use crate::shift::{repository::ShiftRepository, ShiftLedger};
use provider::QrProvider;
use repository::{PaymentIntentRepository, PaymentRepository, RefundRepository};
use sqlx::PgPool;
use std::sync::Arc;

/// What a payment attempt produced: either a settled `Payment` (cash, or a
/// card/terminal/QR intent that resolved inline within the same call), or a
/// `PaymentIntent` still waiting on an external resolution.
pub enum Settlement {
    Paid(Payment),
    Processing(PaymentIntent),
}

#[derive(Clone)]
pub struct PaymentEngine {
    pool: PgPool,
    bus: EventBus,
    qr_provider: Arc<dyn QrProvider>,
    qr_ttl: chrono::Duration,
    shifts: ShiftLedger,
}

impl PaymentEngine {
    pub fn new(
        pool: PgPool,
        bus: EventBus,
        qr_provider: Arc<dyn QrProvider>,
        qr_ttl: chrono::Duration,
        shifts: ShiftLedger,
    ) -> Self {
        Self {
            pool,
            bus,
            qr_provider,
            qr_ttl,
            shifts,
        }
    }

    /// Settles a cash payment immediately against `performed_by`'s open
    /// shift, then records the sale in that shift's cash-drawer ledger.
    /// Fails if the server has no shift open — cash can't be taken off a
    /// closed drawer.
    pub async fn pay_cash(
        &self,
        ctx: &TenantCtx,
        order_id: OrderId,
        amount: Money,
        idempotency_key: String,
        performed_by: UserId,
    ) -> DomainResult<Payment> {
        let shift = self.shifts.require_active_for_server(ctx, performed_by).await?;
        let intent = methods::new_cash_intent(order_id, amount, idempotency_key);
        let payment = self.settle_immediately(ctx, intent).await?;

        self.shifts.record_cash_sale(ctx, shift.id, amount).await?;
        self.shifts
            .record_cash_drawer_event(
                ctx,
                shift.id,
                CashDrawerEventKind::PaymentIn,
                SignedMoney::positive(amount),
                performed_by,
                None,
                format!("cash payment for order {order_id}"),
            )
            .await?;
        Ok(payment)
    }

    /// Creates a pending card intent and moves it straight to
    /// `in_progress` — the reader is assumed to already be running the
    /// charge by the time this returns. The caller resolves it later via
    /// `resolve_intent` once the reader reports authorized or declined.
    pub async fn pay_card(&self, ctx: &TenantCtx, order_id: OrderId, amount: Money, idempotency_key: String) -> DomainResult<PaymentIntent> {
        self.start_processing(ctx, methods::new_card_intent(order_id, amount, idempotency_key)).await
    }

    pub async fn pay_terminal(&self, ctx: &TenantCtx, order_id: OrderId, amount: Money, idempotency_key: String) -> DomainResult<PaymentIntent> {
        self.start_processing(ctx, methods::new_terminal_intent(order_id, amount, idempotency_key)).await
    }

    async fn start_processing(&self, ctx: &TenantCtx, mut intent: PaymentIntent) -> DomainResult<PaymentIntent> {
        intent.start_processing()?;
        PaymentIntentRepository::new(&self.pool).insert(ctx, &intent).await?;
        self.bus.publish(DomainEvent::PaymentCreated {
            payment_id: PaymentId::new(),
            order_id: intent.order_id,
            table_session_id: self.table_session_for(ctx, intent.order_id).await?,
        });
        Ok(intent)
    }

    /// Resolves an `in_progress` card/terminal/QR intent once whatever is
    /// processing it reports back. `succeeded` drives which of
    /// `complete_intent`/`fail_intent` runs.
    pub async fn resolve_intent(&self, ctx: &TenantCtx, intent_id: PaymentIntentId, succeeded: bool) -> DomainResult<()> {
        if succeeded {
            self.complete_intent(ctx, intent_id).await?;
        } else {
            self.fail_intent(ctx, intent_id).await?;
        }
        Ok(())
    }

    /// Creates a pending QR intent and returns it for the caller to render
    /// as a code; completion arrives later via `webhook::ingest`.
    pub async fn start_qr_payment(&self, ctx: &TenantCtx, order_id: OrderId, amount: Money, idempotency_key: String) -> DomainResult<PaymentIntent> {
        let mut intent = methods::new_qr_intent(self.qr_provider.as_ref(), order_id, amount, idempotency_key, self.qr_ttl).await?;
        intent.start_processing()?;
        PaymentIntentRepository::new(&self.pool).insert(ctx, &intent).await?;
        self.bus.publish(DomainEvent::PaymentCreated {
            payment_id: PaymentId::new(),
            order_id,
            table_session_id: self.table_session_for(ctx, order_id).await?,
        });
        Ok(intent)
    }

    /// Settles the outstanding balance of `order_id` across several
    /// payment methods in one call. Every leg's amount must sum to the
    /// order's outstanding balance (within a cent) before any leg runs.
    pub async fn split(
        &self,
        ctx: &TenantCtx,
        order_id: OrderId,
        legs: Vec<(PaymentMethod, Money)>,
        idempotency_key_base: String,
        performed_by: UserId,
    ) -> DomainResult<Vec<Settlement>> {
        let order = OrderRepository::new(&self.pool).get(ctx, order_id).await?;
        let paid_so_far = PaymentRepository::new(&self.pool).paid_total(ctx, order_id).await?;
        let outstanding = order.total().checked_sub(paid_so_far).unwrap_or(Money::ZERO);

        let legs_total: Money = legs.iter().map(|(_, amount)| *amount).sum();
        if !legs_total.approx_eq(outstanding) {
            return Err(DomainError::BadRequest(format!(
                "split legs sum to {legs_total} but {outstanding} is outstanding on the order"
            )));
        }

        let mut settlements = Vec::with_capacity(legs.len());
        for (index, (method, amount)) in legs.into_iter().enumerate() {
            let idempotency_key = format!("{idempotency_key_base}-{index}");
            let settlement = match method {
                PaymentMethod::Cash => {
                    Settlement::Paid(self.pay_cash(ctx, order_id, amount, idempotency_key, performed_by).await?)
                }
                PaymentMethod::Card => Settlement::Processing(self.pay_card(ctx, order_id, amount, idempotency_key).await?),
                PaymentMethod::Terminal => {
                    Settlement::Processing(self.pay_terminal(ctx, order_id, amount, idempotency_key).await?)
                }
                PaymentMethod::Qr => Settlement::Processing(self.start_qr_payment(ctx, order_id, amount, idempotency_key).await?),
            };
            settlements.push(settlement);
        }
        Ok(settlements)
    }

    async fn settle_immediately(&self, ctx: &TenantCtx, intent: PaymentIntent) -> DomainResult<Payment> {
        let intent_repo = PaymentIntentRepository::new(&self.pool);
        intent_repo.insert(ctx, &intent).await?;
        self.complete_intent(ctx, intent.id).await
    }

    /// Marks a pending or in-progress intent completed, writes the settled
    /// `Payment`, and recomputes the order's paid total to decide whether
    /// it's now partially or fully paid. Recomputed after each individual
    /// payment, not batched.
    pub async fn complete_intent(&self, ctx: &TenantCtx, intent_id: PaymentIntentId) -> DomainResult<Payment> {
        let intent_repo = PaymentIntentRepository::new(&self.pool);
        let mut intent = intent_repo.get(ctx, intent_id).await?;
        let expected_version = intent.version;
        intent.complete()?;
        intent_repo.save_cas(ctx, &intent, expected_version).await?;

        let payment = Payment::from_intent(&intent);
        PaymentRepository::new(&self.pool).insert(ctx, &payment).await?;

        let table_session_id = self.table_session_for(ctx, intent.order_id).await?;
        self.bus.publish(DomainEvent::PaymentCompleted {
            payment_id: payment.id,
            order_id: intent.order_id,
            table_session_id,
            amount: payment.amount,
        });

        self.recompute_order_paid_status(ctx, intent.order_id, table_session_id).await?;
        Ok(payment)
    }

    pub async fn fail_intent(&self, ctx: &TenantCtx, intent_id: PaymentIntentId) -> DomainResult<()> {
        let intent_repo = PaymentIntentRepository::new(&self.pool);
        let mut intent = intent_repo.get(ctx, intent_id).await?;
        let expected_version = intent.version;
        intent.fail()?;
        intent_repo.save_cas(ctx, &intent, expected_version).await?;

        let table_session_id = self.table_session_for(ctx, intent.order_id).await?;
        self.bus.publish(DomainEvent::PaymentFailed {
            payment_id: PaymentId::new(),
            order_id: intent.order_id,
            table_session_id,
        });
        Ok(())
    }

    /// Moves the order to `paid` once settled payments cover its total, or
    /// to `in_progress` once at least one payment has settled but the total
    /// isn't covered yet. Does nothing once the order is already paid or
    /// terminal — a later partial payment can't push it backwards.
    async fn recompute_order_paid_status(&self, ctx: &TenantCtx, order_id: OrderId, table_session_id: TableSessionId) -> DomainResult<()> {
        let order_repo = OrderRepository::new(&self.pool);
        let paid = PaymentRepository::new(&self.pool).paid_total(ctx, order_id).await?;
        let mut order = order_repo.get(ctx, order_id).await?;
        let expected_version = order.version;
        let order_total = order.total();

        if paid.approx_eq(order_total) || paid.as_decimal() >= order_total.as_decimal() {
            order.mark_paid()?;
            order_repo.save_cas(ctx, &order, expected_version).await?;
            self.bus.publish(DomainEvent::OrderPaid { order_id, table_session_id });
        } else if paid != Money::ZERO {
            order.mark_in_progress()?;
            order_repo.save_cas(ctx, &order, expected_version).await?;
            self.bus.publish(DomainEvent::OrderInProgress { order_id, table_session_id });
        }
        Ok(())
    }

    /// Refunds a completed payment. A cash refund also appends a
    /// `cash_shortage` entry to the till's ledger so the drawer's running
    /// balance reflects the money that left it, skipped (with a warning)
    /// if the server has no shift open to record it against.
    pub async fn refund(
        &self,
        ctx: &TenantCtx,
        payment_id: PaymentId,
        reason_code: RefundReasonCode,
        reason: String,
        performed_by: UserId,
    ) -> DomainResult<Refund> {
        let refund_repo = RefundRepository::new(&self.pool);
        if refund_repo.exists_for_payment(ctx, payment_id).await? {
            return Err(DomainError::InvalidTransition("payment has already been refunded".into()));
        }

        let payment_repo = PaymentRepository::new(&self.pool);
        let mut payment = payment_repo.get(ctx, payment_id).await?;
        let expected_version = payment.version;
        payment.refund()?;
        payment_repo.save_cas(ctx, &payment, expected_version).await?;

        let mut refund = Refund::request(&payment, reason_code, reason);
        refund.complete()?;
        refund_repo.insert(ctx, &refund).await?;

        if payment.method == PaymentMethod::Cash {
            match ShiftRepository::new(&self.pool).find_active_for_server(ctx, performed_by).await? {
                Some(shift) => {
                    self.shifts
                        .record_cash_drawer_event(
                            ctx,
                            shift.id,
                            CashDrawerEventKind::CashShortage,
                            SignedMoney::negative(payment.amount),
                            performed_by,
                            None,
                            format!("cash refund for payment {payment_id}"),
                        )
                        .await?;
                }
                None => {
                    tracing::warn!(%payment_id, "cash refund issued with no shift open to record the drawer shortage against");
                }
            }
        }

        let table_session_id = self.table_session_for(ctx, payment.order_id).await?;
        self.bus.publish(DomainEvent::RefundCreated {
            refund_id: refund.id,
            order_id: payment.order_id,
            table_session_id,
        });
        Ok(refund)
    }

    async fn table_session_for(&self, ctx: &TenantCtx, order_id: OrderId) -> DomainResult<TableSessionId> {
        Ok(OrderRepository::new(&self.pool).get(ctx, order_id).await?.table_session_id)
    }
}

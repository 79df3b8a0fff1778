//! `sqlx`-backed persistence for payment intents, settled payments,
//! refunds, and the webhook idempotency/audit log.

use crate::db::cas::check_cas;
use crate::db::TenantCtx;
use crate::domain::payment::{
    Payment, PaymentIntent, PaymentIntentStatus, PaymentMethod, PaymentStatus, Refund, RefundReasonCode, RefundStatus,
};
use crate::error::{DomainError, DomainResult};
use crate::ids::{OrderId, PaymentId, PaymentIntentId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

fn method_to_str(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "cash",
        PaymentMethod::Card => "card",
        PaymentMethod::Terminal => "terminal",
        PaymentMethod::Qr => "qr",
    }
}

fn method_from_str(s: &str) -> DomainResult<PaymentMethod> {
    Ok(match s {
        "cash" => PaymentMethod::Cash,
        "card" => PaymentMethod::Card,
        "terminal" => PaymentMethod::Terminal,
        "qr" => PaymentMethod::Qr,
        other => return Err(DomainError::Internal(format!("unknown payment method {other}"))),
    })
}

fn intent_status_to_str(status: PaymentIntentStatus) -> &'static str {
    match status {
        PaymentIntentStatus::Pending => "pending",
        PaymentIntentStatus::InProgress => "in_progress",
        PaymentIntentStatus::Completed => "completed",
        PaymentIntentStatus::Cancelled => "cancelled",
        PaymentIntentStatus::Failed => "failed",
    }
}

fn intent_status_from_str(s: &str) -> DomainResult<PaymentIntentStatus> {
    Ok(match s {
        "pending" => PaymentIntentStatus::Pending,
        "in_progress" => PaymentIntentStatus::InProgress,
        "completed" => PaymentIntentStatus::Completed,
        "cancelled" => PaymentIntentStatus::Cancelled,
        "failed" => PaymentIntentStatus::Failed,
        other => return Err(DomainError::Internal(format!("unknown payment intent status {other}"))),
    })
}

#[derive(FromRow)]
struct PaymentIntentRow {
    id: PaymentIntentId,
    order_id: OrderId,
    method: String,
    amount: Money,
    status: String,
    idempotency_key: Option<String>,
    qr_code: Option<String>,
    qr_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    version: i64,
}

impl PaymentIntentRow {
    fn into_domain(self) -> DomainResult<PaymentIntent> {
        Ok(PaymentIntent {
            id: self.id,
            order_id: self.order_id,
            method: method_from_str(&self.method)?,
            amount: self.amount,
            status: intent_status_from_str(&self.status)?,
            idempotency_key: self.idempotency_key.unwrap_or_default(),
            qr_payload: self.qr_code,
            expires_at: self.qr_expires_at,
            created_at: self.created_at,
            version: self.version,
        })
    }
}

pub struct PaymentIntentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentIntentRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, ctx: &TenantCtx, intent: &PaymentIntent) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO payment_intents
               (id, tenant_id, order_id, status, version, method, amount, idempotency_key, qr_code, qr_expires_at, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)"#,
        )
        .bind(intent.id)
        .bind(ctx.tenant_id)
        .bind(intent.order_id)
        .bind(intent_status_to_str(intent.status))
        .bind(intent.version)
        .bind(method_to_str(intent.method))
        .bind(intent.amount)
        .bind(&intent.idempotency_key)
        .bind(&intent.qr_payload)
        .bind(intent.expires_at)
        .bind(intent.created_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, ctx: &TenantCtx, id: PaymentIntentId) -> DomainResult<PaymentIntent> {
        sqlx::query_as::<_, PaymentIntentRow>(
            r#"SELECT id, order_id, method, amount, status, idempotency_key, qr_code, qr_expires_at, created_at, version
               FROM payment_intents WHERE id = $1 AND tenant_id = $2"#,
        )
        .bind(id)
        .bind(ctx.tenant_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(DomainError::NotFound("payment_intent"))?
        .into_domain()
    }

    pub async fn get_by_idempotency_key(&self, ctx: &TenantCtx, idempotency_key: &str) -> DomainResult<PaymentIntent> {
        sqlx::query_as::<_, PaymentIntentRow>(
            r#"SELECT id, order_id, method, amount, status, idempotency_key, qr_code, qr_expires_at, created_at, version
               FROM payment_intents WHERE idempotency_key = $1 AND tenant_id = $2"#,
        )
        .bind(idempotency_key)
        .bind(ctx.tenant_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(DomainError::NotFound("payment_intent"))?
        .into_domain()
    }

    pub async fn save_cas(&self, ctx: &TenantCtx, intent: &PaymentIntent, expected_version: i64) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE payment_intents SET status = $1, version = version + 1, updated_at = now()
               WHERE id = $2 AND tenant_id = $3 AND version = $4"#,
        )
        .bind(intent_status_to_str(intent.status))
        .bind(intent.id)
        .bind(ctx.tenant_id)
        .bind(expected_version)
        .execute(self.pool)
        .await?;

        check_cas(result.rows_affected(), expected_version)
    }

    /// Webhook deliveries arrive without a tenant-scoped caller, so the
    /// intent has to be located by its idempotency key alone; the tenant
    /// id on the row is then used to build the `TenantCtx` every
    /// subsequent call needs.
    pub async fn find_by_idempotency_key_any_tenant(
        &self,
        idempotency_key: &str,
    ) -> DomainResult<(crate::ids::TenantId, PaymentIntent)> {
        #[derive(FromRow)]
        struct Row {
            tenant_id: crate::ids::TenantId,
            id: PaymentIntentId,
            order_id: OrderId,
            method: String,
            amount: Money,
            status: String,
            idempotency_key: Option<String>,
            qr_code: Option<String>,
            qr_expires_at: Option<DateTime<Utc>>,
            created_at: DateTime<Utc>,
            version: i64,
        }
        let row = sqlx::query_as::<_, Row>(
            r#"SELECT tenant_id, id, order_id, method, amount, status, idempotency_key, qr_code, qr_expires_at, created_at, version
               FROM payment_intents WHERE idempotency_key = $1"#,
        )
        .bind(idempotency_key)
        .fetch_optional(self.pool)
        .await?
        .ok_or(DomainError::NotFound("payment_intent"))?;

        let intent = PaymentIntentRow {
            id: row.id,
            order_id: row.order_id,
            method: row.method,
            amount: row.amount,
            status: row.status,
            idempotency_key: row.idempotency_key,
            qr_code: row.qr_code,
            qr_expires_at: row.qr_expires_at,
            created_at: row.created_at,
            version: row.version,
        }
        .into_domain()?;

        Ok((row.tenant_id, intent))
    }
}

#[derive(FromRow)]
struct PaymentRow {
    id: PaymentId,
    order_id: OrderId,
    payment_intent_id: Option<PaymentIntentId>,
    method: String,
    amount: Money,
    status: String,
    created_at: DateTime<Utc>,
    version: i64,
}

fn payment_status_to_str(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Completed => "completed",
        PaymentStatus::Refunded => "refunded",
    }
}

fn payment_status_from_str(s: &str) -> DomainResult<PaymentStatus> {
    Ok(match s {
        "completed" => PaymentStatus::Completed,
        "refunded" => PaymentStatus::Refunded,
        other => return Err(DomainError::Internal(format!("unknown payment status {other}"))),
    })
}

pub struct PaymentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, ctx: &TenantCtx, payment: &Payment) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO payments (id, tenant_id, payment_intent_id, method, amount, status, version, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)"#,
        )
        .bind(payment.id)
        .bind(ctx.tenant_id)
        .bind(payment.payment_intent_id)
        .bind(method_to_str(payment.method))
        .bind(payment.amount)
        .bind(payment_status_to_str(payment.status))
        .bind(payment.version)
        .bind(payment.created_at)
        .execute(self.pool)
        .await?;

        sqlx::query(
            r#"INSERT INTO order_payments (order_id, payment_id, allocated_amount) VALUES ($1, $2, $3)"#,
        )
        .bind(payment.order_id)
        .bind(payment.id)
        .bind(payment.amount)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, ctx: &TenantCtx, id: PaymentId) -> DomainResult<Payment> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r#"SELECT id, oi.order_id, payment_intent_id, method, amount, p.status, p.created_at, p.version
               FROM payments p JOIN order_payments oi ON oi.payment_id = p.id
               WHERE p.id = $1 AND p.tenant_id = $2"#,
        )
        .bind(id)
        .bind(ctx.tenant_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(DomainError::NotFound("payment"))?;

        Ok(Payment {
            id: row.id,
            order_id: row.order_id,
            payment_intent_id: row.payment_intent_id,
            method: method_from_str(&row.method)?,
            amount: row.amount,
            status: payment_status_from_str(&row.status)?,
            created_at: row.created_at,
            version: row.version,
        })
    }

    /// Sum of completed payments allocated to `order_id`, used to recompute
    /// whether a split-paid order is fully paid after each payment settles
    /// Recomputed after each individual payment, not batched.
    pub async fn paid_total(&self, ctx: &TenantCtx, order_id: OrderId) -> DomainResult<Money> {
        let row: (Option<Money>,) = sqlx::query_as(
            r#"SELECT SUM(p.amount) FROM payments p
               JOIN order_payments oi ON oi.payment_id = p.id
               WHERE oi.order_id = $1 AND p.tenant_id = $2 AND p.status = 'completed'"#,
        )
        .bind(order_id)
        .bind(ctx.tenant_id)
        .fetch_one(self.pool)
        .await?;
        Ok(row.0.unwrap_or(Money::ZERO))
    }

    pub async fn save_cas(&self, ctx: &TenantCtx, payment: &Payment, expected_version: i64) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE payments SET status = $1, version = version + 1, updated_at = now(),
                   refunded_at = CASE WHEN $1 = 'refunded' THEN now() ELSE refunded_at END
               WHERE id = $2 AND tenant_id = $3 AND version = $4"#,
        )
        .bind(payment_status_to_str(payment.status))
        .bind(payment.id)
        .bind(ctx.tenant_id)
        .bind(expected_version)
        .execute(self.pool)
        .await?;

        check_cas(result.rows_affected(), expected_version)
    }
}

fn reason_code_to_str(code: RefundReasonCode) -> &'static str {
    match code {
        RefundReasonCode::CustomerRequest => "customer_request",
        RefundReasonCode::OrderError => "order_error",
        RefundReasonCode::QualityIssue => "quality_issue",
        RefundReasonCode::Duplicate => "duplicate",
        RefundReasonCode::Other => "other",
    }
}

fn refund_status_to_str(status: RefundStatus) -> &'static str {
    match status {
        RefundStatus::Requested => "requested",
        RefundStatus::Completed => "completed",
        RefundStatus::Failed => "failed",
    }
}

pub struct RefundRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RefundRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Refunds are written once, already resolved — there is no pending
    /// refund a later step mutates, so this always persists the refund's
    /// final `status` rather than exposing a separate update path.
    pub async fn insert(&self, ctx: &TenantCtx, refund: &Refund) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO refunds (id, tenant_id, payment_id, amount, reason_code, reason, status, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(refund.id)
        .bind(ctx.tenant_id)
        .bind(refund.payment_id)
        .bind(refund.amount)
        .bind(reason_code_to_str(refund.reason_code))
        .bind(&refund.reason)
        .bind(refund_status_to_str(refund.status))
        .bind(refund.created_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// A payment may be refunded at most once.
    pub async fn exists_for_payment(&self, ctx: &TenantCtx, payment_id: crate::ids::PaymentId) -> DomainResult<bool> {
        let row: (i64,) = sqlx::query_as(
            r#"SELECT COUNT(*) FROM refunds WHERE payment_id = $1 AND tenant_id = $2"#,
        )
        .bind(payment_id)
        .bind(ctx.tenant_id)
        .fetch_one(self.pool)
        .await?;
        Ok(row.0 > 0)
    }
}

pub struct WebhookLogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WebhookLogRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Records an inbound webhook delivery. Returns `false` without
    /// inserting if `(provider, external_reference)` was already seen,
    /// making repeated at-least-once provider deliveries a no-op via the
    /// DB unique constraint rather than in-memory dedup.
    pub async fn record_if_new(
        &self,
        provider: &str,
        external_reference: &str,
        action_type: &str,
        status: &str,
        payload: &serde_json::Value,
    ) -> DomainResult<bool> {
        let result = sqlx::query(
            r#"INSERT INTO webhook_logs (id, provider, external_reference, action_type, status, payload)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (provider, external_reference) DO NOTHING"#,
        )
        .bind(uuid::Uuid::new_v4())
        .bind(provider)
        .bind(external_reference)
        .bind(action_type)
        .bind(status)
        .bind(payload)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

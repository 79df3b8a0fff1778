//! QR provider webhook ingestion: look up the idempotency log first, then
//! the intent by its idempotency key, then dispatch by the provider's
//! reported status. Delivery is at-least-once; safety comes from the
//! `(provider, external_reference)` unique constraint in `webhook_logs`,
//! not from in-memory dedup.

use super::provider::QrProviderStatus;
use super::repository::{PaymentIntentRepository, WebhookLogRepository};
use super::PaymentEngine;
use crate::db::TenantCtx;
use crate::error::DomainResult;

pub struct WebhookIngester {
    pool: sqlx::PgPool,
    engine: PaymentEngine,
}

impl WebhookIngester {
    pub fn new(pool: sqlx::PgPool, engine: PaymentEngine) -> Self {
        Self { pool, engine }
    }

    /// `external_reference` is the idempotency key the intent was created
    /// with, per the provider's charge-creation contract.
    pub async fn ingest(
        &self,
        provider: &str,
        external_reference: &str,
        status: QrProviderStatus,
        payload: serde_json::Value,
    ) -> DomainResult<()> {
        let status_str = match status {
            QrProviderStatus::Paid => "paid",
            QrProviderStatus::Cancelled => "cancelled",
            QrProviderStatus::Expired => "expired",
            QrProviderStatus::Pending => "pending",
        };

        let log_repo = WebhookLogRepository::new(&self.pool);
        let is_new = log_repo
            .record_if_new(provider, external_reference, "payment_update", status_str, &payload)
            .await?;
        if !is_new {
            tracing::info!(provider, external_reference, "duplicate webhook delivery, ignoring");
            return Ok(());
        }

        let (tenant_id, intent) = PaymentIntentRepository::new(&self.pool)
            .find_by_idempotency_key_any_tenant(external_reference)
            .await?;
        let ctx = TenantCtx::new(tenant_id);

        use crate::domain::payment::PaymentIntentStatus;
        if !matches!(intent.status, PaymentIntentStatus::Pending | PaymentIntentStatus::InProgress) {
            tracing::info!(external_reference, "intent already resolved, ignoring webhook");
            return Ok(());
        }

        match status {
            QrProviderStatus::Paid => {
                self.engine.complete_intent(&ctx, intent.id).await?;
            }
            QrProviderStatus::Cancelled | QrProviderStatus::Expired => {
                self.engine.fail_intent(&ctx, intent.id).await?;
            }
            QrProviderStatus::Pending => {
                // Nothing resolved yet; wait for the next delivery.
            }
        }
        Ok(())
    }
}

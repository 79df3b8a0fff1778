//! Background sweep of TTL-expired drafts. Spawned once at startup
//! alongside the server.

use super::repository::DraftRepository;
use super::DraftCoordinator;
use crate::db::TenantCtx;
use crate::ids::TenantId;
use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration as StdDuration;

/// A re-runnable tenant lister. Boxed-future rather than a plain `Fn() ->
/// Vec<TenantId>` because listing tenants is itself a database query.
pub type TenantLister = Box<dyn Fn() -> Pin<Box<dyn Future<Output = Vec<TenantId>> + Send>> + Send>;

/// Sweeps every tenant's expired drafts on a fixed interval. Tenants are
/// supplied as a snapshot rather than discovered dynamically — the caller
/// (main.rs) re-lists them from `table_sessions` each tick.
pub fn spawn(coordinator: DraftCoordinator, interval: StdDuration, tenant_ids: TenantLister) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            for tenant_id in tenant_ids().await {
                let ctx = TenantCtx::new(tenant_id);
                let repo = DraftRepository::new(coordinator.pool());
                let expired = match repo.find_expired(&ctx, Utc::now()).await {
                    Ok(drafts) => drafts,
                    Err(err) => {
                        tracing::error!(?err, %tenant_id, "failed to list expired drafts");
                        continue;
                    }
                };
                for draft in expired {
                    if let Err(err) = coordinator.expire(&ctx, draft.id).await {
                        tracing::warn!(?err, draft_id = %draft.id, "failed to expire draft");
                    }
                }
            }
        }
    });
}

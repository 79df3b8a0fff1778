//! Process entry point: load config, stand up persistence and the
//! in-process event bus, wire every service into `AppState`, spawn the
//! draft-expiry sweeper, and serve.

use resto_core::api::state::AppState;
use resto_core::auth::token::TokenValidator;
use resto_core::config::AppConfig;
use resto_core::db::{schema, Database};
use resto_core::draft::{sweeper, DraftCoordinator};
use resto_core::events::EventBus;
use resto_core::ids::TenantId;
use resto_core::payment::provider::HttpQrProvider;
use resto_core::payment::PaymentEngine;
use resto_core::push::PushHub;
use resto_core::shift::ShiftLedger;
use resto_core::ticket::TicketDispatcher;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let _log_guard = resto_core::logging::init_logging(&config);

    let database = Database::connect(&config.database_url).await?;
    schema::bootstrap(database.pool()).await?;
    tracing::info!("schema bootstrap complete");

    let bus = EventBus::new();
    let push_hub = PushHub::new();
    push_hub.clone().spawn_fanout(bus.clone());

    let token_validator = Arc::new(TokenValidator::new(&config.jwt_secret));

    let lease_duration = chrono::Duration::from_std(config.draft_lease_duration)
        .map_err(|err| anyhow::anyhow!("invalid draft lease duration: {err}"))?;
    let default_ttl = chrono::Duration::from_std(config.draft_default_ttl)
        .map_err(|err| anyhow::anyhow!("invalid draft default ttl: {err}"))?;
    let drafts = DraftCoordinator::new(database.pool().clone(), bus.clone(), lease_duration, default_ttl);
    let tickets = TicketDispatcher::new(database.pool().clone(), bus.clone());

    let shifts = ShiftLedger::new(database.pool().clone(), bus.clone());

    let qr_provider: Arc<dyn resto_core::payment::provider::QrProvider> = Arc::new(HttpQrProvider::new(
        config.qr_provider_base_url.clone(),
        config.qr_provider_timeout,
    ));
    let qr_ttl = chrono::Duration::minutes(15);
    let payments = PaymentEngine::new(database.pool().clone(), bus.clone(), qr_provider, qr_ttl, shifts.clone());

    let state = AppState {
        pool: database.pool().clone(),
        push_hub,
        token_validator,
        drafts: drafts.clone(),
        tickets,
        payments,
        shifts,
    };

    let sweep_pool = database.pool().clone();
    sweeper::spawn(
        drafts,
        config.draft_sweep_interval,
        Box::new(move || {
            let pool = sweep_pool.clone();
            Box::pin(active_tenant_ids(pool))
        }),
    );

    let app = resto_core::api::build_router(state);
    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "resto-core listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Snapshots every tenant id with at least one table session, re-read
/// each sweep tick rather than cached once at startup.
async fn active_tenant_ids(pool: sqlx::PgPool) -> Vec<TenantId> {
    match sqlx::query_as::<_, (TenantId,)>("SELECT DISTINCT tenant_id FROM table_sessions")
        .fetch_all(&pool)
        .await
    {
        Ok(rows) => rows.into_iter().map(|(id,)| id).collect(),
        Err(err) => {
            tracing::error!(?err, "failed to list active tenants for draft sweep");
            Vec::new()
        }
    }
}

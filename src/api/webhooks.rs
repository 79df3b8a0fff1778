//! QR provider webhook ingestion. No `AuthContext` here — the
//! provider calls this endpoint directly, authenticated only by knowing
//! the idempotency key it was given at charge creation. Safety comes from
//! the unique `(provider, external_reference)` constraint, not a bearer
//! token.

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::state::AppState;
use crate::payment::provider::QrProviderStatus;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct QrWebhookPayload {
    pub external_reference: String,
    pub status: String,
    #[serde(flatten)]
    pub raw: serde_json::Value,
}

pub async fn qr_webhook(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(payload): Json<QrWebhookPayload>,
) -> ApiResult<()> {
    let status = match payload.status.as_str() {
        "paid" | "closed" => QrProviderStatus::Paid,
        "cancelled" => QrProviderStatus::Cancelled,
        "expired" => QrProviderStatus::Expired,
        _ => QrProviderStatus::Pending,
    };

    let ingester = crate::payment::webhook::WebhookIngester::new(state.pool.clone(), state.payments.clone());
    ingester.ingest(&provider, &payload.external_reference, status, payload.raw).await?;
    Ok(ApiResponse::new(()))
}

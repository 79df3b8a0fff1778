//! QR payment provider adapter. The provider is an external collaborator
//! reached over HTTP; `QrProvider` is the seam a fake can stand in for
//! in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct CreateChargeRequest {
    pub external_reference: String,
    pub amount: rust_decimal::Decimal,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateChargeResponse {
    pub qr_payload: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrProviderStatus {
    Paid,
    Cancelled,
    Expired,
    Pending,
}

#[async_trait]
pub trait QrProvider: Send + Sync {
    async fn create_charge(&self, request: CreateChargeRequest) -> Result<CreateChargeResponse, crate::error::DomainError>;
    async fn query_status(&self, external_reference: &str) -> Result<QrProviderStatus, crate::error::DomainError>;
}

pub struct HttpQrProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpQrProvider {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client builds with a fixed timeout");
        Self { client, base_url }
    }
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
}

#[async_trait]
impl QrProvider for HttpQrProvider {
    async fn create_charge(&self, request: CreateChargeRequest) -> Result<CreateChargeResponse, crate::error::DomainError> {
        let response = self
            .client
            .post(format!("{}/v1/charges", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|err| crate::error::DomainError::ExternalUnavailable(err.to_string()))?;

        if !response.status().is_success() {
            return Err(crate::error::DomainError::ExternalUnavailable(format!(
                "qr provider returned {}",
                response.status()
            )));
        }

        response
            .json::<CreateChargeResponse>()
            .await
            .map_err(|err| crate::error::DomainError::ExternalUnavailable(err.to_string()))
    }

    async fn query_status(&self, external_reference: &str) -> Result<QrProviderStatus, crate::error::DomainError> {
        let response = self
            .client
            .get(format!("{}/v1/charges/{}", self.base_url, external_reference))
            .send()
            .await
            .map_err(|err| crate::error::DomainError::ExternalUnavailable(err.to_string()))?;

        let body: StatusResponse = response
            .json()
            .await
            .map_err(|err| crate::error::DomainError::ExternalUnavailable(err.to_string()))?;

        Ok(match body.status.as_str() {
            "paid" | "closed" => QrProviderStatus::Paid,
            "cancelled" => QrProviderStatus::Cancelled,
            "expired" => QrProviderStatus::Expired,
            _ => QrProviderStatus::Pending,
        })
    }
}

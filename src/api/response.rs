//! Response envelope. Domain errors map to HTTP statuses through
//! `DomainError::into_response`; this envelope only wraps the success
//! path so every 2xx body has the same `data` shape.

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> axum::response::IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::DomainError>;

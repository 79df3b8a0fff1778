//! Crate-wide error taxonomy and its HTTP status mapping.
//!
//! Every domain-layer function returns `Result<T, DomainError>` (or a more
//! specific variant wrapped into one via `#[from]`/`?`) rather than raising
//! exceptions. One `IntoResponse` impl at the bottom performs the single
//! translation into the wire format, keeping a typed error with one
//! boundary adapter rather than scattering status codes through handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("version conflict: expected {expected}, row is at a different version")]
    VersionConflict { expected: i64 },

    #[error("lock conflict: draft is held by another user")]
    LockConflict,

    #[error("lock not held by caller")]
    LockNotHeld,

    #[error("lock cannot be acquired in current state: {0}")]
    LockInvalidState(String),

    #[error("operation not valid in current state: {0}")]
    InvalidTransition(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("QR code has expired")]
    ExpiredQr,

    #[error("external payment provider unavailable: {0}")]
    ExternalUnavailable(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn status(&self) -> StatusCode {
        match self {
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            DomainError::VersionConflict { .. } | DomainError::LockConflict => {
                StatusCode::CONFLICT
            }
            DomainError::LockNotHeld => StatusCode::FORBIDDEN,
            DomainError::LockInvalidState(_)
            | DomainError::InvalidTransition(_)
            | DomainError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DomainError::ExpiredQr => StatusCode::GONE,
            DomainError::ExternalUnavailable(_) => StatusCode::BAD_GATEWAY,
            DomainError::Database(_) | DomainError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DomainError::NotFound(_) => "NOT_FOUND",
            DomainError::PermissionDenied(_) => "PERMISSION_DENIED",
            DomainError::VersionConflict { .. } => "VERSION_CONFLICT",
            DomainError::LockConflict => "LOCK_CONFLICT",
            DomainError::LockNotHeld => "LOCK_NOT_HELD",
            DomainError::LockInvalidState(_) => "LOCK_INVALID_STATE",
            DomainError::InvalidTransition(_) => "INVALID_TRANSITION",
            DomainError::BadRequest(_) => "BAD_REQUEST",
            DomainError::ExpiredQr => "EXPIRED_QR",
            DomainError::ExternalUnavailable(_) => "EXTERNAL_UNAVAILABLE",
            DomainError::Database(_) => "INTERNAL",
            DomainError::Internal(_) => "INTERNAL",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "internal error");
        }
        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_conflict_maps_to_409() {
        let err = DomainError::VersionConflict { expected: 3 };
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(DomainError::NotFound("draft").status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn expired_qr_maps_to_410() {
        assert_eq!(DomainError::ExpiredQr.status(), StatusCode::GONE);
    }
}

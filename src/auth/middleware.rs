//! Axum auth middleware: pull the bearer header, validate it, and inject
//! the resolved context as a request extension for handlers to pull out
//! with `Extension<AuthContext>`.

use crate::api::state::AppState;
use crate::auth::AuthContext;
use crate::error::DomainError;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, DomainError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| DomainError::PermissionDenied("missing authorization header".into()))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| DomainError::PermissionDenied("authorization header is not a bearer token".into()))?;

    let claims = state
        .token_validator
        .validate(token)
        .map_err(|_| DomainError::PermissionDenied("invalid or expired token".into()))?;

    request.extensions_mut().insert(AuthContext {
        user_id: claims.sub,
        tenant_id: claims.tenant_id,
        role: claims.role,
    });

    Ok(next.run(request).await)
}

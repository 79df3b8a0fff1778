//! Table session endpoints. Table sessions are simple enough (open/close,
//! no multi-step state machine) that their persistence lives here instead
//! of under its own top-level module.

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::state::AppState;
use crate::auth::{AuthContext, Permission};
use crate::domain::table_session::TableSession;
use crate::error::DomainError;
use crate::ids::{TableId, TableSessionId};
use axum::extract::{Extension, Path, State};
use axum::Json;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct OpenTableSessionRequest {
    pub table_id: TableId,
}

pub async fn open_table_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<OpenTableSessionRequest>,
) -> ApiResult<TableSession> {
    auth.require(Permission::OpenTableSession)?;
    let ctx = auth.tenant_ctx();
    let session = TableSession::open(request.table_id, auth.user_id);

    sqlx::query(
        r#"INSERT INTO table_sessions (id, tenant_id, table_id, status, server_id, version, created_at, updated_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $7)"#,
    )
    .bind(session.id)
    .bind(ctx.tenant_id)
    .bind(session.table_id)
    .bind("open")
    .bind(session.opened_by)
    .bind(session.version)
    .bind(session.opened_at)
    .execute(&state.pool)
    .await?;

    Ok(ApiResponse::new(session))
}

pub async fn close_table_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(table_session_id): Path<TableSessionId>,
) -> ApiResult<()> {
    let ctx = auth.tenant_ctx();
    let result = sqlx::query(
        r#"UPDATE table_sessions SET status = 'closed', updated_at = now(), version = version + 1
           WHERE id = $1 AND tenant_id = $2 AND status = 'open'"#,
    )
    .bind(table_session_id)
    .bind(ctx.tenant_id)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DomainError::NotFound("table_session"));
    }
    Ok(ApiResponse::new(()))
}

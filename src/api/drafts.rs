//! Draft order endpoints.

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::state::AppState;
use crate::auth::{AuthContext, Permission};
use crate::domain::draft_order::DraftOrder;
use crate::ids::{DraftOrderId, MenuItemId, TableSessionId};
use crate::money::Money;
use axum::extract::{Extension, Path, State};
use axum::Json;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateDraftRequest {
    pub table_session_id: TableSessionId,
}

pub async fn create_draft(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateDraftRequest>,
) -> ApiResult<DraftOrder> {
    let ctx = auth.tenant_ctx();
    let draft = state.drafts.create(&ctx, request.table_session_id).await?;
    Ok(ApiResponse::new(draft))
}

#[derive(Deserialize)]
pub struct AddLineItemRequest {
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
    pub unit_price: Money,
    pub notes: Option<String>,
}

pub async fn add_line_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(draft_id): Path<DraftOrderId>,
    Json(request): Json<AddLineItemRequest>,
) -> ApiResult<DraftOrder> {
    let ctx = auth.tenant_ctx();
    let draft = state
        .drafts
        .add_line_item(&ctx, draft_id, request.menu_item_id, request.quantity, request.unit_price, request.notes)
        .await?;
    Ok(ApiResponse::new(draft))
}

pub async fn acquire_lock(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(draft_id): Path<DraftOrderId>,
) -> ApiResult<DraftOrder> {
    let ctx = auth.tenant_ctx();
    let draft = state.drafts.acquire_lock(&ctx, draft_id, auth.user_id).await?;
    Ok(ApiResponse::new(draft))
}

pub async fn release_lock(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(draft_id): Path<DraftOrderId>,
) -> ApiResult<DraftOrder> {
    let ctx = auth.tenant_ctx();
    let draft = state.drafts.release_lock(&ctx, draft_id, auth.user_id).await?;
    Ok(ApiResponse::new(draft))
}

pub async fn submit_draft(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(draft_id): Path<DraftOrderId>,
) -> ApiResult<DraftOrder> {
    auth.require(Permission::SubmitDraft)?;
    let ctx = auth.tenant_ctx();
    let draft = state.drafts.submit(&ctx, draft_id).await?;
    Ok(ApiResponse::new(draft))
}

pub async fn confirm_draft(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(draft_id): Path<DraftOrderId>,
) -> ApiResult<crate::domain::order::Order> {
    auth.require(Permission::ConfirmDraft)?;
    let ctx = auth.tenant_ctx();
    let order = state.drafts.confirm(&ctx, draft_id, auth.user_id, &state.tickets).await?;
    Ok(ApiResponse::new(order))
}

#[derive(Deserialize)]
pub struct RejectDraftRequest {
    pub reason: String,
}

pub async fn reject_draft(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(draft_id): Path<DraftOrderId>,
    Json(request): Json<RejectDraftRequest>,
) -> ApiResult<DraftOrder> {
    auth.require(Permission::RejectDraft)?;
    let ctx = auth.tenant_ctx();
    let draft = state.drafts.reject(&ctx, draft_id, auth.user_id, request.reason).await?;
    Ok(ApiResponse::new(draft))
}

#[derive(Deserialize)]
pub struct ReassignDraftRequest {
    pub new_table_session_id: TableSessionId,
}

pub async fn reassign_draft(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(draft_id): Path<DraftOrderId>,
    Json(request): Json<ReassignDraftRequest>,
) -> ApiResult<DraftOrder> {
    auth.require(Permission::ReassignDraft)?;
    let ctx = auth.tenant_ctx();
    let draft = state.drafts.reassign(&ctx, draft_id, request.new_table_session_id).await?;
    Ok(ApiResponse::new(draft))
}

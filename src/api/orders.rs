//! Order read/cancel endpoints. Orders are created as a side effect of
//! draft confirmation (`api::drafts::confirm_draft`); this module only
//! exposes reads and the cancel path.

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::state::AppState;
use crate::auth::{AuthContext, Permission};
use crate::domain::adjustment::{AdjustmentKind, OrderAdjustment};
use crate::domain::order::Order;
use crate::domain::ticket::TicketStatus;
use crate::draft::repository::{AdjustmentRepository, OrderRepository};
use crate::error::DomainError;
use crate::ids::OrderId;
use crate::money::SignedMoney;
use crate::ticket::repository::TicketRepository;
use axum::extract::{Extension, Path, State};
use serde::Deserialize;

pub async fn get_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(order_id): Path<OrderId>,
) -> ApiResult<Order> {
    let ctx = auth.tenant_ctx();
    let order = OrderRepository::new(&state.pool).get(&ctx, order_id).await?;
    Ok(ApiResponse::new(order))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(order_id): Path<OrderId>,
) -> ApiResult<Order> {
    let ctx = auth.tenant_ctx();
    let repo = OrderRepository::new(&state.pool);
    let mut order = repo.get(&ctx, order_id).await?;
    let expected_version = order.version;
    order.cancel()?;
    repo.save_cas(&ctx, &order, expected_version).await?;
    Ok(ApiResponse::new(order))
}

/// Closes out a fully paid order once every ticket it dispatched has
/// reached a terminal state — the kitchen side of an order outliving the
/// payment side would otherwise let a table be marked done mid-prep.
pub async fn complete_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(order_id): Path<OrderId>,
) -> ApiResult<Order> {
    auth.require(Permission::CompleteOrder)?;
    let ctx = auth.tenant_ctx();

    let tickets = TicketRepository::new(&state.pool).find_by_order(&ctx, order_id).await?;
    if !tickets.iter().all(|t| matches!(t.status, TicketStatus::Completed | TicketStatus::Voided)) {
        return Err(DomainError::BadRequest("order has tickets that have not yet completed or been voided".into()));
    }

    let repo = OrderRepository::new(&state.pool);
    let mut order = repo.get(&ctx, order_id).await?;
    let expected_version = order.version;
    order.complete()?;
    repo.save_cas(&ctx, &order, expected_version).await?;
    Ok(ApiResponse::new(order))
}

#[derive(Debug, Deserialize)]
pub struct ApplyAdjustmentRequest {
    pub kind: AdjustmentKind,
    pub amount: SignedMoney,
    pub reason: String,
}

pub async fn apply_adjustment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(order_id): Path<OrderId>,
    axum::Json(request): axum::Json<ApplyAdjustmentRequest>,
) -> ApiResult<OrderAdjustment> {
    auth.require(Permission::ApplyAdjustment)?;
    let ctx = auth.tenant_ctx();

    // Confirm the order exists (and belongs to this tenant) before ledgering
    // an adjustment against it.
    OrderRepository::new(&state.pool).get(&ctx, order_id).await?;

    let adjustment = OrderAdjustment::new(order_id, request.kind, request.amount, request.reason, auth.user_id);
    AdjustmentRepository::new(&state.pool).insert(&ctx, &adjustment).await?;
    Ok(ApiResponse::new(adjustment))
}

pub async fn list_adjustments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(order_id): Path<OrderId>,
) -> ApiResult<Vec<OrderAdjustment>> {
    let ctx = auth.tenant_ctx();
    let adjustments = AdjustmentRepository::new(&state.pool).list_for_order(&ctx, order_id).await?;
    Ok(ApiResponse::new(adjustments))
}

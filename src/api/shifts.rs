//! Shift and cash-drawer endpoints. `ApproveCashEvent` is checked
//! here rather than inside `ShiftLedger`, since approval is an authorization
//! concern on top of the shift's own state machine.

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::state::AppState;
use crate::auth::{AuthContext, Permission};
use crate::domain::shift::{CashDrawerEvent, CashDrawerEventKind, Shift};
use crate::ids::{ShiftId, UserId};
use crate::money::{Money, SignedMoney};
use axum::extract::{Extension, Path, State};
use axum::Json;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct OpenShiftRequest {
    pub server_id: UserId,
    pub opening_balance: Money,
}

pub async fn open_shift(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<OpenShiftRequest>,
) -> ApiResult<Shift> {
    auth.require(Permission::OpenShift)?;
    let ctx = auth.tenant_ctx();
    let shift = state.shifts.open(&ctx, request.server_id, request.opening_balance).await?;
    Ok(ApiResponse::new(shift))
}

#[derive(Deserialize)]
pub struct CloseShiftRequest {
    pub closing_cash_count: Money,
}

pub async fn close_shift(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shift_id): Path<ShiftId>,
    Json(request): Json<CloseShiftRequest>,
) -> ApiResult<Shift> {
    auth.require(Permission::CloseShift)?;
    let ctx = auth.tenant_ctx();
    let shift = state.shifts.close(&ctx, shift_id, request.closing_cash_count).await?;
    Ok(ApiResponse::new(shift))
}

pub async fn reconcile_shift(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shift_id): Path<ShiftId>,
) -> ApiResult<Shift> {
    auth.require(Permission::ReconcileShift)?;
    let ctx = auth.tenant_ctx();
    let shift = state.shifts.reconcile(&ctx, shift_id).await?;
    Ok(ApiResponse::new(shift))
}

#[derive(Deserialize)]
pub struct RecordCashDrawerEventRequest {
    pub kind: CashDrawerEventKind,
    pub amount: SignedMoney,
    pub reason: String,
    pub approved_by: Option<UserId>,
}

pub async fn record_cash_drawer_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shift_id): Path<ShiftId>,
    Json(request): Json<RecordCashDrawerEventRequest>,
) -> ApiResult<CashDrawerEvent> {
    auth.require(Permission::RecordCashEvent)?;
    if request.approved_by.is_some() {
        auth.require(Permission::ApproveCashEvent)?;
    }
    let ctx = auth.tenant_ctx();
    let event = state
        .shifts
        .record_cash_drawer_event(&ctx, shift_id, request.kind, request.amount, auth.user_id, request.approved_by, request.reason)
        .await?;
    Ok(ApiResponse::new(event))
}

pub async fn shift_ledger(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shift_id): Path<ShiftId>,
) -> ApiResult<Vec<CashDrawerEvent>> {
    let ctx = auth.tenant_ctx();
    let ledger = state.shifts.ledger(&ctx, shift_id).await?;
    Ok(ApiResponse::new(ledger))
}

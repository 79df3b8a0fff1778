//! Kitchen ticket endpoints: station queue view plus the
//! hold/fire/bump/void/reassign transitions kitchen staff drive.

use crate::api::response::{ApiResponse, ApiResult};
use crate::api::state::AppState;
use crate::auth::{AuthContext, Permission};
use crate::domain::ticket::Ticket;
use crate::ids::{MenuStationId, TicketId};
use axum::extract::{Extension, Path, State};
use axum::Json;
use serde::Deserialize;

pub async fn station_queue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(station_id): Path<MenuStationId>,
) -> ApiResult<Vec<Ticket>> {
    auth.require(Permission::ViewTicketQueue)?;
    let ctx = auth.tenant_ctx();
    let tickets = state.tickets.station_queue(&ctx, station_id).await?;
    Ok(ApiResponse::new(tickets))
}

#[derive(Deserialize)]
pub struct HoldTicketRequest {
    pub reason: String,
}

pub async fn hold_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(ticket_id): Path<TicketId>,
    Json(request): Json<HoldTicketRequest>,
) -> ApiResult<Ticket> {
    auth.require(Permission::HoldTicket)?;
    let ctx = auth.tenant_ctx();
    let ticket = state.tickets.hold(&ctx, ticket_id, request.reason).await?;
    Ok(ApiResponse::new(ticket))
}

pub async fn fire_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(ticket_id): Path<TicketId>,
) -> ApiResult<Ticket> {
    auth.require(Permission::FireTicket)?;
    let ctx = auth.tenant_ctx();
    let ticket = state.tickets.fire(&ctx, ticket_id).await?;
    Ok(ApiResponse::new(ticket))
}

pub async fn bump_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(ticket_id): Path<TicketId>,
) -> ApiResult<Ticket> {
    auth.require(Permission::BumpTicket)?;
    let ctx = auth.tenant_ctx();
    let ticket = state.tickets.bump(&ctx, ticket_id).await?;
    Ok(ApiResponse::new(ticket))
}

#[derive(Deserialize)]
pub struct VoidTicketRequest {
    pub reason: String,
}

pub async fn void_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(ticket_id): Path<TicketId>,
    Json(request): Json<VoidTicketRequest>,
) -> ApiResult<Ticket> {
    auth.require(Permission::VoidTicket)?;
    let ctx = auth.tenant_ctx();
    let ticket = state.tickets.void(&ctx, ticket_id, request.reason).await?;
    Ok(ApiResponse::new(ticket))
}

#[derive(Deserialize)]
pub struct ReassignTicketRequest {
    pub new_station_id: MenuStationId,
}

pub async fn reassign_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(ticket_id): Path<TicketId>,
    Json(request): Json<ReassignTicketRequest>,
) -> ApiResult<Ticket> {
    auth.require(Permission::VoidTicket)?;
    let ctx = auth.tenant_ctx();
    let ticket = state.tickets.reassign(&ctx, ticket_id, request.new_station_id).await?;
    Ok(ApiResponse::new(ticket))
}

pub async fn reprint_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(ticket_id): Path<TicketId>,
) -> ApiResult<Ticket> {
    auth.require(Permission::ReprintTicket)?;
    let ctx = auth.tenant_ctx();
    let ticket = state.tickets.reprint(&ctx, ticket_id).await?;
    Ok(ApiResponse::new(ticket))
}

//! HTTP and WebSocket router assembly: public routes mounted bare,
//! everything else behind `auth::middleware::auth_middleware` via
//! `from_fn_with_state`.

pub mod drafts;
pub mod orders;
pub mod payments;
pub mod response;
pub mod shifts;
pub mod state;
pub mod table_sessions;
pub mod tickets;
pub mod webhooks;

use crate::auth::middleware::auth_middleware;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use state::AppState;

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/table-sessions", post(table_sessions::open_table_session))
        .route("/table-sessions/{id}/close", post(table_sessions::close_table_session))
        .route("/drafts", post(drafts::create_draft))
        .route("/drafts/{id}/line-items", post(drafts::add_line_item))
        .route("/drafts/{id}/lock", post(drafts::acquire_lock))
        .route("/drafts/{id}/lock/release", post(drafts::release_lock))
        .route("/drafts/{id}/submit", post(drafts::submit_draft))
        .route("/drafts/{id}/confirm", post(drafts::confirm_draft))
        .route("/drafts/{id}/reject", post(drafts::reject_draft))
        .route("/drafts/{id}/reassign", post(drafts::reassign_draft))
        .route("/orders/{id}", get(orders::get_order))
        .route("/orders/{id}/cancel", post(orders::cancel_order))
        .route("/orders/{id}/complete", post(orders::complete_order))
        .route("/orders/{id}/adjustments", post(orders::apply_adjustment).get(orders::list_adjustments))
        .route("/stations/{id}/queue", get(tickets::station_queue))
        .route("/tickets/{id}/hold", post(tickets::hold_ticket))
        .route("/tickets/{id}/fire", post(tickets::fire_ticket))
        .route("/tickets/{id}/bump", post(tickets::bump_ticket))
        .route("/tickets/{id}/void", post(tickets::void_ticket))
        .route("/tickets/{id}/reassign", post(tickets::reassign_ticket))
        .route("/tickets/{id}/reprint", post(tickets::reprint_ticket))
        .route("/payments/{method}", post(payments::pay))
        .route("/payments/split", post(payments::split_payment))
        .route("/payments/{id}/resolve", post(payments::resolve_payment))
        .route("/payments/{id}/refund", post(payments::refund_payment))
        .route("/shifts", post(shifts::open_shift))
        .route("/shifts/{id}/close", post(shifts::close_shift))
        .route("/shifts/{id}/reconcile", post(shifts::reconcile_shift))
        .route("/shifts/{id}/cash-events", post(shifts::record_cash_drawer_event))
        .route("/shifts/{id}/ledger", get(shifts::shift_ledger))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let public = Router::new()
        .route("/webhooks/qr/{provider}", post(webhooks::qr_webhook))
        .route("/ws/table/{id}", get(crate::push::ws::table_ws))
        .route("/ws/user/{id}", get(crate::push::ws::user_ws))
        .route("/ws/station/{id}", get(crate::push::ws::station_ws));

    Router::new().merge(protected).merge(public).with_state(state)
}

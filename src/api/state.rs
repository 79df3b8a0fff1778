//! Shared application state: one `Arc`-friendly struct holding every
//! service a handler needs, built once at startup and cloned into the
//! axum router.

use crate::auth::token::TokenValidator;
use crate::draft::DraftCoordinator;
use crate::payment::PaymentEngine;
use crate::push::PushHub;
use crate::shift::ShiftLedger;
use crate::ticket::TicketDispatcher;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub push_hub: PushHub,
    pub token_validator: Arc<TokenValidator>,
    pub drafts: DraftCoordinator,
    pub tickets: TicketDispatcher,
    pub payments: PaymentEngine,
    pub shifts: ShiftLedger,
}

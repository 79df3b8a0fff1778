//! Shift ledger service: open/close/reconcile a server's shift and
//! append cash-drawer events. Permission checks for who may approve a
//! cash-drawer event live at the API layer (`auth::Permission::ApproveCashEvent`);
//! this service only enforces the shift's own state machine.

pub mod repository;

use crate::db::TenantCtx;
use crate::domain::shift::{CashDrawerEvent, CashDrawerEventKind, Shift};
use crate::error::DomainResult;
use crate::events::{DomainEvent, EventBus};
use crate::ids::{ShiftId, UserId};
use crate::money::{Money, SignedMoney};
use repository::{CashDrawerLedger, ShiftRepository};
use sqlx::PgPool;

#[derive(Clone)]
pub struct ShiftLedger {
    pool: PgPool,
    bus: EventBus,
}

impl ShiftLedger {
    pub fn new(pool: PgPool, bus: EventBus) -> Self {
        Self { pool, bus }
    }

    pub async fn open(&self, ctx: &TenantCtx, server_id: UserId, opening_balance: Money) -> DomainResult<Shift> {
        let shift = Shift::open(server_id, opening_balance);
        ShiftRepository::new(&self.pool).insert(ctx, &shift).await?;

        CashDrawerLedger::new(&self.pool)
            .append(
                ctx,
                shift.id,
                CashDrawerEventKind::OpeningBalance,
                SignedMoney::positive(opening_balance),
                server_id,
                None,
                "shift opened",
                opening_balance,
            )
            .await?;

        self.bus.publish(DomainEvent::ShiftOpened { shift_id: shift.id, server_id });
        Ok(shift)
    }

    /// The server's currently active shift, or a `BadRequest` if they have
    /// none open. Used to gate cash payments on an open drawer.
    pub async fn require_active_for_server(&self, ctx: &TenantCtx, server_id: UserId) -> DomainResult<Shift> {
        ShiftRepository::new(&self.pool)
            .find_active_for_server(ctx, server_id)
            .await?
            .ok_or_else(|| crate::error::DomainError::BadRequest("server has no open shift".into()))
    }

    pub async fn record_cash_sale(&self, ctx: &TenantCtx, shift_id: ShiftId, amount: Money) -> DomainResult<Shift> {
        self.mutate(ctx, shift_id, |shift| shift.record_cash_sale(amount)).await
    }

    pub async fn record_card_sale(&self, ctx: &TenantCtx, shift_id: ShiftId, amount: Money) -> DomainResult<Shift> {
        self.mutate(ctx, shift_id, |shift| shift.record_card_sale(amount)).await
    }

    pub async fn record_tip(&self, ctx: &TenantCtx, shift_id: ShiftId, amount: Money) -> DomainResult<Shift> {
        self.mutate(ctx, shift_id, |shift| shift.record_tip(amount)).await
    }

    pub async fn close(&self, ctx: &TenantCtx, shift_id: ShiftId, closing_cash_count: Money) -> DomainResult<Shift> {
        let shift = self.mutate(ctx, shift_id, |shift| shift.close(closing_cash_count)).await?;
        self.bus.publish(DomainEvent::ShiftClosed { shift_id, server_id: shift.server_id });
        Ok(shift)
    }

    pub async fn reconcile(&self, ctx: &TenantCtx, shift_id: ShiftId) -> DomainResult<Shift> {
        let shift = self.mutate(ctx, shift_id, |shift| shift.reconcile()).await?;
        self.bus.publish(DomainEvent::ShiftReconciled { shift_id, server_id: shift.server_id });
        Ok(shift)
    }

    async fn mutate(
        &self,
        ctx: &TenantCtx,
        shift_id: ShiftId,
        apply: impl FnOnce(&mut Shift) -> Result<(), crate::error::DomainError>,
    ) -> DomainResult<Shift> {
        let repo = ShiftRepository::new(&self.pool);
        let mut shift = repo.get(ctx, shift_id).await?;
        let expected_version = shift.version;
        apply(&mut shift)?;
        repo.save_cas(ctx, &shift, expected_version).await?;
        Ok(shift)
    }

    /// Appends an entry to the shift's ledger, chaining `balance_after` off
    /// the previous entry rather than recomputing it from the shift's
    /// aggregate totals — the ledger is the source of truth for the
    /// running balance, the shift's `cash_sales` is a separate rollup.
    /// `approved_by` must already have been checked for
    /// `Permission::ApproveCashEvent` by the caller.
    pub async fn record_cash_drawer_event(
        &self,
        ctx: &TenantCtx,
        shift_id: ShiftId,
        kind: CashDrawerEventKind,
        amount: SignedMoney,
        recorded_by: UserId,
        approved_by: Option<UserId>,
        reason: String,
    ) -> DomainResult<CashDrawerEvent> {
        let ledger = CashDrawerLedger::new(&self.pool);
        let previous = ledger.last_balance(ctx, shift_id).await?.unwrap_or(Money::ZERO);
        let balance_after = Money::new(previous.as_decimal() + amount.as_decimal());

        ledger.append(ctx, shift_id, kind, amount, recorded_by, approved_by, &reason, balance_after).await
    }

    pub async fn ledger(&self, ctx: &TenantCtx, shift_id: ShiftId) -> DomainResult<Vec<CashDrawerEvent>> {
        CashDrawerLedger::new(&self.pool).list_for_shift(ctx, shift_id).await
    }
}

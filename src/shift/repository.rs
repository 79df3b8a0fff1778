//! `sqlx`-backed persistence for shifts and the append-only cash-drawer
//! ledger. The "at most one active shift per server" rule is
//! enforced by `db/schema.rs`'s partial unique index, not here — a second
//! `open` simply fails with a unique-violation that callers map to
//! `DomainError::BadRequest`.

use crate::db::cas::check_cas;
use crate::db::TenantCtx;
use crate::domain::shift::{CashDrawerEvent, CashDrawerEventKind, Shift, ShiftStatus};
use crate::error::{DomainError, DomainResult};
use crate::ids::{CashDrawerEventId, ShiftId, UserId};
use crate::money::{Money, SignedMoney};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

fn status_to_str(status: ShiftStatus) -> &'static str {
    match status {
        ShiftStatus::Active => "active",
        ShiftStatus::Closed => "closed",
        ShiftStatus::Reconciled => "reconciled",
    }
}

fn status_from_str(s: &str) -> DomainResult<ShiftStatus> {
    Ok(match s {
        "active" => ShiftStatus::Active,
        "closed" => ShiftStatus::Closed,
        "reconciled" => ShiftStatus::Reconciled,
        other => return Err(DomainError::Internal(format!("unknown shift status {other}"))),
    })
}

#[derive(FromRow)]
struct ShiftRow {
    id: ShiftId,
    server_id: UserId,
    status: String,
    opening_balance: Money,
    cash_sales: Money,
    card_sales: Money,
    tip_sales: Money,
    closing_cash_count: Option<Money>,
    expected_cash: Option<Money>,
    cash_variance: Option<Money>,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    version: i64,
}

impl ShiftRow {
    fn into_domain(self) -> DomainResult<Shift> {
        Ok(Shift {
            id: self.id,
            server_id: self.server_id,
            status: status_from_str(&self.status)?,
            opening_balance: self.opening_balance,
            cash_sales: self.cash_sales,
            card_sales: self.card_sales,
            tip_sales: self.tip_sales,
            closing_cash_count: self.closing_cash_count,
            expected_cash: self.expected_cash,
            cash_variance: self.cash_variance,
            opened_at: self.opened_at,
            closed_at: self.closed_at,
            version: self.version,
        })
    }
}

pub struct ShiftRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShiftRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fails with a database error (surfaced as 500 unless the caller maps
    /// the unique-violation code) if the server already has an open shift.
    pub async fn insert(&self, ctx: &TenantCtx, shift: &Shift) -> DomainResult<()> {
        let result = sqlx::query(
            r#"INSERT INTO shifts (id, tenant_id, server_id, status, version, opening_balance, cash_sales, card_sales, tip_sales, opened_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $7, $8)"#,
        )
        .bind(shift.id)
        .bind(ctx.tenant_id)
        .bind(shift.server_id)
        .bind(status_to_str(shift.status))
        .bind(shift.version)
        .bind(shift.opening_balance)
        .bind(Money::ZERO)
        .bind(shift.opened_at)
        .execute(self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(DomainError::BadRequest(
                "server already has an open shift".into(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get(&self, ctx: &TenantCtx, id: ShiftId) -> DomainResult<Shift> {
        sqlx::query_as::<_, ShiftRow>(
            r#"SELECT id, server_id, status, opening_balance, cash_sales, card_sales, tip_sales,
                      closing_cash_count, expected_cash, cash_variance, opened_at, closed_at, version
               FROM shifts WHERE id = $1 AND tenant_id = $2"#,
        )
        .bind(id)
        .bind(ctx.tenant_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(DomainError::NotFound("shift"))?
        .into_domain()
    }

    pub async fn find_active_for_server(&self, ctx: &TenantCtx, server_id: UserId) -> DomainResult<Option<Shift>> {
        let row = sqlx::query_as::<_, ShiftRow>(
            r#"SELECT id, server_id, status, opening_balance, cash_sales, card_sales, tip_sales,
                      closing_cash_count, expected_cash, cash_variance, opened_at, closed_at, version
               FROM shifts WHERE tenant_id = $1 AND server_id = $2 AND status = 'active'"#,
        )
        .bind(ctx.tenant_id)
        .bind(server_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(ShiftRow::into_domain).transpose()
    }

    pub async fn save_cas(&self, ctx: &TenantCtx, shift: &Shift, expected_version: i64) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE shifts SET
                   status = $1, cash_sales = $2, card_sales = $3, tip_sales = $4,
                   closing_cash_count = $5, expected_cash = $6, cash_variance = $7,
                   closed_at = $8, version = version + 1
               WHERE id = $9 AND tenant_id = $10 AND version = $11"#,
        )
        .bind(status_to_str(shift.status))
        .bind(shift.cash_sales)
        .bind(shift.card_sales)
        .bind(shift.tip_sales)
        .bind(shift.closing_cash_count)
        .bind(shift.expected_cash)
        .bind(shift.cash_variance)
        .bind(shift.closed_at)
        .bind(shift.id)
        .bind(ctx.tenant_id)
        .bind(expected_version)
        .execute(self.pool)
        .await?;

        check_cas(result.rows_affected(), expected_version)
    }
}

fn event_kind_to_str(kind: CashDrawerEventKind) -> &'static str {
    match kind {
        CashDrawerEventKind::OpeningBalance => "opening_balance",
        CashDrawerEventKind::PaymentIn => "payment_in",
        CashDrawerEventKind::ChangeOut => "change_out",
        CashDrawerEventKind::CashDrop => "cash_drop",
        CashDrawerEventKind::TipPayout => "tip_payout",
        CashDrawerEventKind::CashAdjustment => "cash_adjustment",
        CashDrawerEventKind::CashShortage => "cash_shortage",
        CashDrawerEventKind::PettyCash => "petty_cash",
        CashDrawerEventKind::Other => "other",
    }
}

fn event_kind_from_str(s: &str) -> DomainResult<CashDrawerEventKind> {
    Ok(match s {
        "opening_balance" => CashDrawerEventKind::OpeningBalance,
        "payment_in" => CashDrawerEventKind::PaymentIn,
        "change_out" => CashDrawerEventKind::ChangeOut,
        "cash_drop" => CashDrawerEventKind::CashDrop,
        "tip_payout" => CashDrawerEventKind::TipPayout,
        "cash_adjustment" => CashDrawerEventKind::CashAdjustment,
        "cash_shortage" => CashDrawerEventKind::CashShortage,
        "petty_cash" => CashDrawerEventKind::PettyCash,
        "other" => CashDrawerEventKind::Other,
        other => return Err(DomainError::Internal(format!("unknown cash drawer event kind {other}"))),
    })
}

#[derive(FromRow)]
struct CashDrawerEventRow {
    id: CashDrawerEventId,
    shift_id: ShiftId,
    sequence: i64,
    event_type: String,
    amount: SignedMoney,
    performed_by: UserId,
    approved_by: Option<UserId>,
    reason: String,
    created_at: DateTime<Utc>,
}

pub struct CashDrawerLedger<'a> {
    pool: &'a PgPool,
}

impl<'a> CashDrawerLedger<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Appends a new ledger row; `sequence` is assigned by the database's
    /// `BIGSERIAL` column so ordering is never contested between writers.
    pub async fn append(
        &self,
        ctx: &TenantCtx,
        shift_id: ShiftId,
        kind: CashDrawerEventKind,
        amount: SignedMoney,
        recorded_by: UserId,
        approved_by: Option<UserId>,
        reason: &str,
        balance_after: Money,
    ) -> DomainResult<CashDrawerEvent> {
        let row = sqlx::query_as::<_, CashDrawerEventRow>(
            r#"INSERT INTO cash_drawer_events
               (id, tenant_id, shift_id, event_type, amount, balance_after, performed_by, approved_by, reason)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               RETURNING id, shift_id, sequence, event_type, amount, performed_by, approved_by, reason, created_at"#,
        )
        .bind(CashDrawerEventId::new())
        .bind(ctx.tenant_id)
        .bind(shift_id)
        .bind(event_kind_to_str(kind))
        .bind(amount)
        .bind(balance_after)
        .bind(recorded_by)
        .bind(approved_by)
        .bind(reason)
        .fetch_one(self.pool)
        .await?;

        Ok(CashDrawerEvent {
            id: row.id,
            shift_id: row.shift_id,
            sequence: row.sequence,
            kind: event_kind_from_str(&row.event_type)?,
            amount: row.amount,
            recorded_by: row.performed_by,
            approved_by: row.approved_by,
            reason: row.reason,
            recorded_at: row.created_at,
        })
    }

    /// The running drawer balance after the most recently appended entry,
    /// or `None` if the shift's ledger is still empty.
    pub async fn last_balance(&self, ctx: &TenantCtx, shift_id: ShiftId) -> DomainResult<Option<Money>> {
        let row: Option<(Money,)> = sqlx::query_as(
            r#"SELECT balance_after FROM cash_drawer_events
               WHERE shift_id = $1 AND tenant_id = $2
               ORDER BY sequence DESC LIMIT 1"#,
        )
        .bind(shift_id)
        .bind(ctx.tenant_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(|(balance,)| balance))
    }

    pub async fn list_for_shift(&self, ctx: &TenantCtx, shift_id: ShiftId) -> DomainResult<Vec<CashDrawerEvent>> {
        let rows = sqlx::query_as::<_, CashDrawerEventRow>(
            r#"SELECT id, shift_id, sequence, event_type, amount, performed_by, approved_by, reason, created_at
               FROM cash_drawer_events WHERE shift_id = $1 AND tenant_id = $2 ORDER BY sequence ASC"#,
        )
        .bind(shift_id)
        .bind(ctx.tenant_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(CashDrawerEvent {
                    id: row.id,
                    shift_id: row.shift_id,
                    sequence: row.sequence,
                    kind: event_kind_from_str(&row.event_type)?,
                    amount: row.amount,
                    recorded_by: row.performed_by,
                    approved_by: row.approved_by,
                    reason: row.reason,
                    recorded_at: row.created_at,
                })
            })
            .collect()
    }
}

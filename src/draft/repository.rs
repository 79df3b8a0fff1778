//! `sqlx`-backed persistence for draft orders and their line items. Runtime
//! queries (`sqlx::query`/`query_as`, not the `query!` macro) are used
//! throughout so the crate doesn't need a live database at build time.

use crate::db::cas::check_cas;
use crate::db::TenantCtx;
use crate::domain::draft_order::{DraftLineItem, DraftOrder, DraftStatus};
use crate::error::{DomainError, DomainResult};
use crate::ids::{DraftLineItemId, DraftOrderId, MenuItemId, TableSessionId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Row};

#[derive(FromRow)]
struct DraftOrderRow {
    id: DraftOrderId,
    table_session_id: TableSessionId,
    status: String,
    version: i64,
    locked_by: Option<uuid::Uuid>,
    locked_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct DraftLineItemRow {
    id: DraftLineItemId,
    menu_item_id: MenuItemId,
    quantity: i32,
    price_at_order: Money,
    special_instructions: Option<String>,
}

fn status_to_str(status: DraftStatus) -> &'static str {
    match status {
        DraftStatus::Draft => "draft",
        DraftStatus::Pending => "pending",
        DraftStatus::Confirmed => "confirmed",
        DraftStatus::Rejected => "rejected",
        DraftStatus::Expired => "expired",
    }
}

fn status_from_str(s: &str) -> DomainResult<DraftStatus> {
    Ok(match s {
        "draft" => DraftStatus::Draft,
        "pending" => DraftStatus::Pending,
        "confirmed" => DraftStatus::Confirmed,
        "rejected" => DraftStatus::Rejected,
        "expired" => DraftStatus::Expired,
        other => return Err(DomainError::Internal(format!("unknown draft status {other}"))),
    })
}

pub struct DraftRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DraftRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, ctx: &TenantCtx, draft: &DraftOrder) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO draft_orders
               (id, tenant_id, table_session_id, status, version, locked_by, locked_at,
                rejection_reason, subtotal, total_amount, created_at, updated_at, expires_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $10, $10, $11)"#,
        )
        .bind(draft.id)
        .bind(ctx.tenant_id)
        .bind(draft.table_session_id)
        .bind(status_to_str(draft.status))
        .bind(draft.version)
        .bind(draft.locked_by.map(uuid::Uuid::from))
        .bind(draft.locked_at)
        .bind(&draft.rejection_reason)
        .bind(draft.total())
        .bind(draft.created_at)
        .bind(draft.expires_at)
        .execute(self.pool)
        .await?;

        for item in &draft.line_items {
            self.insert_line_item(ctx, draft.id, item).await?;
        }
        Ok(())
    }

    pub async fn insert_line_item(&self, ctx: &TenantCtx, draft_order_id: DraftOrderId, item: &DraftLineItem) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO draft_line_items
               (id, tenant_id, draft_order_id, menu_item_id, name, quantity, price_at_order, line_total, special_instructions)
               VALUES ($1, $2, $3, $4, '', $5, $6, $7, $8)"#,
        )
        .bind(item.id)
        .bind(ctx.tenant_id)
        .bind(draft_order_id)
        .bind(item.menu_item_id)
        .bind(item.quantity as i32)
        .bind(item.unit_price)
        .bind(item.line_total())
        .bind(&item.notes)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, ctx: &TenantCtx, id: DraftOrderId) -> DomainResult<DraftOrder> {
        let row = sqlx::query_as::<_, DraftOrderRow>(
            r#"SELECT id, table_session_id, status, version, locked_by, locked_at,
                      rejection_reason, created_at, expires_at
               FROM draft_orders WHERE id = $1 AND tenant_id = $2"#,
        )
        .bind(id)
        .bind(ctx.tenant_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(DomainError::NotFound("draft_order"))?;

        let line_item_rows = sqlx::query_as::<_, DraftLineItemRow>(
            r#"SELECT id, menu_item_id, quantity, price_at_order, special_instructions
               FROM draft_line_items WHERE draft_order_id = $1 AND tenant_id = $2"#,
        )
        .bind(id)
        .bind(ctx.tenant_id)
        .fetch_all(self.pool)
        .await?;

        let line_items = line_item_rows
            .into_iter()
            .map(|row| DraftLineItem {
                id: row.id,
                menu_item_id: row.menu_item_id,
                quantity: row.quantity as u32,
                unit_price: row.price_at_order,
                notes: row.special_instructions,
            })
            .collect();

        Ok(DraftOrder {
            id: row.id,
            table_session_id: row.table_session_id,
            status: status_from_str(&row.status)?,
            line_items,
            locked_by: row.locked_by.map(Into::into),
            locked_at: row.locked_at,
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
            expires_at: row.expires_at,
            version: row.version,
        })
    }

    /// Persists every mutable field of `draft` with a CAS write against
    /// `expected_version`. Callers must have already mutated `draft` in
    /// memory (e.g. via `DraftOrder::submit`) and pass the version the
    /// in-memory copy was loaded at.
    pub async fn save_cas(&self, ctx: &TenantCtx, draft: &DraftOrder, expected_version: i64) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE draft_orders SET
                   table_session_id = $1,
                   status = $2,
                   locked_by = $3,
                   locked_at = $4,
                   rejection_reason = $5,
                   subtotal = $6,
                   total_amount = $6,
                   version = version + 1,
                   updated_at = now()
               WHERE id = $7 AND tenant_id = $8 AND version = $9"#,
        )
        .bind(draft.table_session_id)
        .bind(status_to_str(draft.status))
        .bind(draft.locked_by.map(uuid::Uuid::from))
        .bind(draft.locked_at)
        .bind(&draft.rejection_reason)
        .bind(draft.total())
        .bind(draft.id)
        .bind(ctx.tenant_id)
        .bind(expected_version)
        .execute(self.pool)
        .await?;

        check_cas(result.rows_affected(), expected_version)
    }

    /// Drafts past their TTL that are still open, used by the background
    /// sweep task.
    pub async fn find_expired(&self, ctx: &TenantCtx, now: DateTime<Utc>) -> DomainResult<Vec<DraftOrder>> {
        let rows = sqlx::query(
            r#"SELECT id FROM draft_orders
               WHERE tenant_id = $1 AND status IN ('draft', 'pending') AND expires_at < $2"#,
        )
        .bind(ctx.tenant_id)
        .bind(now)
        .fetch_all(self.pool)
        .await?;

        let mut drafts = Vec::with_capacity(rows.len());
        for row in rows {
            let id: DraftOrderId = row.try_get("id")?;
            drafts.push(self.get(ctx, id).await?);
        }
        Ok(drafts)
    }
}

use crate::domain::order::{Order, OrderLineItem, OrderStatus};
use crate::ids::{OrderId, OrderLineItemId};

#[derive(FromRow)]
struct OrderRow {
    id: OrderId,
    draft_order_id: DraftOrderId,
    table_session_id: TableSessionId,
    status: String,
    version: i64,
    subtotal: Money,
    tax_amount: Money,
    discount_amount: Money,
    service_charge: Money,
    tip_amount: Money,
    total_amount: Money,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

#[derive(FromRow)]
struct OrderLineItemRow {
    id: OrderLineItemId,
    menu_item_id: MenuItemId,
    quantity: i32,
    price_at_order: Money,
}

fn order_status_to_str(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "pending",
        OrderStatus::InProgress => "in_progress",
        OrderStatus::Paid => "paid",
        OrderStatus::Completed => "completed",
        OrderStatus::Cancelled => "cancelled",
        OrderStatus::Voided => "voided",
    }
}

fn order_status_from_str(s: &str) -> DomainResult<OrderStatus> {
    Ok(match s {
        "pending" => OrderStatus::Pending,
        "in_progress" => OrderStatus::InProgress,
        "paid" => OrderStatus::Paid,
        "completed" => OrderStatus::Completed,
        "cancelled" => OrderStatus::Cancelled,
        "voided" => OrderStatus::Voided,
        other => return Err(DomainError::Internal(format!("unknown order status {other}"))),
    })
}

pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, ctx: &TenantCtx, order: &Order) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO orders
               (id, tenant_id, table_session_id, draft_order_id, status, version,
                subtotal, tax_amount, discount_amount, service_charge, tip_amount, total_amount,
                created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)"#,
        )
        .bind(order.id)
        .bind(ctx.tenant_id)
        .bind(order.table_session_id)
        .bind(order.draft_order_id)
        .bind(order_status_to_str(order.status))
        .bind(order.version)
        .bind(order.subtotal)
        .bind(order.tax_amount)
        .bind(order.discount_amount)
        .bind(order.service_charge)
        .bind(order.tip_amount)
        .bind(order.total_amount)
        .bind(order.created_at)
        .execute(self.pool)
        .await?;

        for item in &order.line_items {
            sqlx::query(
                r#"INSERT INTO order_line_items (id, tenant_id, order_id, menu_item_id, name, quantity, price_at_order)
                   VALUES ($1, $2, $3, $4, '', $5, $6)"#,
            )
            .bind(item.id)
            .bind(ctx.tenant_id)
            .bind(order.id)
            .bind(item.menu_item_id)
            .bind(item.quantity as i32)
            .bind(item.unit_price)
            .execute(self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn get(&self, ctx: &TenantCtx, id: OrderId) -> DomainResult<Order> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"SELECT id, draft_order_id, table_session_id, status, version,
                      subtotal, tax_amount, discount_amount, service_charge, tip_amount, total_amount,
                      created_at, completed_at
               FROM orders WHERE id = $1 AND tenant_id = $2"#,
        )
        .bind(id)
        .bind(ctx.tenant_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(DomainError::NotFound("order"))?;

        let item_rows = sqlx::query_as::<_, OrderLineItemRow>(
            r#"SELECT id, menu_item_id, quantity, price_at_order
               FROM order_line_items WHERE order_id = $1 AND tenant_id = $2"#,
        )
        .bind(id)
        .bind(ctx.tenant_id)
        .fetch_all(self.pool)
        .await?;

        let line_items = item_rows
            .into_iter()
            .map(|row| OrderLineItem {
                id: row.id,
                menu_item_id: row.menu_item_id,
                quantity: row.quantity as u32,
                unit_price: row.price_at_order,
                notes: None,
            })
            .collect();

        Ok(Order {
            id: row.id,
            draft_order_id: row.draft_order_id,
            table_session_id: row.table_session_id,
            status: order_status_from_str(&row.status)?,
            line_items,
            subtotal: row.subtotal,
            tax_amount: row.tax_amount,
            discount_amount: row.discount_amount,
            service_charge: row.service_charge,
            tip_amount: row.tip_amount,
            total_amount: row.total_amount,
            created_at: row.created_at,
            completed_at: row.completed_at,
            version: row.version,
        })
    }

    pub async fn save_cas(&self, ctx: &TenantCtx, order: &Order, expected_version: i64) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE orders SET
                   status = $1,
                   tax_amount = $2,
                   discount_amount = $3,
                   service_charge = $4,
                   tip_amount = $5,
                   total_amount = $6,
                   completed_at = $7,
                   version = version + 1,
                   updated_at = now()
               WHERE id = $8 AND tenant_id = $9 AND version = $10"#,
        )
        .bind(order_status_to_str(order.status))
        .bind(order.tax_amount)
        .bind(order.discount_amount)
        .bind(order.service_charge)
        .bind(order.tip_amount)
        .bind(order.total_amount)
        .bind(order.completed_at)
        .bind(order.id)
        .bind(ctx.tenant_id)
        .bind(expected_version)
        .execute(self.pool)
        .await?;

        check_cas(result.rows_affected(), expected_version)
    }
}

fn adjustment_kind_to_str(kind: crate::domain::adjustment::AdjustmentKind) -> &'static str {
    use crate::domain::adjustment::AdjustmentKind::*;
    match kind {
        Comp => "comp",
        Discount => "discount",
        Correction => "correction",
    }
}

fn adjustment_kind_from_str(s: &str) -> DomainResult<crate::domain::adjustment::AdjustmentKind> {
    use crate::domain::adjustment::AdjustmentKind::*;
    Ok(match s {
        "comp" => Comp,
        "discount" => Discount,
        "correction" => Correction,
        other => return Err(DomainError::Internal(format!("unknown adjustment kind {other}"))),
    })
}

/// Append-only log of comps/discounts/corrections applied to a confirmed
/// order. Never updated once written — only `insert`/`list_for_order`.
pub struct AdjustmentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AdjustmentRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, ctx: &TenantCtx, adjustment: &crate::domain::adjustment::OrderAdjustment) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO order_adjustments (id, tenant_id, order_id, adjustment_type, amount, authorized_by, reason, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(adjustment.id)
        .bind(ctx.tenant_id)
        .bind(adjustment.order_id)
        .bind(adjustment_kind_to_str(adjustment.kind))
        .bind(adjustment.amount)
        .bind(adjustment.applied_by)
        .bind(&adjustment.reason)
        .bind(adjustment.applied_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_for_order(&self, ctx: &TenantCtx, order_id: OrderId) -> DomainResult<Vec<crate::domain::adjustment::OrderAdjustment>> {
        let rows = sqlx::query_as::<_, AdjustmentRow>(
            r#"SELECT id, order_id, adjustment_type, amount, authorized_by, reason, created_at
               FROM order_adjustments WHERE order_id = $1 AND tenant_id = $2 ORDER BY created_at ASC"#,
        )
        .bind(order_id)
        .bind(ctx.tenant_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(crate::domain::adjustment::OrderAdjustment {
                    id: row.id,
                    order_id: row.order_id,
                    kind: adjustment_kind_from_str(&row.adjustment_type)?,
                    amount: row.amount,
                    reason: row.reason.unwrap_or_default(),
                    applied_by: row.authorized_by,
                    applied_at: row.created_at,
                })
            })
            .collect()
    }
}

#[derive(sqlx::FromRow)]
struct AdjustmentRow {
    id: crate::ids::OrderAdjustmentId,
    order_id: OrderId,
    adjustment_type: String,
    amount: crate::money::SignedMoney,
    authorized_by: crate::ids::UserId,
    reason: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

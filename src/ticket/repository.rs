//! `sqlx`-backed persistence for tickets and their line items, plus the
//! station-queue read used by the expo/kitchen board.

use crate::db::cas::check_cas;
use crate::db::TenantCtx;
use crate::domain::ticket::{Ticket, TicketLineItem, TicketLineItemStatus, TicketStatus};
use crate::error::{DomainError, DomainResult};
use crate::ids::{DraftOrderId, KitchenCourseId, MenuItemId, MenuStationId, OrderId, TicketId, TicketLineItemId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

fn status_to_str(status: TicketStatus) -> &'static str {
    match status {
        TicketStatus::New => "new",
        TicketStatus::Pending => "pending",
        TicketStatus::Preparing => "preparing",
        TicketStatus::Ready => "ready",
        TicketStatus::Completed => "completed",
        TicketStatus::Voided => "voided",
    }
}

fn status_from_str(s: &str) -> DomainResult<TicketStatus> {
    Ok(match s {
        "new" => TicketStatus::New,
        "pending" => TicketStatus::Pending,
        "preparing" => TicketStatus::Preparing,
        "ready" => TicketStatus::Ready,
        "completed" => TicketStatus::Completed,
        "voided" => TicketStatus::Voided,
        other => return Err(DomainError::Internal(format!("unknown ticket status {other}"))),
    })
}

fn line_item_status_to_str(status: TicketLineItemStatus) -> &'static str {
    match status {
        TicketLineItemStatus::Pending => "pending",
        TicketLineItemStatus::Fired => "fired",
        TicketLineItemStatus::Completed => "completed",
    }
}

fn line_item_status_from_str(s: &str) -> DomainResult<TicketLineItemStatus> {
    Ok(match s {
        "pending" => TicketLineItemStatus::Pending,
        "fired" => TicketLineItemStatus::Fired,
        "completed" => TicketLineItemStatus::Completed,
        other => return Err(DomainError::Internal(format!("unknown ticket line item status {other}"))),
    })
}

#[derive(FromRow)]
struct TicketRow {
    id: TicketId,
    order_id: OrderId,
    station_id: MenuStationId,
    course_id: KitchenCourseId,
    course_number: i32,
    status: String,
    is_rush: bool,
    is_held: bool,
    held_reason: Option<String>,
    held_at: Option<DateTime<Utc>>,
    fired_at: Option<DateTime<Utc>>,
    voided_at: Option<DateTime<Utc>>,
    voided_reason: Option<String>,
    print_count: i32,
    created_at: DateTime<Utc>,
    version: i64,
}

#[derive(FromRow)]
struct TicketLineItemRow {
    id: TicketLineItemId,
    menu_item_id: MenuItemId,
    quantity: i32,
    special_instructions: Option<String>,
    course_number: i32,
    status: String,
    held: bool,
    voided: bool,
}

/// A menu item's fan-out destination: the station its ticket belongs to,
/// the course it fires with, and whether that course auto-fires on
/// confirmation.
pub struct MenuItemRouting {
    pub station_id: MenuStationId,
    pub course_id: KitchenCourseId,
    pub course_number: i32,
    pub auto_fire_on_confirm: bool,
}

pub struct TicketRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TicketRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, ctx: &TenantCtx, draft_order_id: DraftOrderId, ticket: &Ticket) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO tickets
               (id, tenant_id, draft_order_id, order_id, station_id, course_id, course_number, status,
                is_rush, is_held, held_reason, held_at, fired_at, voided_at, voided_reason, print_count,
                version, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $18)"#,
        )
        .bind(ticket.id)
        .bind(ctx.tenant_id)
        .bind(draft_order_id)
        .bind(ticket.order_id)
        .bind(ticket.station_id)
        .bind(ticket.course_id)
        .bind(ticket.course_number)
        .bind(status_to_str(ticket.status))
        .bind(ticket.is_rush)
        .bind(ticket.is_held)
        .bind(&ticket.held_reason)
        .bind(ticket.held_at)
        .bind(ticket.fired_at)
        .bind(ticket.voided_at)
        .bind(&ticket.voided_reason)
        .bind(ticket.print_count)
        .bind(ticket.version)
        .bind(ticket.created_at)
        .execute(self.pool)
        .await?;

        for item in &ticket.line_items {
            sqlx::query(
                r#"INSERT INTO ticket_line_items
                   (id, tenant_id, ticket_id, draft_line_item_id, menu_item_id, name, quantity,
                    special_instructions, course_number, status, held, voided)
                   VALUES ($1, $2, $3, $4, $4, '', $5, $6, $7, $8, $9, $10)"#,
            )
            .bind(item.id)
            .bind(ctx.tenant_id)
            .bind(ticket.id)
            .bind(item.menu_item_id)
            .bind(item.quantity as i32)
            .bind(&item.notes)
            .bind(item.course_number)
            .bind(line_item_status_to_str(item.status))
            .bind(item.held)
            .bind(item.voided)
            .execute(self.pool)
            .await?;
        }
        Ok(())
    }

    async fn line_items_for(&self, ctx: &TenantCtx, ticket_id: TicketId) -> DomainResult<Vec<TicketLineItem>> {
        let rows = sqlx::query_as::<_, TicketLineItemRow>(
            r#"SELECT id, menu_item_id, quantity, special_instructions, course_number, status, held, voided
               FROM ticket_line_items WHERE ticket_id = $1 AND tenant_id = $2"#,
        )
        .bind(ticket_id)
        .bind(ctx.tenant_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(TicketLineItem {
                    id: row.id,
                    menu_item_id: row.menu_item_id,
                    quantity: row.quantity as u32,
                    notes: row.special_instructions,
                    course_number: row.course_number,
                    status: line_item_status_from_str(&row.status)?,
                    held: row.held,
                    voided: row.voided,
                })
            })
            .collect()
    }

    fn row_into_ticket(row: TicketRow, line_items: Vec<TicketLineItem>) -> DomainResult<Ticket> {
        Ok(Ticket {
            id: row.id,
            order_id: row.order_id,
            station_id: row.station_id,
            course_id: row.course_id,
            course_number: row.course_number,
            line_items,
            status: status_from_str(&row.status)?,
            is_rush: row.is_rush,
            is_held: row.is_held,
            held_reason: row.held_reason,
            held_at: row.held_at,
            fired_at: row.fired_at,
            voided_at: row.voided_at,
            voided_reason: row.voided_reason,
            print_count: row.print_count,
            created_at: row.created_at,
            version: row.version,
        })
    }

    pub async fn get(&self, ctx: &TenantCtx, id: TicketId) -> DomainResult<Ticket> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"SELECT id, order_id, station_id, course_id, course_number, status, is_rush, is_held,
                      held_reason, held_at, fired_at, voided_at, voided_reason, print_count, created_at, version
               FROM tickets WHERE id = $1 AND tenant_id = $2"#,
        )
        .bind(id)
        .bind(ctx.tenant_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(DomainError::NotFound("ticket"))?;

        let line_items = self.line_items_for(ctx, id).await?;
        Self::row_into_ticket(row, line_items)
    }

    /// Existing tickets dispatched for a draft, if dispatch already ran for
    /// it. Used to make confirmation idempotent: re-confirming a draft
    /// returns the tickets already created rather than duplicating them.
    pub async fn find_by_draft(&self, ctx: &TenantCtx, draft_order_id: DraftOrderId) -> DomainResult<Vec<Ticket>> {
        let rows = sqlx::query_as::<_, TicketRow>(
            r#"SELECT id, order_id, station_id, course_id, course_number, status, is_rush, is_held,
                      held_reason, held_at, fired_at, voided_at, voided_reason, print_count, created_at, version
               FROM tickets WHERE draft_order_id = $1 AND tenant_id = $2"#,
        )
        .bind(draft_order_id)
        .bind(ctx.tenant_id)
        .fetch_all(self.pool)
        .await?;

        let mut tickets = Vec::with_capacity(rows.len());
        for row in rows {
            let line_items = self.line_items_for(ctx, row.id).await?;
            tickets.push(Self::row_into_ticket(row, line_items)?);
        }
        Ok(tickets)
    }

    /// Every ticket dispatched for an order, across all its courses and
    /// stations. Used to check whether an order is ready to be completed.
    pub async fn find_by_order(&self, ctx: &TenantCtx, order_id: OrderId) -> DomainResult<Vec<Ticket>> {
        let rows = sqlx::query_as::<_, TicketRow>(
            r#"SELECT id, order_id, station_id, course_id, course_number, status, is_rush, is_held,
                      held_reason, held_at, fired_at, voided_at, voided_reason, print_count, created_at, version
               FROM tickets WHERE order_id = $1 AND tenant_id = $2"#,
        )
        .bind(order_id)
        .bind(ctx.tenant_id)
        .fetch_all(self.pool)
        .await?;

        let mut tickets = Vec::with_capacity(rows.len());
        for row in rows {
            let line_items = self.line_items_for(ctx, row.id).await?;
            tickets.push(Self::row_into_ticket(row, line_items)?);
        }
        Ok(tickets)
    }

    pub async fn save_cas(&self, ctx: &TenantCtx, ticket: &Ticket, expected_version: i64) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE tickets SET
                   station_id = $1,
                   status = $2,
                   is_rush = $3,
                   is_held = $4,
                   held_reason = $5,
                   held_at = $6,
                   fired_at = $7,
                   voided_at = $8,
                   voided_reason = $9,
                   print_count = $10,
                   version = version + 1,
                   updated_at = now()
               WHERE id = $11 AND tenant_id = $12 AND version = $13"#,
        )
        .bind(ticket.station_id)
        .bind(status_to_str(ticket.status))
        .bind(ticket.is_rush)
        .bind(ticket.is_held)
        .bind(&ticket.held_reason)
        .bind(ticket.held_at)
        .bind(ticket.fired_at)
        .bind(ticket.voided_at)
        .bind(&ticket.voided_reason)
        .bind(ticket.print_count)
        .bind(ticket.id)
        .bind(ctx.tenant_id)
        .bind(expected_version)
        .execute(self.pool)
        .await?;

        check_cas(result.rows_affected(), expected_version)?;

        for item in &ticket.line_items {
            sqlx::query(
                r#"UPDATE ticket_line_items SET status = $1, held = $2, voided = $3
                   WHERE id = $4 AND tenant_id = $5"#,
            )
            .bind(line_item_status_to_str(item.status))
            .bind(item.held)
            .bind(item.voided)
            .bind(item.id)
            .bind(ctx.tenant_id)
            .execute(self.pool)
            .await?;
        }
        Ok(())
    }

    /// Tickets queued at a station: rush tickets first, then by course
    /// number, then oldest first within a course — the order a kitchen
    /// display board renders them in. Bounded to the last 24 hours so a
    /// long-lived station doesn't drag forward ancient bumped-then-reopened
    /// rows.
    pub async fn station_queue(&self, ctx: &TenantCtx, station_id: MenuStationId) -> DomainResult<Vec<Ticket>> {
        let rows = sqlx::query_as::<_, TicketRow>(
            r#"SELECT id, order_id, station_id, course_id, course_number, status, is_rush, is_held,
                      held_reason, held_at, fired_at, voided_at, voided_reason, print_count, created_at, version
               FROM tickets
               WHERE tenant_id = $1 AND station_id = $2 AND status NOT IN ('completed', 'voided')
                 AND created_at > now() - interval '24 hours'
               ORDER BY is_rush DESC, course_number ASC, created_at ASC"#,
        )
        .bind(ctx.tenant_id)
        .bind(station_id)
        .fetch_all(self.pool)
        .await?;

        let mut tickets = Vec::with_capacity(rows.len());
        for row in rows {
            let line_items = self.line_items_for(ctx, row.id).await?;
            tickets.push(Self::row_into_ticket(row, line_items)?);
        }
        Ok(tickets)
    }

    /// Resolves a menu item's station/course routing, including whether its
    /// course auto-fires on confirmation.
    pub async fn routing_for_menu_item(&self, ctx: &TenantCtx, menu_item_id: MenuItemId) -> DomainResult<MenuItemRouting> {
        let row: Option<(Option<MenuStationId>, Option<KitchenCourseId>, Option<i32>, Option<bool>)> = sqlx::query_as(
            r#"SELECT mi.station_id, mi.course_id, kc.course_number, kc.auto_fire_on_confirm
               FROM menu_items mi
               LEFT JOIN kitchen_courses kc ON kc.id = mi.course_id
               WHERE mi.id = $1 AND mi.tenant_id = $2"#,
        )
        .bind(menu_item_id)
        .bind(ctx.tenant_id)
        .fetch_optional(self.pool)
        .await?;

        let (station_id, course_id, course_number, auto_fire) = row.ok_or(DomainError::NotFound("menu_item"))?;

        Ok(MenuItemRouting {
            station_id: station_id.ok_or_else(|| DomainError::BadRequest("menu item has no assigned station".into()))?,
            course_id: course_id.ok_or_else(|| DomainError::BadRequest("menu item has no assigned course".into()))?,
            course_number: course_number.ok_or_else(|| DomainError::BadRequest("menu item's course is missing a course number".into()))?,
            auto_fire_on_confirm: auto_fire.unwrap_or(false),
        })
    }
}

//! Ticket dispatch and lifecycle operations. Confirming a draft fans out
//! into one ticket per distinct `(station, course)` pair among the order's
//! line items; this module owns that fan-out plus
//! bump/hold/fire/void/reassign/reprint.

pub mod repository;

use crate::db::TenantCtx;
use crate::domain::order::Order;
use crate::domain::ticket::{Ticket, TicketLineItem, TicketLineItemStatus};
use crate::error::DomainResult;
use crate::events::{DomainEvent, EventBus};
use crate::ids::{KitchenCourseId, MenuStationId, TicketId};
use repository::TicketRepository;
use sqlx::PgPool;
use std::collections::HashMap;

#[derive(Clone)]
pub struct TicketDispatcher {
    pool: PgPool,
    bus: EventBus,
}

struct CourseGroup {
    station_id: MenuStationId,
    course_number: i32,
    auto_fire: bool,
    line_items: Vec<TicketLineItem>,
}

impl TicketDispatcher {
    pub fn new(pool: PgPool, bus: EventBus) -> Self {
        Self { pool, bus }
    }

    /// Groups `order`'s line items by `(station, course)` and writes one
    /// ticket per group, publishing a `TicketCreated` per group. Idempotent
    /// per draft: if dispatch already ran for this order's draft, the
    /// existing tickets are returned instead of duplicated.
    pub async fn dispatch(&self, ctx: &TenantCtx, order: &Order) -> DomainResult<Vec<Ticket>> {
        let repo = TicketRepository::new(&self.pool);

        let existing = repo.find_by_draft(ctx, order.draft_order_id).await?;
        if !existing.is_empty() {
            return Ok(existing);
        }

        let mut by_course: HashMap<KitchenCourseId, CourseGroup> = HashMap::new();

        for item in &order.line_items {
            let routing = repo.routing_for_menu_item(ctx, item.menu_item_id).await?;
            let group = by_course.entry(routing.course_id).or_insert_with(|| CourseGroup {
                station_id: routing.station_id,
                course_number: routing.course_number,
                auto_fire: routing.auto_fire_on_confirm,
                line_items: Vec::new(),
            });
            group.line_items.push(TicketLineItem {
                id: crate::ids::TicketLineItemId::new(),
                menu_item_id: item.menu_item_id,
                quantity: item.quantity,
                notes: item.notes.clone(),
                course_number: routing.course_number,
                status: TicketLineItemStatus::Pending,
                held: false,
                voided: false,
            });
        }

        let mut tickets = Vec::with_capacity(by_course.len());
        for (course_id, group) in by_course {
            let ticket = Ticket::new(
                order.id,
                group.station_id,
                course_id,
                group.course_number,
                group.line_items,
                group.auto_fire,
                false,
            );
            repo.insert(ctx, order.draft_order_id, &ticket).await?;
            self.bus.publish(DomainEvent::TicketCreated {
                ticket_id: ticket.id,
                station_id: ticket.station_id,
            });
            tickets.push(ticket);
        }
        Ok(tickets)
    }

    pub async fn hold(&self, ctx: &TenantCtx, ticket_id: TicketId, reason: String) -> DomainResult<Ticket> {
        self.transition(ctx, ticket_id, |t| t.hold(reason), |ticket_id, station_id| DomainEvent::TicketHeld {
            ticket_id,
            station_id,
        })
        .await
    }

    pub async fn fire(&self, ctx: &TenantCtx, ticket_id: TicketId) -> DomainResult<Ticket> {
        self.transition(ctx, ticket_id, |t| t.fire(), |ticket_id, station_id| DomainEvent::TicketFired {
            ticket_id,
            station_id,
        })
        .await
    }

    pub async fn bump(&self, ctx: &TenantCtx, ticket_id: TicketId) -> DomainResult<Ticket> {
        self.transition(ctx, ticket_id, |t| t.bump(), |ticket_id, station_id| DomainEvent::TicketBumped {
            ticket_id,
            station_id,
        })
        .await
    }

    pub async fn void(&self, ctx: &TenantCtx, ticket_id: TicketId, reason: String) -> DomainResult<Ticket> {
        self.transition(ctx, ticket_id, |t| t.void(reason), |ticket_id, station_id| DomainEvent::TicketVoided {
            ticket_id,
            station_id,
        })
        .await
    }

    pub async fn reprint(&self, ctx: &TenantCtx, ticket_id: TicketId) -> DomainResult<Ticket> {
        let repo = TicketRepository::new(&self.pool);
        let mut ticket = repo.get(ctx, ticket_id).await?;
        let expected_version = ticket.version;
        ticket.reprint();
        repo.save_cas(ctx, &ticket, expected_version).await?;
        Ok(ticket)
    }

    /// Moves a ticket to a different station in place, preserving its
    /// course assignment and history.
    pub async fn reassign(&self, ctx: &TenantCtx, ticket_id: TicketId, new_station_id: MenuStationId) -> DomainResult<Ticket> {
        let repo = TicketRepository::new(&self.pool);
        let mut ticket = repo.get(ctx, ticket_id).await?;
        let expected_version = ticket.version;
        let old_station = ticket.station_id;
        ticket.reassign(new_station_id)?;
        repo.save_cas(ctx, &ticket, expected_version).await?;

        self.bus.publish(DomainEvent::TicketUpdated {
            ticket_id: ticket.id,
            station_id: old_station,
        });
        self.bus.publish(DomainEvent::TicketUpdated {
            ticket_id: ticket.id,
            station_id: new_station_id,
        });
        Ok(ticket)
    }

    pub async fn station_queue(&self, ctx: &TenantCtx, station_id: MenuStationId) -> DomainResult<Vec<Ticket>> {
        TicketRepository::new(&self.pool).station_queue(ctx, station_id).await
    }

    async fn transition(
        &self,
        ctx: &TenantCtx,
        ticket_id: TicketId,
        apply: impl FnOnce(&mut Ticket) -> Result<(), crate::error::DomainError>,
        event: impl FnOnce(TicketId, MenuStationId) -> DomainEvent,
    ) -> DomainResult<Ticket> {
        let repo = TicketRepository::new(&self.pool);
        let mut ticket = repo.get(ctx, ticket_id).await?;
        let expected_version = ticket.version;
        apply(&mut ticket)?;
        repo.save_cas(ctx, &ticket, expected_version).await?;
        self.bus.publish(event(ticket.id, ticket.station_id));
        Ok(ticket)
    }
}

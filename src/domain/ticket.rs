//! Kitchen ticket state machine. Tickets fan out by `(station, course)`:
//! confirming a draft creates one ticket per distinct station+course pair
//! among its line items, each carrying only that pair's items.

use crate::error::DomainError;
use crate::ids::{KitchenCourseId, MenuItemId, MenuStationId, OrderId, TicketId, TicketLineItemId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    New,
    Pending,
    Preparing,
    Ready,
    Completed,
    Voided,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketLineItemStatus {
    Pending,
    Fired,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketLineItem {
    pub id: TicketLineItemId,
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
    pub notes: Option<String>,
    pub course_number: i32,
    pub status: TicketLineItemStatus,
    pub held: bool,
    pub voided: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub order_id: OrderId,
    pub station_id: MenuStationId,
    pub course_id: KitchenCourseId,
    pub course_number: i32,
    pub line_items: Vec<TicketLineItem>,
    pub status: TicketStatus,
    pub is_rush: bool,
    pub is_held: bool,
    pub held_reason: Option<String>,
    pub held_at: Option<DateTime<Utc>>,
    pub fired_at: Option<DateTime<Utc>>,
    pub voided_at: Option<DateTime<Utc>>,
    pub voided_reason: Option<String>,
    pub print_count: i32,
    pub created_at: DateTime<Utc>,
    pub version: i64,
}

impl Ticket {
    /// `auto_fire` mirrors `kitchen_courses.auto_fire_on_confirm` for this
    /// ticket's course: an auto-fire ticket is born already `pending` with
    /// every line item fired, skipping the `new` staging state entirely.
    pub fn new(
        order_id: OrderId,
        station_id: MenuStationId,
        course_id: KitchenCourseId,
        course_number: i32,
        mut line_items: Vec<TicketLineItem>,
        auto_fire: bool,
        is_rush: bool,
    ) -> Self {
        let now = Utc::now();
        let (status, fired_at) = if auto_fire {
            for item in &mut line_items {
                item.status = TicketLineItemStatus::Fired;
            }
            (TicketStatus::Pending, Some(now))
        } else {
            (TicketStatus::New, None)
        };
        Self {
            id: TicketId::new(),
            order_id,
            station_id,
            course_id,
            course_number,
            line_items,
            status,
            is_rush,
            is_held: false,
            held_reason: None,
            held_at: None,
            fired_at,
            voided_at: None,
            voided_reason: None,
            print_count: 0,
            created_at: now,
            version: 1,
        }
    }

    fn require_not_terminal(&self, action: &str) -> Result<(), DomainError> {
        if matches!(self.status, TicketStatus::Completed | TicketStatus::Voided) {
            return Err(DomainError::InvalidTransition(format!(
                "cannot {action} a ticket in {:?}",
                self.status
            )));
        }
        Ok(())
    }

    /// Sends the ticket to the station queue. From `new` only — an
    /// auto-fire ticket is already `pending` at construction.
    pub fn fire(&mut self) -> Result<(), DomainError> {
        if self.status != TicketStatus::New {
            return Err(DomainError::InvalidTransition(format!(
                "cannot fire a ticket in {:?}",
                self.status
            )));
        }
        self.status = TicketStatus::Pending;
        self.fired_at = Some(Utc::now());
        self.is_held = false;
        self.held_reason = None;
        self.held_at = None;
        Ok(())
    }

    pub fn hold(&mut self, reason: String) -> Result<(), DomainError> {
        self.require_not_terminal("hold")?;
        self.is_held = true;
        self.held_reason = Some(reason);
        self.held_at = Some(Utc::now());
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), DomainError> {
        self.require_not_terminal("resume")?;
        self.is_held = false;
        self.held_reason = None;
        self.held_at = None;
        Ok(())
    }

    /// Advances the ticket one step: `pending -> preparing -> ready ->
    /// completed`. Reaching `completed` marks every non-voided line item
    /// completed.
    pub fn bump(&mut self) -> Result<(), DomainError> {
        self.status = match self.status {
            TicketStatus::Pending => TicketStatus::Preparing,
            TicketStatus::Preparing => TicketStatus::Ready,
            TicketStatus::Ready => {
                for item in &mut self.line_items {
                    if !item.voided {
                        item.status = TicketLineItemStatus::Completed;
                    }
                }
                TicketStatus::Completed
            }
            other => {
                return Err(DomainError::InvalidTransition(format!("cannot bump a ticket in {other:?}")));
            }
        };
        Ok(())
    }

    pub fn void(&mut self, reason: String) -> Result<(), DomainError> {
        self.require_not_terminal("void")?;
        for item in &mut self.line_items {
            if item.status != TicketLineItemStatus::Completed {
                item.voided = true;
            }
        }
        self.status = TicketStatus::Voided;
        self.voided_at = Some(Utc::now());
        self.voided_reason = Some(reason);
        Ok(())
    }

    /// Moves the ticket to a different station in place, preserving its
    /// course/line items/history rather than voiding and recreating it.
    pub fn reassign(&mut self, new_station_id: MenuStationId) -> Result<(), DomainError> {
        self.require_not_terminal("reassign")?;
        self.station_id = new_station_id;
        Ok(())
    }

    pub fn reprint(&mut self) {
        self.print_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_ticket() -> Ticket {
        Ticket::new(
            OrderId::new(),
            MenuStationId::new(),
            KitchenCourseId::new(),
            0,
            vec![],
            false,
            false,
        )
    }

    #[test]
    fn new_ticket_starts_new_and_can_be_fired() {
        let mut ticket = new_ticket();
        assert_eq!(ticket.status, TicketStatus::New);
        ticket.fire().unwrap();
        assert_eq!(ticket.status, TicketStatus::Pending);
        assert!(ticket.fired_at.is_some());
    }

    #[test]
    fn auto_fire_ticket_is_born_pending_with_fired_items() {
        let item = TicketLineItem {
            id: TicketLineItemId::new(),
            menu_item_id: MenuItemId::new(),
            quantity: 1,
            notes: None,
            course_number: 0,
            status: TicketLineItemStatus::Pending,
            held: false,
            voided: false,
        };
        let ticket = Ticket::new(
            OrderId::new(),
            MenuStationId::new(),
            KitchenCourseId::new(),
            0,
            vec![item],
            true,
            false,
        );
        assert_eq!(ticket.status, TicketStatus::Pending);
        assert!(ticket.fired_at.is_some());
        assert_eq!(ticket.line_items[0].status, TicketLineItemStatus::Fired);
    }

    #[test]
    fn bump_chain_reaches_completed_and_marks_line_items() {
        let item = TicketLineItem {
            id: TicketLineItemId::new(),
            menu_item_id: MenuItemId::new(),
            quantity: 1,
            notes: None,
            course_number: 0,
            status: TicketLineItemStatus::Fired,
            held: false,
            voided: false,
        };
        let mut ticket = Ticket::new(
            OrderId::new(),
            MenuStationId::new(),
            KitchenCourseId::new(),
            0,
            vec![item],
            true,
            false,
        );
        ticket.bump().unwrap();
        assert_eq!(ticket.status, TicketStatus::Preparing);
        ticket.bump().unwrap();
        assert_eq!(ticket.status, TicketStatus::Ready);
        ticket.bump().unwrap();
        assert_eq!(ticket.status, TicketStatus::Completed);
        assert_eq!(ticket.line_items[0].status, TicketLineItemStatus::Completed);
    }

    #[test]
    fn cannot_bump_a_ticket_that_was_never_fired() {
        let mut ticket = new_ticket();
        assert!(ticket.bump().is_err());
    }

    #[test]
    fn completed_ticket_cannot_be_voided() {
        let mut ticket = new_ticket();
        ticket.fire().unwrap();
        ticket.bump().unwrap();
        ticket.bump().unwrap();
        ticket.bump().unwrap();
        assert!(ticket.void("changed mind".into()).is_err());
    }

    #[test]
    fn held_ticket_can_be_resumed() {
        let mut ticket = new_ticket();
        ticket.hold("waiting on 86'd item".into()).unwrap();
        assert!(ticket.is_held);
        ticket.resume().unwrap();
        assert!(!ticket.is_held);
    }

    #[test]
    fn reassign_changes_station_without_losing_progress() {
        let mut ticket = new_ticket();
        ticket.fire().unwrap();
        let new_station = MenuStationId::new();
        ticket.reassign(new_station).unwrap();
        assert_eq!(ticket.station_id, new_station);
        assert_eq!(ticket.status, TicketStatus::Pending);
    }
}

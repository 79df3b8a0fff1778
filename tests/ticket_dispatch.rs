use resto_core::domain::ticket::{Ticket, TicketLineItem, TicketStatus};
use resto_core::ids::{MenuItemId, MenuStationId, OrderId, TicketLineItemId};
use std::collections::HashMap;

fn ticket_item() -> TicketLineItem {
    TicketLineItem {
        id: TicketLineItemId::new(),
        menu_item_id: MenuItemId::new(),
        quantity: 1,
        notes: None,
    }
}

/// Mirrors `TicketDispatcher::dispatch`'s station grouping without a
/// database: one ticket per distinct station among an order's items.
fn group_by_station(items: Vec<(MenuStationId, TicketLineItem)>) -> HashMap<MenuStationId, Vec<TicketLineItem>> {
    let mut by_station: HashMap<MenuStationId, Vec<TicketLineItem>> = HashMap::new();
    for (station_id, item) in items {
        by_station.entry(station_id).or_default().push(item);
    }
    by_station
}

#[test]
fn an_order_spanning_two_stations_produces_two_tickets() {
    let grill = MenuStationId::new();
    let bar = MenuStationId::new();
    let items = vec![
        (grill, ticket_item()),
        (grill, ticket_item()),
        (bar, ticket_item()),
    ];

    let grouped = group_by_station(items);
    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped[&grill].len(), 2);
    assert_eq!(grouped[&bar].len(), 1);

    let order_id = OrderId::new();
    let tickets: Vec<Ticket> = grouped
        .into_iter()
        .map(|(station_id, line_items)| Ticket::new(order_id, station_id, line_items))
        .collect();
    assert!(tickets.iter().all(|t| t.status == TicketStatus::Created));
    assert!(tickets.iter().all(|t| t.order_id == order_id));
}

#[test]
fn hold_then_fire_then_bump_is_a_valid_path() {
    let mut ticket = Ticket::new(OrderId::new(), MenuStationId::new(), vec![ticket_item()]);
    ticket.hold().unwrap();
    ticket.fire().unwrap();
    ticket.bump().unwrap();
    assert_eq!(ticket.status, TicketStatus::Bumped);
}

#[test]
fn voiding_a_held_ticket_is_allowed_but_cannot_be_undone() {
    let mut ticket = Ticket::new(OrderId::new(), MenuStationId::new(), vec![ticket_item()]);
    ticket.hold().unwrap();
    ticket.void().unwrap();
    assert_eq!(ticket.status, TicketStatus::Voided);
    assert!(ticket.fire().is_err());
}

#[test]
fn reassign_voids_the_original_so_a_fresh_ticket_must_be_created() {
    let mut ticket = Ticket::new(OrderId::new(), MenuStationId::new(), vec![ticket_item()]);
    ticket.fire().unwrap();
    ticket.reassign().unwrap();
    assert_eq!(ticket.status, TicketStatus::Voided);

    let new_station = MenuStationId::new();
    let replacement = Ticket::new(ticket.order_id, new_station, ticket.line_items.clone());
    assert_eq!(replacement.status, TicketStatus::Created);
    assert_eq!(replacement.station_id, new_station);
}

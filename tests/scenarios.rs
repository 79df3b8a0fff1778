//! End-to-end scenarios strung together from the pure domain layer: a
//! table opens, a waiter builds a draft, it's confirmed into an order and
//! fanned out to kitchen stations, the kitchen works the tickets, and the
//! order is paid off and reconciled against a shift. No database — this
//! exercises the same sequence `DraftCoordinator`/`TicketDispatcher`/
//! `PaymentEngine`/`ShiftLedger` drive, with their persistence calls
//! replaced by plain struct construction.

use chrono::{Duration, Utc};
use resto_core::domain::draft_order::{DraftLineItem, DraftOrder, DraftStatus};
use resto_core::domain::order::{Order, OrderLineItem, OrderStatus};
use resto_core::domain::payment::{Payment, PaymentIntent};
use resto_core::domain::shift::Shift;
use resto_core::domain::table_session::TableSession;
use resto_core::domain::ticket::{Ticket, TicketLineItem, TicketStatus};
use resto_core::ids::{DraftLineItemId, MenuItemId, MenuStationId, OrderLineItemId, TableId, TicketLineItemId, UserId};
use resto_core::money::Money;
use std::collections::HashMap;

#[test]
fn dine_in_order_from_open_table_to_reconciled_shift() {
    let server = UserId::new();

    let table = TableSession::open(TableId::new(), server);
    assert!(table.is_open());

    let mut draft = DraftOrder::new(table.id, Duration::hours(2));
    let grill = MenuStationId::new();
    let bar = MenuStationId::new();
    let steak = MenuItemId::new();
    let soda = MenuItemId::new();

    draft.line_items.push(DraftLineItem {
        id: DraftLineItemId::new(),
        menu_item_id: steak,
        quantity: 1,
        unit_price: Money::from_major_minor(28, 0),
        notes: Some("medium rare".into()),
    });
    draft.line_items.push(DraftLineItem {
        id: DraftLineItemId::new(),
        menu_item_id: soda,
        quantity: 2,
        unit_price: Money::from_major_minor(4, 50),
        notes: None,
    });
    let draft_total = draft.total();
    assert_eq!(draft_total, Money::from_major_minor(37, 0));

    draft.acquire_lock(server, Utc::now(), Duration::minutes(30)).unwrap();
    draft.submit().unwrap();
    draft.confirm().unwrap();
    assert_eq!(draft.status, DraftStatus::Confirmed);

    let order_line_items: Vec<OrderLineItem> = draft
        .line_items
        .iter()
        .map(|item| OrderLineItem {
            id: OrderLineItemId::new(),
            menu_item_id: item.menu_item_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            notes: item.notes.clone(),
        })
        .collect();
    let mut order = Order::from_confirmed_draft(draft.id, draft.table_session_id, order_line_items);
    assert_eq!(order.status, OrderStatus::Open);
    assert_eq!(order.total(), draft_total);

    // Station lookup: steak goes to the grill, soda to the bar.
    let station_for = HashMap::from([(steak, grill), (soda, bar)]);
    let mut by_station: HashMap<MenuStationId, Vec<TicketLineItem>> = HashMap::new();
    for item in &order.line_items {
        let station_id = station_for[&item.menu_item_id];
        by_station.entry(station_id).or_default().push(TicketLineItem {
            id: TicketLineItemId::new(),
            menu_item_id: item.menu_item_id,
            quantity: item.quantity,
            notes: item.notes.clone(),
        });
    }
    let mut tickets: Vec<Ticket> = by_station
        .into_iter()
        .map(|(station_id, items)| Ticket::new(order.id, station_id, items))
        .collect();
    assert_eq!(tickets.len(), 2);

    for ticket in &mut tickets {
        ticket.fire().unwrap();
        ticket.bump().unwrap();
        assert_eq!(ticket.status, TicketStatus::Bumped);
    }

    // Split payment: cash covers two-thirds, card the rest.
    let cash_amount = Money::from_major_minor(25, 0);
    let card_amount = Money::from_major_minor(12, 0);
    let mut cash_intent = PaymentIntent::new_cash(order.id, cash_amount, "scenario-cash".into());
    cash_intent.complete().unwrap();
    let cash_payment = Payment::from_intent(&cash_intent);

    let mut card_intent = PaymentIntent::new_cash(order.id, card_amount, "scenario-card".into());
    card_intent.complete().unwrap();
    let card_payment = Payment::from_intent(&card_intent);

    let paid: Money = [cash_payment.amount, card_payment.amount].into_iter().sum();
    assert!(paid.approx_eq(order.total()));
    order.complete().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);

    let mut shift = Shift::open(server, Money::from_major_minor(100, 0));
    shift.record_cash_sale(cash_payment.amount).unwrap();
    shift.record_card_sale(card_payment.amount).unwrap();
    shift.close(Money::from_major_minor(125, 0)).unwrap();
    shift.reconcile().unwrap();
    assert_eq!(shift.cash_variance, Some(Money::ZERO));
}

#[test]
fn a_rejected_draft_never_produces_an_order() {
    let table = TableSession::open(TableId::new(), UserId::new());
    let mut draft = DraftOrder::new(table.id, Duration::hours(2));
    draft.line_items.push(DraftLineItem {
        id: DraftLineItemId::new(),
        menu_item_id: MenuItemId::new(),
        quantity: 1,
        unit_price: Money::from_major_minor(9, 0),
        notes: None,
    });
    let waiter = UserId::new();
    draft.acquire_lock(waiter, Utc::now(), Duration::minutes(30)).unwrap();
    draft.submit().unwrap();
    draft.reject("84 86'd the item".into()).unwrap();

    assert_eq!(draft.status, DraftStatus::Rejected);
    assert!(draft.confirm().is_err(), "a rejected draft can never be confirmed");
}

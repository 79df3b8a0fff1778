use resto_core::domain::shift::{CashDrawerEventKind, Shift, ShiftStatus};
use resto_core::ids::UserId;
use resto_core::money::{Money, SignedMoney};

#[test]
fn a_shift_tallies_sales_across_all_methods_before_closing() {
    let server = UserId::new();
    let mut shift = Shift::open(server, Money::from_major_minor(200, 0));

    shift.record_cash_sale(Money::from_major_minor(80, 0)).unwrap();
    shift.record_card_sale(Money::from_major_minor(120, 0)).unwrap();
    shift.record_tip(Money::from_major_minor(15, 0)).unwrap();

    assert_eq!(shift.cash_sales, Money::from_major_minor(80, 0));
    assert_eq!(shift.card_sales, Money::from_major_minor(120, 0));
    assert_eq!(shift.tip_sales, Money::from_major_minor(15, 0));
}

#[test]
fn closing_with_an_exact_cash_count_leaves_zero_variance() {
    let server = UserId::new();
    let mut shift = Shift::open(server, Money::from_major_minor(200, 0));
    shift.record_cash_sale(Money::from_major_minor(80, 0)).unwrap();

    shift.close(Money::from_major_minor(280, 0)).unwrap();
    assert_eq!(shift.status, ShiftStatus::Closed);
    assert_eq!(shift.expected_cash, Some(Money::from_major_minor(280, 0)));
    assert_eq!(shift.cash_variance, Some(Money::ZERO));
}

#[test]
fn a_short_drawer_produces_a_negative_variance() {
    let server = UserId::new();
    let mut shift = Shift::open(server, Money::from_major_minor(100, 0));
    shift.record_cash_sale(Money::from_major_minor(50, 0)).unwrap();

    shift.close(Money::from_major_minor(145, 0)).unwrap();
    let variance = shift.cash_variance.unwrap();
    assert!(variance.is_negative());
}

#[test]
fn full_lifecycle_open_close_reconcile() {
    let server = UserId::new();
    let mut shift = Shift::open(server, Money::ZERO);
    shift.close(Money::ZERO).unwrap();
    shift.reconcile().unwrap();
    assert_eq!(shift.status, ShiftStatus::Reconciled);
}

#[test]
fn reconcile_before_close_is_rejected() {
    let server = UserId::new();
    let mut shift = Shift::open(server, Money::ZERO);
    assert!(shift.reconcile().is_err());
}

#[test]
fn paid_out_cash_drawer_events_carry_a_negative_signed_amount() {
    let drawer_event_amount = SignedMoney::negative(Money::from_major_minor(25, 0));
    assert!(drawer_event_amount.as_decimal().is_sign_negative());

    let paid_in = SignedMoney::positive(Money::from_major_minor(25, 0));
    let net = drawer_event_amount + paid_in;
    assert!(net.as_decimal().is_zero());
}

#[test]
fn cash_drawer_event_kinds_round_trip_through_serde() {
    let kind = CashDrawerEventKind::Correction;
    let json = serde_json::to_string(&kind).unwrap();
    assert_eq!(json, "\"correction\"");
}

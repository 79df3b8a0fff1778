use resto_core::domain::payment::{Payment, PaymentIntent, PaymentIntentStatus, PaymentMethod, PaymentStatus};
use resto_core::ids::OrderId;
use resto_core::money::Money;

#[test]
fn cash_intent_completes_and_produces_a_settled_payment() {
    let order_id = OrderId::new();
    let mut intent = PaymentIntent::new_cash(order_id, Money::from_major_minor(42, 0), "idem-cash-1".into());
    assert_eq!(intent.status, PaymentIntentStatus::Pending);

    intent.complete().unwrap();
    assert_eq!(intent.status, PaymentIntentStatus::Completed);

    let payment = Payment::from_intent(&intent);
    assert_eq!(payment.method, PaymentMethod::Cash);
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.amount, Money::from_major_minor(42, 0));
}

#[test]
fn qr_intent_past_its_ttl_is_rejected_before_completion() {
    let order_id = OrderId::new();
    let intent = PaymentIntent::new_qr(
        order_id,
        Money::from_major_minor(15, 0),
        "idem-qr-1".into(),
        "qr-payload-xyz".into(),
        chrono::Duration::minutes(15),
    );

    let far_future = chrono::Utc::now() + chrono::Duration::hours(1);
    assert!(intent.check_not_expired(far_future).is_err());
}

#[test]
fn a_failed_intent_cannot_later_be_completed() {
    let order_id = OrderId::new();
    let mut intent = PaymentIntent::new_cash(order_id, Money::from_major_minor(20, 0), "idem-cash-2".into());
    intent.fail().unwrap();
    assert!(intent.complete().is_err());
}

#[test]
fn split_payment_across_two_methods_sums_to_the_order_total() {
    let order_id = OrderId::new();
    let total = Money::from_major_minor(100, 0);

    let mut cash_intent = PaymentIntent::new_cash(order_id, Money::from_major_minor(60, 0), "idem-split-cash".into());
    cash_intent.complete().unwrap();
    let cash_payment = Payment::from_intent(&cash_intent);

    let mut card_intent = PaymentIntent::new_cash(order_id, Money::from_major_minor(40, 0), "idem-split-card".into());
    card_intent.complete().unwrap();
    let card_payment = Payment::from_intent(&card_intent);

    let paid: Money = [cash_payment.amount, card_payment.amount].into_iter().sum();
    assert!(paid.approx_eq(total));
}

#[test]
fn a_refunded_payment_rejects_a_second_refund() {
    let order_id = OrderId::new();
    let intent = PaymentIntent::new_cash(order_id, Money::from_major_minor(30, 0), "idem-refund-1".into());
    let mut payment = Payment::from_intent(&intent);

    payment.refund().unwrap();
    assert_eq!(payment.status, PaymentStatus::Refunded);
    assert!(payment.refund().is_err());
}

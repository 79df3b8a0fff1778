use chrono::{Duration, Utc};
use resto_core::domain::draft_order::{DraftLineItem, DraftOrder, DraftStatus};
use resto_core::ids::{DraftLineItemId, MenuItemId, TableSessionId, UserId};
use resto_core::money::Money;

fn line_item(quantity: u32, unit_price: Money) -> DraftLineItem {
    DraftLineItem {
        id: DraftLineItemId::new(),
        menu_item_id: MenuItemId::new(),
        quantity,
        unit_price,
        notes: None,
    }
}

#[test]
fn full_lifecycle_from_draft_to_confirmed() {
    let mut draft = DraftOrder::new(TableSessionId::new(), Duration::hours(2));
    draft.line_items.push(line_item(2, Money::from_major_minor(12, 0)));
    draft.line_items.push(line_item(1, Money::from_major_minor(5, 50)));
    assert_eq!(draft.total(), Money::from_major_minor(29, 50));

    let waiter = UserId::new();
    draft.acquire_lock(waiter, Utc::now(), Duration::minutes(30)).unwrap();
    draft.submit().unwrap();
    assert_eq!(draft.status, DraftStatus::Submitted);

    draft.confirm().unwrap();
    assert_eq!(draft.status, DraftStatus::Confirmed);
    assert!(draft.locked_by.is_none(), "confirm must release the lock");
}

#[test]
fn rejecting_a_draft_preserves_the_reason_and_clears_lock() {
    let mut draft = DraftOrder::new(TableSessionId::new(), Duration::hours(2));
    draft.line_items.push(line_item(1, Money::from_major_minor(8, 0)));
    let waiter = UserId::new();
    draft.acquire_lock(waiter, Utc::now(), Duration::minutes(30)).unwrap();
    draft.submit().unwrap();

    draft.reject("kitchen out of ingredient".into()).unwrap();
    assert_eq!(draft.status, DraftStatus::Rejected);
    assert_eq!(draft.rejection_reason.as_deref(), Some("kitchen out of ingredient"));
    assert!(draft.locked_by.is_none());
}

#[test]
fn a_second_waiter_cannot_steal_a_fresh_lock() {
    let mut draft = DraftOrder::new(TableSessionId::new(), Duration::hours(2));
    let first = UserId::new();
    draft.acquire_lock(first, Utc::now(), Duration::minutes(30)).unwrap();

    let second = UserId::new();
    let err = draft.acquire_lock(second, Utc::now(), Duration::minutes(30));
    assert!(err.is_err());
}

#[test]
fn expiring_before_ttl_is_rejected() {
    let mut draft = DraftOrder::new(TableSessionId::new(), Duration::hours(2));
    let err = draft.expire(Utc::now());
    assert!(err.is_err());
}

#[test]
fn expiring_after_ttl_moves_to_expired_and_releases_lock() {
    let mut draft = DraftOrder::new(TableSessionId::new(), Duration::minutes(1));
    let waiter = UserId::new();
    draft.acquire_lock(waiter, Utc::now(), Duration::minutes(30)).unwrap();

    let past_ttl = Utc::now() + Duration::hours(1);
    draft.expire(past_ttl).unwrap();
    assert_eq!(draft.status, DraftStatus::Expired);
    assert!(draft.locked_by.is_none());
}

#[test]
fn cannot_confirm_a_draft_that_was_never_submitted() {
    let mut draft = DraftOrder::new(TableSessionId::new(), Duration::hours(2));
    draft.line_items.push(line_item(1, Money::from_major_minor(4, 0)));
    assert!(draft.confirm().is_err());
}

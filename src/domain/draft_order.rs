//! Draft order state machine. A draft is the waiter-facing working copy
//! of an order before it's confirmed into a real `Order` and fanned out
//! to kitchen stations. Lock semantics and the version-starts-at-1
//! convention follow `original_source/cafe-resto-system`'s `draft_order.py`.

use crate::error::DomainError;
use crate::ids::{DraftLineItemId, DraftOrderId, MenuItemId, TableSessionId, UserId};
use crate::money::Money;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    Draft,
    Pending,
    Confirmed,
    Rejected,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftLineItem {
    pub id: DraftLineItemId,
    pub menu_item_id: MenuItemId,
    pub quantity: u32,
    pub unit_price: Money,
    pub notes: Option<String>,
}

impl DraftLineItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftOrder {
    pub id: DraftOrderId,
    pub table_session_id: TableSessionId,
    pub status: DraftStatus,
    pub line_items: Vec<DraftLineItem>,
    pub locked_by: Option<UserId>,
    pub locked_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub version: i64,
}

impl DraftOrder {
    pub fn new(table_session_id: TableSessionId, ttl: Duration) -> Self {
        let created_at = Utc::now();
        Self {
            id: DraftOrderId::new(),
            table_session_id,
            status: DraftStatus::Draft,
            line_items: Vec::new(),
            locked_by: None,
            locked_at: None,
            rejection_reason: None,
            created_at,
            expires_at: created_at + ttl,
            version: 1,
        }
    }

    pub fn total(&self) -> Money {
        self.line_items.iter().map(|item| item.line_total()).sum()
    }

    /// A lock is acquirable if nobody holds it, or the holder's lease has
    /// expired. Does not special-case the current holder — that's handled
    /// by `acquire_lock`, which treats a same-user re-acquire as a no-op
    /// refresh regardless of lease age.
    pub fn can_acquire_lock(&self, now: DateTime<Utc>, lease_duration: Duration) -> bool {
        match self.locked_at {
            None => true,
            Some(locked_at) => now - locked_at > lease_duration,
        }
    }

    /// Locking only applies to a draft awaiting confirm/reject
    /// (`locked_by` non-null implies `status = pending`). A re-acquire by
    /// the current holder always succeeds and just refreshes the lease;
    /// a different caller succeeds only once the existing lease has
    /// expired.
    pub fn acquire_lock(&mut self, user_id: UserId, now: DateTime<Utc>, lease_duration: Duration) -> Result<(), DomainError> {
        if self.status != DraftStatus::Pending {
            return Err(DomainError::LockInvalidState(format!(
                "cannot lock a draft in {:?}, it must be pending",
                self.status
            )));
        }
        if let Some(holder) = self.locked_by {
            if holder != user_id && !self.can_acquire_lock(now, lease_duration) {
                return Err(DomainError::LockConflict);
            }
        }
        self.locked_by = Some(user_id);
        self.locked_at = Some(now);
        Ok(())
    }

    pub fn release_lock(&mut self, user_id: UserId) -> Result<(), DomainError> {
        if self.locked_by != Some(user_id) {
            return Err(DomainError::LockNotHeld);
        }
        self.locked_by = None;
        self.locked_at = None;
        Ok(())
    }

    pub fn submit(&mut self) -> Result<(), DomainError> {
        if self.status != DraftStatus::Draft {
            return Err(DomainError::InvalidTransition(format!(
                "cannot submit a draft in {:?}",
                self.status
            )));
        }
        if self.line_items.is_empty() {
            return Err(DomainError::BadRequest("draft has no line items".into()));
        }
        self.status = DraftStatus::Pending;
        Ok(())
    }

    /// Only the lock holder may confirm a pending draft.
    pub fn confirm(&mut self, user_id: UserId) -> Result<(), DomainError> {
        if self.status != DraftStatus::Pending {
            return Err(DomainError::InvalidTransition(format!(
                "cannot confirm a draft in {:?}",
                self.status
            )));
        }
        if self.locked_by != Some(user_id) {
            return Err(DomainError::LockNotHeld);
        }
        self.status = DraftStatus::Confirmed;
        self.locked_by = None;
        self.locked_at = None;
        Ok(())
    }

    /// Only the lock holder may reject a pending draft.
    pub fn reject(&mut self, user_id: UserId, reason: String) -> Result<(), DomainError> {
        if self.status != DraftStatus::Pending {
            return Err(DomainError::InvalidTransition(format!(
                "cannot reject a draft in {:?}",
                self.status
            )));
        }
        if self.locked_by != Some(user_id) {
            return Err(DomainError::LockNotHeld);
        }
        self.status = DraftStatus::Rejected;
        self.rejection_reason = Some(reason);
        self.locked_by = None;
        self.locked_at = None;
        Ok(())
    }

    pub fn expire(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !matches!(self.status, DraftStatus::Draft | DraftStatus::Pending) {
            return Err(DomainError::InvalidTransition(format!(
                "cannot expire a draft in {:?}",
                self.status
            )));
        }
        if now < self.expires_at {
            return Err(DomainError::BadRequest("draft has not reached its ttl yet".into()));
        }
        self.status = DraftStatus::Expired;
        self.locked_by = None;
        self.locked_at = None;
        Ok(())
    }

    /// Moves this draft to a different table session in place: there is
    /// no separate "reassign" aggregate, the draft's own
    /// `table_session_id` is mutated. A `pending` draft stays `pending`
    /// after reassignment — the lock, if any, is untouched.
    pub fn reassign(&mut self, new_session: TableSessionId) -> Result<TableSessionId, DomainError> {
        if self.status != DraftStatus::Pending {
            return Err(DomainError::InvalidTransition(format!(
                "cannot reassign a draft in {:?}",
                self.status
            )));
        }
        let old_session = self.table_session_id;
        self.table_session_id = new_session;
        Ok(old_session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_item() -> DraftLineItem {
        DraftLineItem {
            id: DraftLineItemId::new(),
            menu_item_id: MenuItemId::new(),
            quantity: 2,
            unit_price: Money::from_major_minor(10, 50),
            notes: None,
        }
    }

    #[test]
    fn fresh_draft_starts_at_version_one_and_draft_status() {
        let draft = DraftOrder::new(TableSessionId::new(), Duration::hours(2));
        assert_eq!(draft.version, 1);
        assert_eq!(draft.status, DraftStatus::Draft);
    }

    #[test]
    fn cannot_submit_an_empty_draft() {
        let mut draft = DraftOrder::new(TableSessionId::new(), Duration::hours(2));
        assert!(draft.submit().is_err());
    }

    #[test]
    fn cannot_lock_a_draft_that_has_not_been_submitted() {
        let mut draft = DraftOrder::new(TableSessionId::new(), Duration::hours(2));
        let user = UserId::new();
        assert!(matches!(
            draft.acquire_lock(user, Utc::now(), Duration::minutes(30)),
            Err(DomainError::LockInvalidState(_))
        ));
    }

    #[test]
    fn submit_then_confirm_clears_lock() {
        let mut draft = DraftOrder::new(TableSessionId::new(), Duration::hours(2));
        draft.line_items.push(line_item());
        draft.submit().unwrap();
        let user = UserId::new();
        draft.acquire_lock(user, Utc::now(), Duration::minutes(30)).unwrap();
        draft.confirm(user).unwrap();
        assert_eq!(draft.status, DraftStatus::Confirmed);
        assert!(draft.locked_by.is_none());
    }

    #[test]
    fn only_the_lock_holder_may_confirm() {
        let mut draft = DraftOrder::new(TableSessionId::new(), Duration::hours(2));
        draft.line_items.push(line_item());
        draft.submit().unwrap();
        let holder = UserId::new();
        draft.acquire_lock(holder, Utc::now(), Duration::minutes(30)).unwrap();

        let impostor = UserId::new();
        assert!(matches!(draft.confirm(impostor), Err(DomainError::LockNotHeld)));
    }

    #[test]
    fn same_user_reacquiring_an_active_lease_is_a_no_op_refresh() {
        let mut draft = DraftOrder::new(TableSessionId::new(), Duration::hours(2));
        draft.line_items.push(line_item());
        draft.submit().unwrap();
        let user = UserId::new();
        draft.acquire_lock(user, Utc::now(), Duration::minutes(30)).unwrap();
        assert!(draft.acquire_lock(user, Utc::now(), Duration::minutes(30)).is_ok());
    }

    #[test]
    fn expired_lock_can_be_reacquired_by_another_user() {
        let mut draft = DraftOrder::new(TableSessionId::new(), Duration::hours(2));
        draft.line_items.push(line_item());
        draft.submit().unwrap();
        let first = UserId::new();
        let long_ago = Utc::now() - Duration::minutes(45);
        draft.acquire_lock(first, long_ago, Duration::minutes(30)).unwrap();

        let second = UserId::new();
        assert!(draft.acquire_lock(second, Utc::now(), Duration::minutes(30)).is_ok());
    }

    #[test]
    fn different_user_cannot_steal_an_active_lease() {
        let mut draft = DraftOrder::new(TableSessionId::new(), Duration::hours(2));
        draft.line_items.push(line_item());
        draft.submit().unwrap();
        let first = UserId::new();
        draft.acquire_lock(first, Utc::now(), Duration::minutes(30)).unwrap();

        let second = UserId::new();
        assert!(matches!(draft.acquire_lock(second, Utc::now(), Duration::minutes(30)), Err(DomainError::LockConflict)));
    }

    #[test]
    fn reassign_mutates_table_session_in_place() {
        let original = TableSessionId::new();
        let mut draft = DraftOrder::new(original, Duration::hours(2));
        draft.line_items.push(line_item());
        draft.submit().unwrap();
        let new_session = TableSessionId::new();
        let old = draft.reassign(new_session).unwrap();
        assert_eq!(old, original);
        assert_eq!(draft.table_session_id, new_session);
    }
}

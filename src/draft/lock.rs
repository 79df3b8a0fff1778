//! Lease policy for the draft edit lock. Kept separate from
//! `DraftOrder::acquire_lock`/`release_lock` (which only know the rule for
//! a single in-memory draft) so the coordinator and sweeper share one place
//! to read the configured lease duration from.

use chrono::Duration;

#[derive(Debug, Clone, Copy)]
pub struct LockPolicy {
    pub lease_duration: Duration,
}

impl LockPolicy {
    pub fn new(lease_duration: Duration) -> Self {
        Self { lease_duration }
    }
}

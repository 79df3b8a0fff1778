//! Live push hub: keeps a registry of open WebSocket connections keyed by
//! table session, user, and kitchen station, and fans out
//! [`DomainEvent`](crate::events::DomainEvent)s to whichever connections
//! are subscribed to the event's subject.
//!
//! Three `DashMap<key, Vec<(ConnectionId, sender)>>` registries, one per
//! subject kind, with the same add/remove/send-by-key shape for each.

pub mod frame;
pub mod ws;

use crate::events::EventBus;
use crate::ids::{MenuStationId, TableSessionId, UserId};
use dashmap::DashMap;
use frame::{PushFrame, Subject};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

impl ConnectionId {
    fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

pub type FrameSender = mpsc::UnboundedSender<PushFrame>;

/// Process-lifetime connection registry. Cheap to clone (`Arc`-backed
/// `DashMap`s); every websocket task and the fan-out task hold a clone.
#[derive(Clone)]
pub struct PushHub {
    table_conns: std::sync::Arc<DashMap<TableSessionId, Vec<(ConnectionId, FrameSender)>>>,
    user_conns: std::sync::Arc<DashMap<UserId, Vec<(ConnectionId, FrameSender)>>>,
    station_conns: std::sync::Arc<DashMap<MenuStationId, Vec<(ConnectionId, FrameSender)>>>,
}

impl PushHub {
    pub fn new() -> Self {
        Self {
            table_conns: std::sync::Arc::new(DashMap::new()),
            user_conns: std::sync::Arc::new(DashMap::new()),
            station_conns: std::sync::Arc::new(DashMap::new()),
        }
    }

    pub fn add_table_connection(&self, table_session_id: TableSessionId, sender: FrameSender) -> ConnectionId {
        let id = ConnectionId::next();
        self.table_conns.entry(table_session_id).or_default().push((id, sender));
        id
    }

    pub fn add_user_connection(&self, user_id: UserId, sender: FrameSender) -> ConnectionId {
        let id = ConnectionId::next();
        self.user_conns.entry(user_id).or_default().push((id, sender));
        id
    }

    pub fn add_station_connection(&self, station_id: MenuStationId, sender: FrameSender) -> ConnectionId {
        let id = ConnectionId::next();
        self.station_conns.entry(station_id).or_default().push((id, sender));
        id
    }

    pub fn remove_table_connection(&self, table_session_id: TableSessionId, id: ConnectionId) {
        remove_from(&self.table_conns, &table_session_id, id);
    }

    pub fn remove_user_connection(&self, user_id: UserId, id: ConnectionId) {
        remove_from(&self.user_conns, &user_id, id);
    }

    pub fn remove_station_connection(&self, station_id: MenuStationId, id: ConnectionId) {
        remove_from(&self.station_conns, &station_id, id);
    }

    /// Send a frame to every live connection on the given subject, dropping
    /// any sender whose receiver has already gone away.
    fn fanout(&self, subject: Subject, frame: PushFrame) {
        match subject {
            Subject::Table(id) => send_to(&self.table_conns, &id, frame),
            Subject::User(id) => send_to(&self.user_conns, &id, frame),
            Subject::Station(id) => send_to(&self.station_conns, &id, frame),
        }
    }

    pub fn stats(&self) -> (usize, usize, usize) {
        (self.table_conns.len(), self.user_conns.len(), self.station_conns.len())
    }

    /// Spawns the task that subscribes to the bus and forwards every event
    /// whose subject has live connections. Runs for the lifetime of the
    /// process; the join handle is intentionally discarded by the caller.
    pub fn spawn_fanout(self, bus: EventBus) {
        tokio::spawn(async move {
            let mut rx = bus.subscribe();
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        if let Some(subject) = event.subject() {
                            self.fanout(subject, event.to_frame());
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "push hub lagged behind the event bus");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }
}

impl Default for PushHub {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_from<K>(map: &DashMap<K, Vec<(ConnectionId, FrameSender)>>, key: &K, id: ConnectionId)
where
    K: std::hash::Hash + Eq + Clone,
{
    if let Some(mut entry) = map.get_mut(key) {
        entry.retain(|(conn_id, _)| *conn_id != id);
        if entry.is_empty() {
            drop(entry);
            map.remove(key);
        }
    }
}

fn send_to<K>(map: &DashMap<K, Vec<(ConnectionId, FrameSender)>>, key: &K, frame: PushFrame)
where
    K: std::hash::Hash + Eq + Clone,
{
    if let Some(mut entry) = map.get_mut(key) {
        entry.retain(|(_, sender)| sender.send(frame.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DomainEvent;
    use crate::ids::{DraftOrderId, TableSessionId};

    #[test]
    fn add_and_remove_table_connection_clears_empty_entry() {
        let hub = PushHub::new();
        let table_id = TableSessionId::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn_id = hub.add_table_connection(table_id, tx);
        assert_eq!(hub.stats().0, 1);
        hub.remove_table_connection(table_id, conn_id);
        assert_eq!(hub.stats().0, 0);
    }

    #[tokio::test]
    async fn fanout_delivers_frame_to_subscribed_table() {
        let hub = PushHub::new();
        let table_id = TableSessionId::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        hub.add_table_connection(table_id, tx);

        let event = DomainEvent::DraftCreated {
            draft_id: DraftOrderId::new(),
            table_session_id: table_id,
        };
        hub.fanout(event.subject().unwrap(), event.to_frame());

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.frame_type, "DraftCreated");
    }

    #[tokio::test]
    async fn dead_receiver_is_evicted_on_next_send() {
        let hub = PushHub::new();
        let table_id = TableSessionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        hub.add_table_connection(table_id, tx);
        drop(rx);

        let event = DomainEvent::DraftCreated {
            draft_id: DraftOrderId::new(),
            table_session_id: table_id,
        };
        hub.fanout(event.subject().unwrap(), event.to_frame());
        assert_eq!(hub.stats().0, 0);
    }
}

//! Per-listener connection registry
//!
//! Connections are keyed by [`ConnectionId`], so registering the same
//! connection twice still yields one entry and one delivery. Entries are weak:
//! the transport owns connections, and a connection dropped without a close
//! event simply stops appearing in snapshots.
//!
//! Mutation takes the write lock; delivery copies a snapshot under the read
//! lock and sends after releasing it, so a slow `send` never holds up
//! `add`/`remove`.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::sync::RwLock;

use crate::peer::{ConnectionId, PeerConnection};

/// Set of connections registered with one listener
#[derive(Default)]
pub struct ConnectionSet {
    entries: RwLock<HashMap<ConnectionId, Weak<dyn PeerConnection>>>,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `conn`; returns false if it was already registered
    pub async fn add(&self, conn: &Arc<dyn PeerConnection>) -> bool {
        let mut entries = self.entries.write().await;
        entries.insert(conn.id(), Arc::downgrade(conn)).is_none()
    }

    /// Unregister `id`; returns false if it was not registered
    pub async fn remove(&self, id: ConnectionId) -> bool {
        self.entries.write().await.remove(&id).is_some()
    }

    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.entries.read().await.contains_key(&id)
    }

    /// Live connections at this instant
    pub async fn snapshot(&self) -> Vec<Arc<dyn PeerConnection>> {
        self.entries
            .read()
            .await
            .values()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// Number of registered connections that are still alive
    pub async fn len(&self) -> usize {
        self.entries
            .read()
            .await
            .values()
            .filter(|conn| conn.strong_count() > 0)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::error::SendError;
    use crate::peer::PeerId;

    struct Stub(ConnectionId, PeerId);

    impl PeerConnection for Stub {
        fn id(&self) -> ConnectionId {
            self.0
        }

        fn peer(&self) -> &PeerId {
            &self.1
        }

        fn send(&self, _payload: Bytes) -> Result<(), SendError> {
            Ok(())
        }
    }

    fn stub(id: u64) -> Arc<dyn PeerConnection> {
        Arc::new(Stub(ConnectionId(id), PeerId::new(format!("peer-{id}"))))
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let set = ConnectionSet::new();
        let conn = stub(1);

        assert!(set.add(&conn).await);
        assert!(!set.add(&conn).await);
        assert_eq!(set.len().await, 1);
        assert_eq!(set.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn test_remove_unknown_is_noop() {
        let set = ConnectionSet::new();
        assert!(!set.remove(ConnectionId(42)).await);
        assert!(set.is_empty().await);
    }

    #[tokio::test]
    async fn test_dropped_connection_leaves_snapshot() {
        let set = ConnectionSet::new();
        let kept = stub(1);
        let dropped = stub(2);
        set.add(&kept).await;
        set.add(&dropped).await;
        drop(dropped);

        let live = set.snapshot().await;
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].id(), ConnectionId(1));
        assert!(set.contains(ConnectionId(2)).await);
        assert_eq!(set.len().await, 1);

        drop(live);
        drop(kept);
        assert!(set.is_empty().await);
    }
}

//! Per-connection lifecycle
//!
//! ```text
//! ConnectionReceived ──► Pending ──Open──► Open ──Close──► Closed
//!                           └─────────────Close──────────────┘
//! ```
//!
//! `Closed` is terminal; a second close is a no-op.

use std::sync::Arc;
use std::time::Instant;

use super::{ConnectionId, PeerConnection, PeerId};

/// Connection lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerPhase {
    /// Transport connected, data channel not open yet
    Pending,
    /// Registered with every listener
    Open,
    /// Deregistered from every listener
    ///
    /// Terminal. The bridge forgets a connection once it gets here, so this
    /// phase is only seen on a `PeerState` the caller still holds.
    Closed,
}

/// State tracked by the bridge for one connection
pub struct PeerState {
    /// Transport handle
    pub connection: Arc<dyn PeerConnection>,

    /// Current phase
    pub phase: PeerPhase,

    /// When the transport reported the connection
    pub received_at: Instant,

    /// When the data channel opened
    pub opened_at: Option<Instant>,

    /// Inbound data messages seen while open
    pub data_messages: u64,
}

impl PeerState {
    /// Track a newly received connection
    pub fn new(connection: Arc<dyn PeerConnection>) -> Self {
        Self {
            connection,
            phase: PeerPhase::Pending,
            received_at: Instant::now(),
            opened_at: None,
            data_messages: 0,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.connection.id()
    }

    pub fn peer(&self) -> &PeerId {
        self.connection.peer()
    }

    /// Move to `Open`; returns false unless the connection was pending
    pub fn open(&mut self) -> bool {
        if self.phase == PeerPhase::Pending {
            self.phase = PeerPhase::Open;
            self.opened_at = Some(Instant::now());
            true
        } else {
            false
        }
    }

    /// Move to `Closed`; returns false if already closed
    pub fn close(&mut self) -> bool {
        if self.phase == PeerPhase::Closed {
            false
        } else {
            self.phase = PeerPhase::Closed;
            true
        }
    }

    /// Record inbound data; returns false if the connection is not open
    pub fn on_data(&mut self) -> bool {
        if self.phase == PeerPhase::Open {
            self.data_messages += 1;
            true
        } else {
            false
        }
    }

    pub fn is_open(&self) -> bool {
        self.phase == PeerPhase::Open
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::error::SendError;

    struct NullConnection(PeerId);

    impl PeerConnection for NullConnection {
        fn id(&self) -> ConnectionId {
            ConnectionId(7)
        }

        fn peer(&self) -> &PeerId {
            &self.0
        }

        fn send(&self, _payload: Bytes) -> Result<(), SendError> {
            Ok(())
        }
    }

    fn state() -> PeerState {
        PeerState::new(Arc::new(NullConnection(PeerId::new("viewer"))))
    }

    #[test]
    fn test_peer_lifecycle() {
        let mut state = state();
        assert_eq!(state.phase, PeerPhase::Pending);
        assert!(!state.on_data());

        assert!(state.open());
        assert!(state.is_open());
        assert!(state.opened_at.is_some());
        assert!(!state.open());

        assert!(state.on_data());
        assert_eq!(state.data_messages, 1);

        assert!(state.close());
        assert!(!state.close());
        assert_eq!(state.phase, PeerPhase::Closed);
    }

    #[test]
    fn test_close_while_pending() {
        let mut state = state();
        assert!(state.close());
        assert!(!state.open());
        assert_eq!(state.id(), ConnectionId(7));
        assert_eq!(state.peer().as_str(), "viewer");
    }
}

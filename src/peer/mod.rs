//! Peer transport boundary
//!
//! The signaling and session layer is external. It hands the bridge
//! [`TransportEvent`]s and exposes each remote session as a
//! [`PeerConnection`]. The bridge talks back only through
//! [`PeerConnection::send`] and [`PeerTransport::call`].

pub mod state;

pub use state::{PeerPhase, PeerState};

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{SendError, TransportError};
use crate::media::MediaStream;

/// Identity of one connection, unique for the lifetime of the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Identifier the remote peer registered with on the signaling server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One remote session's data channel
///
/// `send` must not block: implementations queue the payload and return.
pub trait PeerConnection: Send + Sync + 'static {
    /// Connection identity
    fn id(&self) -> ConnectionId;

    /// Remote peer
    fn peer(&self) -> &PeerId;

    /// Queue one discrete message for the peer
    fn send(&self, payload: Bytes) -> Result<(), SendError>;
}

/// Outbound side of the peer transport
pub trait PeerTransport: Send + Sync + 'static {
    /// Start a media call to `peer` carrying `stream`
    fn call(&self, peer: &PeerId, stream: Arc<MediaStream>) -> Result<(), TransportError>;
}

/// Connection lifecycle events raised by the transport
#[derive(Clone)]
pub enum TransportEvent {
    /// A remote peer connected; its data channel is not open yet
    ConnectionReceived(Arc<dyn PeerConnection>),
    /// The data channel opened
    Open(ConnectionId),
    /// Inbound data on the channel
    Data(ConnectionId, Bytes),
    /// The channel closed
    Close(ConnectionId),
}

impl TransportEvent {
    /// Connection the event refers to
    pub fn connection_id(&self) -> ConnectionId {
        match self {
            TransportEvent::ConnectionReceived(conn) => conn.id(),
            TransportEvent::Open(id)
            | TransportEvent::Data(id, _)
            | TransportEvent::Close(id) => *id,
        }
    }
}

impl fmt::Debug for TransportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportEvent::ConnectionReceived(conn) => f
                .debug_struct("ConnectionReceived")
                .field("id", &conn.id())
                .field("peer", conn.peer())
                .finish(),
            TransportEvent::Open(id) => f.debug_tuple("Open").field(id).finish(),
            TransportEvent::Data(id, data) => {
                f.debug_tuple("Data").field(id).field(&data.len()).finish()
            }
            TransportEvent::Close(id) => f.debug_tuple("Close").field(id).finish(),
        }
    }
}

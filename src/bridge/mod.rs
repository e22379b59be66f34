//! Bridge controller and configuration
//!
//! # Architecture
//!
//! ```text
//!        MessageBus                                   PeerTransport
//!            │ subscribe (one per topic)                   │ TransportEvent
//!            ▼                                             ▼
//!   ┌────────────────────┐   add/remove_connection  ┌──────────────────┐
//!   │ Listener /status   │◄─────────────────────────┤                  │
//!   │ Listener /battery  │◄─────────────────────────┤ BridgeController │
//!   │ Listener /camera ──┼──► VideoTrack ──┐        │  peers: Pending, │
//!   └────────┬───────────┘                 ▼        │  Open, Closed    │
//!            │ send(json)            MediaStream ◄──┤                  │
//!            ▼                           │ call()   └──────────────────┘
//!      PeerConnection                    ▼
//!                                    remote peer
//! ```

pub mod config;
pub mod controller;

pub use config::{BridgeConfig, IceServer, PeerConfig, TopicConfig};
pub use controller::BridgeController;

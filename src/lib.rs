//! # topic-bridge
//!
//! Bridges publish/subscribe bus topics to a changing set of remote peers.
//!
//! - Text topics: every message is encoded as JSON and sent to each
//!   connected peer's data channel.
//! - Video topics: raw camera images are converted to I420 and published to a
//!   per-topic video track, all carried on one shared outbound media stream.
//!
//! Peers attach and detach at runtime through [`TransportEvent`]s. A bad
//! frame or a failed send is logged and skipped. Only a configuration error at
//! startup stops the bridge.
//!
//! ```no_run
//! use std::sync::Arc;
//! use topic_bridge::{BridgeConfig, BridgeController, LocalBus, PeerTransport};
//!
//! # async fn run(transport: Arc<dyn PeerTransport>) -> topic_bridge::Result<()> {
//! let config = BridgeConfig::from_file("topics.json")?;
//! let bus = LocalBus::new();
//! let bridge = BridgeController::start(&config, &bus, transport).await?;
//! # let (_tx, events) = tokio::sync::mpsc::channel(16);
//! bridge.run(events).await;
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod bus;
pub mod convert;
pub mod error;
pub mod listener;
pub mod media;
pub mod message;
pub mod peer;
pub mod stats;

pub use bridge::{BridgeConfig, BridgeController, PeerConfig, TopicConfig};
pub use bus::{LocalBus, MessageBus, Subscription};
pub use convert::{ColorConverter, StandardConverter};
pub use error::{Error, Result};
pub use listener::{FaultSink, Listener, TracingFaultSink};
pub use media::{I420Frame, MediaStream, VideoTrack};
pub use message::{Encoding, ImageMessage, Message, SchemaTag, Topic};
pub use peer::{ConnectionId, PeerConnection, PeerId, PeerTransport, TransportEvent};

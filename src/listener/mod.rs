//! Topic listeners
//!
//! One [`Listener`] per configured topic. It owns the set of connections
//! interested in the topic and routes every inbound message one of two ways:
//!
//! ```text
//!                 Subscription (one task per topic, in bus order)
//!                                │
//!                          Listener::handle
//!                 ┌──────────────┴──────────────┐
//!          Route::Fanout                   Route::Media
//!     to_json ──► send() to each       raw_to_rgba ──► rgba_to_i420
//!     registered connection            ──► VideoFrameSource ──► VideoTrack
//! ```
//!
//! Image topics go to their track only; they are never also sent as JSON text.

pub mod connections;
pub mod fault;
pub mod media;

pub use connections::ConnectionSet;
pub use fault::{FaultSink, TracingFaultSink};
pub use media::MediaPipeline;

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::bus::MessageBus;
use crate::convert::ColorConverter;
use crate::error::BusError;
use crate::media::{MediaStream, VideoTrack};
use crate::message::{Message, Topic};
use crate::peer::{ConnectionId, PeerConnection};
use crate::stats::{ListenerCounters, ListenerStats};

/// How a listener delivers messages
pub enum Route {
    /// Serialize and send to every registered connection
    Fanout,
    /// Convert and publish to a video track
    Media(MediaPipeline),
}

/// Delivers one topic's messages to peers
pub struct Listener {
    topic: Topic,
    connections: ConnectionSet,
    route: Route,
    faults: Arc<dyn FaultSink>,
    counters: ListenerCounters,
}

impl Listener {
    /// Create a listener that fans messages out as JSON text
    pub fn fanout(topic: Topic, faults: Arc<dyn FaultSink>) -> Self {
        Self {
            topic,
            connections: ConnectionSet::new(),
            route: Route::Fanout,
            faults,
            counters: ListenerCounters::new(),
        }
    }

    /// Create a listener for an image topic
    ///
    /// Builds the topic's video source and track and adds the track to
    /// `stream`. This happens once per listener.
    pub async fn media(
        topic_name: impl Into<String>,
        stream: &MediaStream,
        converter: Arc<dyn ColorConverter>,
        faults: Arc<dyn FaultSink>,
        frame_capacity: usize,
    ) -> Self {
        let topic = Topic::image(topic_name);
        let pipeline = MediaPipeline::new(&topic.name, stream, converter, frame_capacity).await;

        Self {
            topic,
            connections: ConnectionSet::new(),
            route: Route::Media(pipeline),
            faults,
            counters: ListenerCounters::new(),
        }
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn is_media(&self) -> bool {
        matches!(self.route, Route::Media(_))
    }

    /// Video track fed by this listener, if it is a media listener
    pub fn track(&self) -> Option<&Arc<VideoTrack>> {
        match &self.route {
            Route::Media(pipeline) => Some(pipeline.track()),
            Route::Fanout => None,
        }
    }

    /// Subscribe to the bus and spawn the delivery task
    ///
    /// The subscription is made before returning, so a bus that refuses the
    /// topic fails here. Messages are then handled one at a time, in the order
    /// the bus delivers them.
    pub fn attach(self: &Arc<Self>, bus: &dyn MessageBus) -> Result<JoinHandle<()>, BusError> {
        let mut subscription = bus.subscribe(&self.topic)?;

        tracing::info!(
            topic = %self.topic.name,
            schema = %self.topic.schema,
            media = self.is_media(),
            "Listener attached"
        );

        let listener = Arc::clone(self);
        Ok(tokio::spawn(async move {
            while let Some(msg) = subscription.recv().await {
                listener.handle(msg).await;
            }
            tracing::debug!(
                topic = %subscription.topic().name,
                lagged = subscription.lagged(),
                "Subscription ended"
            );
        }))
    }

    /// Register a connection; a second registration is ignored
    pub async fn add_connection(&self, conn: &Arc<dyn PeerConnection>) -> bool {
        let added = self.connections.add(conn).await;
        if !added {
            tracing::debug!(
                topic = %self.topic.name,
                conn = %conn.id(),
                "Connection already registered"
            );
        }
        added
    }

    /// Unregister a connection; unknown ids are ignored
    pub async fn remove_connection(&self, id: ConnectionId) -> bool {
        self.connections.remove(id).await
    }

    pub async fn has_connection(&self, id: ConnectionId) -> bool {
        self.connections.contains(id).await
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.len().await
    }

    /// Process one inbound message
    pub async fn handle(&self, msg: Message) {
        self.counters.message();

        match &self.route {
            Route::Fanout => self.broadcast(&msg).await,
            Route::Media(pipeline) => self.publish_frame(pipeline, &msg),
        }
    }

    async fn broadcast(&self, msg: &Message) {
        let payload = match msg.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                self.faults.encode_failed(&self.topic.name, &e);
                return;
            }
        };

        let targets = self.connections.snapshot().await;
        for conn in targets {
            match conn.send(payload.clone()) {
                Ok(()) => self.counters.delivered(),
                Err(e) => {
                    self.counters.delivery_failed();
                    self.faults.delivery_failed(&self.topic.name, conn.id(), &e);
                }
            }
        }
    }

    fn publish_frame(&self, pipeline: &MediaPipeline, msg: &Message) {
        match pipeline.convert(msg) {
            Ok(frame) => {
                let readers = pipeline.publish(frame);
                self.counters.frame_published();
                tracing::trace!(topic = %self.topic.name, readers = readers, "Frame published");
            }
            Err(e) => {
                self.counters.frame_dropped();
                self.faults.frame_dropped(&self.topic.name, &e);
            }
        }
    }

    /// Statistics snapshot
    pub async fn stats(&self) -> ListenerStats {
        self.counters.snapshot(self.connections.len().await)
    }
}

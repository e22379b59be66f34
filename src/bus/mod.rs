//! Bus subscription boundary
//!
//! A [`MessageBus`] turns a [`Topic`] into a [`Subscription`]: an ordered
//! stream of decoded [`Message`]s. Each listener drains its subscription from
//! a single task, so deliveries for one topic never overlap.

pub mod local;

pub use local::LocalBus;

use tokio::sync::broadcast;

use crate::error::BusError;
use crate::message::{Message, Topic};

/// Default per-subscriber queue depth
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Source of topic subscriptions
pub trait MessageBus: Send + Sync + 'static {
    /// Subscribe to `topic`; failure here is a startup error
    fn subscribe(&self, topic: &Topic) -> Result<Subscription, BusError>;
}

/// Ordered stream of messages for one topic
#[derive(Debug)]
pub struct Subscription {
    topic: Topic,
    rx: broadcast::Receiver<Message>,
    lagged: u64,
}

impl Subscription {
    /// Wrap the receiving end of a topic channel
    pub fn new(topic: Topic, rx: broadcast::Receiver<Message>) -> Self {
        Self { topic, rx, lagged: 0 }
    }

    /// Topic this subscription follows
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Messages skipped because this subscriber fell behind
    pub fn lagged(&self) -> u64 {
        self.lagged
    }

    /// Next message, or `None` once the publisher side is gone
    ///
    /// Falling behind skips the oldest messages and carries on with the rest,
    /// still in publish order.
    pub async fn recv(&mut self) -> Option<Message> {
        loop {
            match self.rx.recv().await {
                Ok(msg) => return Some(msg),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    self.lagged += skipped;
                    tracing::warn!(
                        topic = %self.topic.name,
                        skipped = skipped,
                        "Subscriber lagged, messages skipped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

//! In-process message bus
//!
//! Topics map to `tokio::sync::broadcast` channels. The first subscriber fixes
//! a topic's schema; later subscribers and publishers must agree with it.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;

use super::{MessageBus, Subscription, DEFAULT_BUS_CAPACITY};
use crate::error::BusError;
use crate::message::{Message, SchemaTag, Topic};

struct TopicEntry {
    schema: SchemaTag,
    tx: broadcast::Sender<Message>,
}

/// Bus living entirely inside the process
pub struct LocalBus {
    topics: RwLock<HashMap<String, TopicEntry>>,
    capacity: usize,
}

impl LocalBus {
    /// Create a bus with the default queue depth
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    /// Create a bus buffering up to `capacity` messages per subscriber
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Declare a topic ahead of any subscriber
    pub fn advertise(&self, topic: &Topic) -> Result<(), BusError> {
        let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        self.entry(&mut topics, topic)?;
        Ok(())
    }

    /// Publish `message` on `topic`
    ///
    /// Returns how many subscribers received it. Publishing on a topic nobody
    /// has declared is not an error; nobody hears it.
    pub fn publish(&self, topic: &str, message: Message) -> Result<usize, BusError> {
        let topics = self.topics.read().unwrap_or_else(PoisonError::into_inner);

        let Some(entry) = topics.get(topic) else {
            tracing::debug!(topic = topic, "Publish on undeclared topic dropped");
            return Ok(0);
        };

        let schema = message.schema();
        if schema != entry.schema {
            return Err(BusError::SchemaMismatch {
                topic: topic.to_string(),
                existing: entry.schema.to_string(),
                requested: schema.to_string(),
            });
        }

        Ok(entry.tx.send(message).unwrap_or(0))
    }

    /// Number of live subscribers on `topic`
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(topic)
            .map(|entry| entry.tx.receiver_count())
            .unwrap_or(0)
    }

    fn entry<'a>(
        &self,
        topics: &'a mut HashMap<String, TopicEntry>,
        topic: &Topic,
    ) -> Result<&'a TopicEntry, BusError> {
        if topic.name.is_empty() {
            return Err(BusError::SubscribeFailed(
                topic.name.clone(),
                "empty topic name".to_string(),
            ));
        }

        let entry = topics.entry(topic.name.clone()).or_insert_with(|| {
            let (tx, _) = broadcast::channel(self.capacity);
            tracing::debug!(topic = %topic.name, schema = %topic.schema, "Topic declared");
            TopicEntry {
                schema: topic.schema.clone(),
                tx,
            }
        });

        if entry.schema != topic.schema {
            return Err(BusError::SchemaMismatch {
                topic: topic.name.clone(),
                existing: entry.schema.to_string(),
                requested: topic.schema.to_string(),
            });
        }

        Ok(entry)
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus for LocalBus {
    fn subscribe(&self, topic: &Topic) -> Result<Subscription, BusError> {
        let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        let entry = self.entry(&mut topics, topic)?;
        let rx = entry.tx.subscribe();

        tracing::debug!(
            topic = %topic.name,
            subscribers = entry.tx.receiver_count(),
            "Bus subscriber added"
        );

        Ok(Subscription::new(topic.clone(), rx))
    }
}

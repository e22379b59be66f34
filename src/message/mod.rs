//! Bus message model
//!
//! Messages are a tagged variant keyed by schema: image topics carry
//! [`ImageMessage`], every other schema carries an opaque JSON record.
//! Each variant has its own wire encoding; there is no reflection.

pub mod camera;
pub mod topic;

pub use camera::{Encoding, ImageMessage};
pub use topic::{SchemaTag, Topic, IMAGE_SCHEMA};

use bytes::Bytes;
use serde_json::Value;

/// A structured record of any non-image schema
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMessage {
    /// Schema the bus decoded this record with
    pub schema: SchemaTag,
    /// Decoded fields
    pub body: Value,
}

/// One delivery from the bus
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Structured record
    Record(RecordMessage),
    /// Raw camera frame
    Image(ImageMessage),
}

impl Message {
    /// Create a record message
    pub fn record(schema: impl Into<SchemaTag>, body: Value) -> Self {
        Message::Record(RecordMessage {
            schema: schema.into(),
            body,
        })
    }

    /// Schema of this message
    pub fn schema(&self) -> SchemaTag {
        match self {
            Message::Record(record) => record.schema.clone(),
            Message::Image(_) => SchemaTag::image(),
        }
    }

    /// Encode to the JSON text sent over data channels
    ///
    /// A record encodes as its body alone, so `{"ok":true}` goes out verbatim.
    pub fn to_json(&self) -> Result<Bytes, serde_json::Error> {
        let bytes = match self {
            Message::Record(record) => serde_json::to_vec(&record.body)?,
            Message::Image(image) => serde_json::to_vec(image)?,
        };
        Ok(Bytes::from(bytes))
    }
}

impl From<ImageMessage> for Message {
    fn from(image: ImageMessage) -> Self {
        Message::Image(image)
    }
}

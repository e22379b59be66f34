//! Error types
//!
//! Startup problems (`ConfigError`, `BusError`) abort the bridge. Everything
//! else is recovered where it happens: a `ConvertError` drops one frame, a
//! `SendError` skips one connection, a `TransportError` skips one call.

use crate::peer::ConnectionId;

/// Crate result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    #[error("conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("send error: {0}")]
    Send(#[from] SendError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid or missing configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("topic name must not be empty")]
    EmptyTopicName,

    #[error("topic {0} has no message type")]
    MissingSchema(String),

    #[error("topic {0} is configured more than once")]
    DuplicateTopic(String),

    #[error("invalid config document: {0}")]
    Malformed(String),
}

/// Failure to establish or maintain a bus subscription
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    #[error("topic {topic} is published as {existing}, not {requested}")]
    SchemaMismatch {
        topic: String,
        existing: String,
        requested: String,
    },

    #[error("cannot subscribe to {0}: {1}")]
    SubscribeFailed(String, String),
}

/// Failure to turn one image message into a planar frame
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConvertError {
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("row step {step} is shorter than {min} bytes")]
    InvalidStep { step: u32, min: u32 },

    #[error("payload too short: expected {expected} bytes, got {actual}")]
    TruncatedPayload { expected: usize, actual: usize },

    #[error("output buffer is {actual} bytes, expected {expected}")]
    OutputSize { expected: usize, actual: usize },

    #[error("message on an image topic is not an image")]
    NotAnImage,
}

/// Failure to push a payload to a single connection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("connection {0} is closed")]
    Closed(ConnectionId),

    #[error("connection {0} is not accepting data: {1}")]
    Rejected(ConnectionId, String),
}

/// Failure reported by the peer transport
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("call to peer {0} failed: {1}")]
    CallFailed(String, String),
}

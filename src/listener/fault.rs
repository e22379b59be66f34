//! Reporting of recovered faults
//!
//! Listeners never stop on a bad frame or a failed send. They report the fault
//! to a [`FaultSink`] and carry on with the next message or connection.

use crate::error::{ConvertError, SendError};
use crate::peer::ConnectionId;

/// Receives faults a listener recovered from
pub trait FaultSink: Send + Sync + 'static {
    /// A frame could not be converted and was dropped
    fn frame_dropped(&self, topic: &str, error: &ConvertError);

    /// A payload could not be sent to one connection
    fn delivery_failed(&self, topic: &str, conn: ConnectionId, error: &SendError);

    /// A message could not be encoded for the wire
    fn encode_failed(&self, topic: &str, error: &serde_json::Error);
}

/// Logs faults through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFaultSink;

impl FaultSink for TracingFaultSink {
    fn frame_dropped(&self, topic: &str, error: &ConvertError) {
        tracing::warn!(topic = topic, error = %error, "Frame dropped");
    }

    fn delivery_failed(&self, topic: &str, conn: ConnectionId, error: &SendError) {
        tracing::warn!(topic = topic, conn = %conn, error = %error, "Delivery failed");
    }

    fn encode_failed(&self, topic: &str, error: &serde_json::Error) {
        tracing::error!(topic = topic, error = %error, "Message encoding failed");
    }
}

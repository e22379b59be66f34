//! Planar video frames handed to tracks

use bytes::Bytes;

/// A frame in I420 layout
///
/// Cheap to clone: every track subscriber shares the same `Bytes` allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct I420Frame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Y plane, then U, then V
    pub data: Bytes,
}

impl I420Frame {
    /// Wrap a converted buffer
    pub fn new(width: u32, height: u32, data: impl Into<Bytes>) -> Self {
        Self {
            width,
            height,
            data: data.into(),
        }
    }
}

//! Video sources and the tracks they feed
//!
//! A [`VideoFrameSource`] is the write end; the [`VideoTrack`] created from it
//! is what gets added to a [`MediaStream`](super::MediaStream) and read by the
//! peer transport. Frames fan out over a `tokio::sync::broadcast` channel, so a
//! transport that falls behind loses old frames instead of stalling the
//! publisher.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::frame::I420Frame;

/// Default number of frames buffered per track receiver
pub const DEFAULT_FRAME_CAPACITY: usize = 8;

/// Write end of a video track
pub struct VideoFrameSource {
    tx: broadcast::Sender<I420Frame>,
}

impl VideoFrameSource {
    /// Create a source with the default buffering
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_FRAME_CAPACITY)
    }

    /// Create a source buffering up to `capacity` frames per receiver
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Create the track bound to this source
    pub fn create_track(&self, label: impl Into<String>) -> Arc<VideoTrack> {
        Arc::new(VideoTrack {
            label: label.into(),
            tx: self.tx.clone(),
        })
    }

    /// Publish a frame to the bound track
    ///
    /// Returns the number of receivers that got it, or 0 if nobody is reading.
    pub fn on_frame(&self, frame: I420Frame) -> usize {
        self.tx.send(frame).unwrap_or(0)
    }
}

impl Default for VideoFrameSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Read end of a video source, labelled with its topic name
#[derive(Debug)]
pub struct VideoTrack {
    label: String,
    tx: broadcast::Sender<I420Frame>,
}

impl VideoTrack {
    /// Track label (the topic name)
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Receive frames published after this call
    pub fn subscribe(&self) -> broadcast::Receiver<I420Frame> {
        self.tx.subscribe()
    }

    /// Number of live receivers
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_frame_reaches_track() {
        let source = VideoFrameSource::new();
        let track = source.create_track("/camera");
        let mut rx = track.subscribe();
        assert_eq!(track.receiver_count(), 1);

        let delivered = source.on_frame(I420Frame::new(2, 2, vec![0u8; 6]));
        assert_eq!(delivered, 1);

        let frame = rx.recv().await.unwrap();
        assert_eq!(frame.data.len(), 6);
        assert_eq!(track.label(), "/camera");
    }

    #[test]
    fn test_no_receivers() {
        let source = VideoFrameSource::new();
        let track = source.create_track("/camera");
        assert_eq!(track.receiver_count(), 0);
        assert_eq!(source.on_frame(I420Frame::new(2, 2, vec![0u8; 6])), 0);
    }
}

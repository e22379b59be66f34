//! The shared outbound media stream

use std::sync::Arc;

use tokio::sync::RwLock;

use super::track::VideoTrack;

/// Outbound stream handed to every peer call
///
/// Created once by the bridge controller. Tracks are only added while media
/// listeners are being built; afterwards the track list is read-only.
#[derive(Debug)]
pub struct MediaStream {
    id: String,
    tracks: RwLock<Vec<Arc<VideoTrack>>>,
}

impl MediaStream {
    /// Create an empty stream
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tracks: RwLock::new(Vec::new()),
        }
    }

    /// Stream identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Add a track
    pub async fn add_track(&self, track: Arc<VideoTrack>) {
        let mut tracks = self.tracks.write().await;
        tracing::debug!(stream = %self.id, track = %track.label(), "Track added to stream");
        tracks.push(track);
    }

    /// Snapshot of the current tracks
    pub async fn tracks(&self) -> Vec<Arc<VideoTrack>> {
        self.tracks.read().await.clone()
    }

    /// Find a track by label
    pub async fn track(&self, label: &str) -> Option<Arc<VideoTrack>> {
        self.tracks
            .read()
            .await
            .iter()
            .find(|t| t.label() == label)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::VideoFrameSource;

    #[tokio::test]
    async fn test_add_and_find_tracks() {
        let stream = MediaStream::new("bridge");
        let front = VideoFrameSource::new();
        let rear = VideoFrameSource::new();
        stream.add_track(front.create_track("/front")).await;
        stream.add_track(rear.create_track("/rear")).await;

        assert_eq!(stream.tracks().await.len(), 2);
        assert!(stream.track("/rear").await.is_some());
        assert!(stream.track("/side").await.is_none());
    }
}

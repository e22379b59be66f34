//! Image topic to video track pipeline

use std::sync::Arc;

use crate::convert::{i420_len, ColorConverter};
use crate::error::ConvertError;
use crate::media::{I420Frame, MediaStream, VideoFrameSource, VideoTrack};
use crate::message::Message;

/// Converts image messages and feeds them to one video track
pub struct MediaPipeline {
    source: VideoFrameSource,
    track: Arc<VideoTrack>,
    converter: Arc<dyn ColorConverter>,
}

impl MediaPipeline {
    /// Create the source and its track, labelled `label`, and add the track
    /// to `stream`
    pub async fn new(
        label: &str,
        stream: &MediaStream,
        converter: Arc<dyn ColorConverter>,
        frame_capacity: usize,
    ) -> Self {
        let source = VideoFrameSource::with_capacity(frame_capacity);
        let track = source.create_track(label);
        stream.add_track(Arc::clone(&track)).await;

        Self {
            source,
            track,
            converter,
        }
    }

    pub fn track(&self) -> &Arc<VideoTrack> {
        &self.track
    }

    /// Turn one image message into an I420 frame
    pub fn convert(&self, msg: &Message) -> Result<I420Frame, ConvertError> {
        let Message::Image(image) = msg else {
            return Err(ConvertError::NotAnImage);
        };

        let rgba = self.converter.raw_to_rgba(image)?;
        let (width, height) = rgba.dimensions();

        let mut planar = vec![0u8; i420_len(width, height)];
        self.converter.rgba_to_i420(&rgba, &mut planar)?;

        Ok(I420Frame::new(width, height, planar))
    }

    /// Hand a frame to the track; returns how many readers got it
    pub fn publish(&self, frame: I420Frame) -> usize {
        self.source.on_frame(frame)
    }
}

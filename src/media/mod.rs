//! Outbound video plumbing
//!
//! This module provides:
//! - `I420Frame`, the planar frame type published to tracks
//! - `VideoFrameSource` / `VideoTrack`, one pair per video topic
//! - `MediaStream`, the single stream carrying every track to peers

pub mod frame;
pub mod stream;
pub mod track;

pub use frame::I420Frame;
pub use stream::MediaStream;
pub use track::{VideoFrameSource, VideoTrack, DEFAULT_FRAME_CAPACITY};

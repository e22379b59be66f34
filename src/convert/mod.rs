//! Color conversion for video topics
//!
//! Two fallible stages turn a camera image into a frame a video track accepts:
//!
//! ```text
//! ImageMessage ──raw_to_rgba──► RgbaImage ──rgba_to_i420──► [Y | U | V]
//!  (rgb8, bgr8, ...)             (w*h*4 bytes)               (ceil(1.5*w*h) bytes)
//! ```
//!
//! The stages sit behind [`ColorConverter`] so a media listener can be driven
//! by a different codec (or a failing one, in tests).

pub mod i420;
pub mod rgba;

pub use i420::{i420_len, rgba_to_i420};
pub use rgba::raw_to_rgba;

pub use image::RgbaImage;

use crate::error::ConvertError;
use crate::message::ImageMessage;

/// Pixel format conversion used by media listeners
pub trait ColorConverter: Send + Sync + 'static {
    /// Decode a raw camera image into RGBA
    fn raw_to_rgba(&self, image: &ImageMessage) -> Result<RgbaImage, ConvertError>;

    /// Convert RGBA into I420, filling `out` which is exactly
    /// [`i420_len`] bytes for the image dimensions
    fn rgba_to_i420(&self, rgba: &RgbaImage, out: &mut [u8]) -> Result<(), ConvertError>;
}

/// Built-in converter for 8-bit RGB, BGR, RGBA, BGRA and mono images
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardConverter;

impl ColorConverter for StandardConverter {
    fn raw_to_rgba(&self, image: &ImageMessage) -> Result<RgbaImage, ConvertError> {
        raw_to_rgba(image)
    }

    fn rgba_to_i420(&self, rgba: &RgbaImage, out: &mut [u8]) -> Result<(), ConvertError> {
        rgba_to_i420(rgba, out)
    }
}

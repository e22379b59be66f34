//! Raw camera payload to RGBA

use image::RgbaImage;

use crate::error::ConvertError;
use crate::message::{Encoding, ImageMessage};

/// Expand a raw image into a tightly packed RGBA buffer
///
/// Row padding (`step` larger than `width * channels`) is dropped. Alpha is
/// opaque unless the source carries its own.
pub fn raw_to_rgba(image: &ImageMessage) -> Result<RgbaImage, ConvertError> {
    let encoding = image.pixel_encoding()?;
    let (width, height) = (image.width, image.height);

    if width == 0 || height == 0 {
        return Err(ConvertError::InvalidDimensions { width, height });
    }

    let channels = encoding.channels() as usize;
    let row_len = (width as usize)
        .checked_mul(channels)
        .ok_or(ConvertError::InvalidDimensions { width, height })?;
    let step = image.step as usize;

    if step < row_len {
        return Err(ConvertError::InvalidStep {
            step: image.step,
            min: u32::try_from(row_len).unwrap_or(u32::MAX),
        });
    }

    let expected = step
        .checked_mul(height as usize)
        .ok_or(ConvertError::InvalidDimensions { width, height })?;
    if image.data.len() < expected {
        return Err(ConvertError::TruncatedPayload {
            expected,
            actual: image.data.len(),
        });
    }

    let mut out = Vec::with_capacity(width as usize * height as usize * 4);
    for row in image.data.chunks(step).take(height as usize) {
        for px in row[..row_len].chunks_exact(channels) {
            let rgba = match encoding {
                Encoding::Rgb8 => [px[0], px[1], px[2], 255],
                Encoding::Bgr8 => [px[2], px[1], px[0], 255],
                Encoding::Rgba8 => [px[0], px[1], px[2], px[3]],
                Encoding::Bgra8 => [px[2], px[1], px[0], px[3]],
                Encoding::Mono8 => [px[0], px[0], px[0], 255],
            };
            out.extend_from_slice(&rgba);
        }
    }

    RgbaImage::from_raw(width, height, out).ok_or(ConvertError::InvalidDimensions { width, height })
}

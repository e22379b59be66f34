//! Raw camera image messages

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// Pixel layout of a raw image payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Rgb8,
    Bgr8,
    Rgba8,
    Bgra8,
    Mono8,
}

impl Encoding {
    /// Bytes per pixel
    pub fn channels(&self) -> u32 {
        match self {
            Encoding::Rgb8 | Encoding::Bgr8 => 3,
            Encoding::Rgba8 | Encoding::Bgra8 => 4,
            Encoding::Mono8 => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Rgb8 => "rgb8",
            Encoding::Bgr8 => "bgr8",
            Encoding::Rgba8 => "rgba8",
            Encoding::Bgra8 => "bgra8",
            Encoding::Mono8 => "mono8",
        }
    }
}

impl FromStr for Encoding {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rgb8" => Ok(Encoding::Rgb8),
            "bgr8" => Ok(Encoding::Bgr8),
            "rgba8" => Ok(Encoding::Rgba8),
            "bgra8" => Ok(Encoding::Bgra8),
            "mono8" | "8UC1" => Ok(Encoding::Mono8),
            other => Err(ConvertError::UnsupportedEncoding(other.to_string())),
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw image as published by a camera driver
///
/// `data` holds `height` rows of `step` bytes each. The encoding is kept as
/// the string the publisher sent so that unknown encodings survive until the
/// converter rejects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMessage {
    pub height: u32,
    pub width: u32,
    pub encoding: String,
    #[serde(default)]
    pub is_bigendian: u8,
    pub step: u32,
    pub data: Bytes,
}

impl ImageMessage {
    /// Create a tightly packed image (`step = width * channels`)
    pub fn packed(width: u32, height: u32, encoding: Encoding, data: impl Into<Bytes>) -> Self {
        Self {
            height,
            width,
            encoding: encoding.as_str().to_string(),
            is_bigendian: 0,
            step: width.saturating_mul(encoding.channels()),
            data: data.into(),
        }
    }

    /// Parse the encoding tag
    pub fn pixel_encoding(&self) -> Result<Encoding, ConvertError> {
        self.encoding.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding_parse() {
        assert_eq!("bgr8".parse::<Encoding>().unwrap(), Encoding::Bgr8);
        assert_eq!("8UC1".parse::<Encoding>().unwrap(), Encoding::Mono8);
        assert!(matches!(
            "yuv422".parse::<Encoding>(),
            Err(ConvertError::UnsupportedEncoding(e)) if e == "yuv422"
        ));
    }

    #[test]
    fn test_packed_step() {
        let img = ImageMessage::packed(4, 2, Encoding::Rgb8, vec![0u8; 24]);
        assert_eq!(img.step, 12);
        assert_eq!(img.pixel_encoding().unwrap(), Encoding::Rgb8);
    }

    #[test]
    fn test_packed_step_saturates() {
        let img = ImageMessage::packed(u32::MAX, 1, Encoding::Rgb8, vec![0u8; 3]);
        assert_eq!(img.step, u32::MAX);
        assert!(matches!(
            crate::convert::raw_to_rgba(&img),
            Err(ConvertError::InvalidStep { step: u32::MAX, .. })
        ));
    }
}

//! Topic identity types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Schema tag of raw camera images
pub const IMAGE_SCHEMA: &str = "sensor_msgs/Image";

/// Message type name used by the bus to pick a decoder (e.g. "std_msgs/String")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaTag(String);

impl SchemaTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Tag of raw camera images
    pub fn image() -> Self {
        Self(IMAGE_SCHEMA.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        self.0 == IMAGE_SCHEMA
    }
}

impl fmt::Display for SchemaTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SchemaTag {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SchemaTag {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A named bus channel and the schema of the messages it carries
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topic {
    /// Topic name (e.g. "/camera/image_raw")
    pub name: String,
    /// Message schema
    pub schema: SchemaTag,
}

impl Topic {
    /// Create a new topic
    pub fn new(name: impl Into<String>, schema: impl Into<SchemaTag>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
        }
    }

    /// Create an image topic
    pub fn image(name: impl Into<String>) -> Self {
        Self::new(name, SchemaTag::image())
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.name, self.schema)
    }
}

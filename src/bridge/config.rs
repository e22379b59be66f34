//! Bridge configuration
//!
//! The topic list uses the `topics.json` layout:
//!
//! ```json
//! {
//!   "topics": [{ "topic_name": "/status", "message_type": "std_msgs/String" }],
//!   "video": ["/camera/image_raw"]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bus::DEFAULT_BUS_CAPACITY;
use crate::error::{ConfigError, Result};
use crate::media::DEFAULT_FRAME_CAPACITY;
use crate::message::Topic;

/// A text topic and its message type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicConfig {
    pub topic_name: String,
    pub message_type: String,
}

impl TopicConfig {
    pub fn new(topic_name: impl Into<String>, message_type: impl Into<String>) -> Self {
        Self {
            topic_name: topic_name.into(),
            message_type: message_type.into(),
        }
    }

    pub fn topic(&self) -> Topic {
        Topic::new(self.topic_name.clone(), self.message_type.clone())
    }
}

/// Which topics to bridge and how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Name this bridge registers with on the bus
    pub node_name: String,

    /// Topics fanned out as JSON text
    pub topics: Vec<TopicConfig>,

    /// Image topics streamed as video tracks
    pub video: Vec<String>,

    /// Identifier of the shared outbound media stream
    pub stream_id: String,

    /// Frames buffered per video track reader
    pub frame_capacity: usize,

    /// Messages buffered per bus subscriber (in-process bus only)
    pub bus_capacity: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            node_name: "/my_node".to_string(),
            topics: Vec::new(),
            video: Vec::new(),
            stream_id: "bridge".to_string(),
            frame_capacity: DEFAULT_FRAME_CAPACITY,
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }
}

impl BridgeConfig {
    /// Parse and validate a JSON document
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Check topic names and schemas
    ///
    /// Every topic needs a name and a message type, and no name may appear
    /// twice across the text and video lists.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let mut seen = HashSet::new();

        for topic in &self.topics {
            if topic.topic_name.trim().is_empty() {
                return Err(ConfigError::EmptyTopicName);
            }
            if topic.message_type.trim().is_empty() {
                return Err(ConfigError::MissingSchema(topic.topic_name.clone()));
            }
            if !seen.insert(topic.topic_name.as_str()) {
                return Err(ConfigError::DuplicateTopic(topic.topic_name.clone()));
            }
        }

        for name in &self.video {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptyTopicName);
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateTopic(name.clone()));
            }
        }

        Ok(())
    }

    /// Add a text topic
    pub fn topic(mut self, topic_name: impl Into<String>, message_type: impl Into<String>) -> Self {
        self.topics.push(TopicConfig::new(topic_name, message_type));
        self
    }

    /// Add a video topic
    pub fn video(mut self, topic_name: impl Into<String>) -> Self {
        self.video.push(topic_name.into());
        self
    }

    /// Set the node name
    pub fn node_name(mut self, name: impl Into<String>) -> Self {
        self.node_name = name.into();
        self
    }

    /// Set the per-reader frame buffer
    pub fn frame_capacity(mut self, capacity: usize) -> Self {
        self.frame_capacity = capacity.max(1);
        self
    }

    /// Set the per-subscriber bus buffer
    pub fn bus_capacity(mut self, capacity: usize) -> Self {
        self.bus_capacity = capacity.max(1);
        self
    }
}

/// A STUN or TURN server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServer {
    pub urls: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Settings the peer transport connects to its signaling server with
///
/// The bridge never reads these itself; they are handed to whichever
/// transport implementation drives [`crate::BridgeController`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Peer id to register as
    pub id: Option<String>,

    /// Display name for logs
    pub name: Option<String>,

    /// Signaling host
    pub host: String,

    /// Signaling port
    pub port: u16,

    /// Signaling path
    pub path: String,

    /// Use TLS for signaling
    pub secure: bool,

    /// ICE servers
    pub ice_servers: Vec<IceServer>,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self::local()
    }
}

impl PeerConfig {
    /// Local signaling server, no ICE servers
    pub fn local() -> Self {
        Self {
            id: None,
            name: None,
            host: "localhost".to_string(),
            port: 9000,
            path: "/".to_string(),
            secure: false,
            ice_servers: Vec::new(),
        }
    }

    /// Hosted signaling with STUN/TURN relays
    pub fn hosted(turn_user: Option<String>, turn_pass: Option<String>) -> Self {
        let server = |urls: &str| IceServer {
            urls: urls.to_string(),
            username: turn_user.clone(),
            credential: turn_pass.clone(),
        };

        Self {
            id: None,
            name: None,
            host: "platforms.qcr.ai".to_string(),
            port: 443,
            path: "/".to_string(),
            secure: true,
            ice_servers: vec![
                server("stun:stun.cirrusrobotics.com.au:3478"),
                server("turn:turn.cirrusrobotics.com.au:3478"),
            ],
        }
    }

    /// Build from `ID`, `NAME`, `TURN_USER` and `TURN_PASS`
    pub fn from_env(secure: bool) -> Self {
        Self::from_lookup(secure, |key| std::env::var(key).ok())
    }

    fn from_lookup(secure: bool, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = if secure {
            Self::hosted(lookup("TURN_USER"), lookup("TURN_PASS"))
        } else {
            Self::local()
        };
        config.id = lookup("ID");
        config.name = lookup("NAME");
        config
    }

    /// Name to show in logs: `NAME`, else `ID`
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("anonymous")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::Error;

    #[test]
    fn test_parse_topics_json() {
        let config = BridgeConfig::from_json(
            r#"{
                "topics": [
                    { "topic_name": "/status", "message_type": "std_msgs/String" },
                    { "topic_name": "/battery", "message_type": "sensor_msgs/BatteryState" }
                ],
                "video": ["/camera/image_raw"]
            }"#,
        )
        .unwrap();

        assert_eq!(config.topics.len(), 2);
        assert_eq!(config.topics[1].topic().schema.as_str(), "sensor_msgs/BatteryState");
        assert_eq!(config.video, vec!["/camera/image_raw".to_string()]);
        assert_eq!(config.node_name, "/my_node");
        assert_eq!(config.frame_capacity, DEFAULT_FRAME_CAPACITY);
    }

    #[test]
    fn test_missing_schema() {
        let result = BridgeConfig::from_json(
            r#"{ "topics": [{ "topic_name": "/status", "message_type": "" }] }"#,
        );
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::MissingSchema(name))) if name == "/status"
        ));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let result = BridgeConfig::from_json(r#"{ "topics": [{ "topic_name": "/status" }] }"#);
        assert!(matches!(result, Err(Error::Config(ConfigError::Malformed(_)))));
    }

    #[test]
    fn test_duplicate_across_lists() {
        let config = BridgeConfig::default()
            .topic("/camera", "sensor_msgs/Image")
            .video("/camera");
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateTopic("/camera".to_string()))
        );
    }

    #[test]
    fn test_empty_video_name() {
        let config = BridgeConfig::default().video(" ");
        assert_eq!(config.validate(), Err(ConfigError::EmptyTopicName));
    }

    #[test]
    fn test_builder_chaining() {
        let config = BridgeConfig::default()
            .node_name("/bridge")
            .topic("/status", "std_msgs/Bool")
            .video("/camera")
            .frame_capacity(0)
            .bus_capacity(16);

        assert!(config.validate().is_ok());
        assert_eq!(config.node_name, "/bridge");
        assert_eq!(config.frame_capacity, 1);
        assert_eq!(config.bus_capacity, 16);
    }

    #[test]
    fn test_missing_file() {
        let result = BridgeConfig::from_file("/nonexistent/topics.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_peer_config_local() {
        let env: HashMap<&str, &str> = [("ID", "robot-1")].into();
        let config = PeerConfig::from_lookup(false, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 9000);
        assert!(config.ice_servers.is_empty());
        assert_eq!(config.display_name(), "robot-1");
    }

    #[test]
    fn test_peer_config_hosted() {
        let env: HashMap<&str, &str> = [
            ("ID", "robot-1"),
            ("NAME", "Rover"),
            ("TURN_USER", "user"),
            ("TURN_PASS", "pass"),
        ]
        .into();
        let config = PeerConfig::from_lookup(true, |k| env.get(k).map(|v| v.to_string()));

        assert!(config.secure);
        assert_eq!(config.port, 443);
        assert_eq!(config.ice_servers.len(), 2);
        assert_eq!(config.ice_servers[1].credential.as_deref(), Some("pass"));
        assert_eq!(config.display_name(), "Rover");
    }
}

//! Counters for listeners and the bridge

pub mod metrics;

pub use metrics::{BridgeCounters, BridgeStats, ListenerCounters, ListenerStats};

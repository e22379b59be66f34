//! Statistics for listeners and the bridge controller
//!
//! Counters are atomics updated on the hot path; callers read a plain
//! snapshot struct.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Live counters owned by one listener
#[derive(Debug)]
pub struct ListenerCounters {
    started_at: Instant,
    messages: AtomicU64,
    deliveries: AtomicU64,
    failed_deliveries: AtomicU64,
    frames_published: AtomicU64,
    frames_dropped: AtomicU64,
}

impl ListenerCounters {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            messages: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
            failed_deliveries: AtomicU64::new(0),
            frames_published: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
        }
    }

    pub fn message(&self) {
        self.messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivered(&self) {
        self.deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn delivery_failed(&self) {
        self.failed_deliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_published(&self) {
        self.frames_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the counters
    pub fn snapshot(&self, connections: usize) -> ListenerStats {
        ListenerStats {
            connections,
            uptime: self.started_at.elapsed(),
            messages: self.messages.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            failed_deliveries: self.failed_deliveries.load(Ordering::Relaxed),
            frames_published: self.frames_published.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for ListenerCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerStats {
    /// Connections currently registered
    pub connections: usize,
    /// Time since the listener was created
    pub uptime: Duration,
    /// Messages received from the bus
    pub messages: u64,
    /// Successful sends across all connections
    pub deliveries: u64,
    /// Sends that failed
    pub failed_deliveries: u64,
    /// Frames handed to the video track
    pub frames_published: u64,
    /// Frames dropped by conversion errors
    pub frames_dropped: u64,
}

impl ListenerStats {
    /// Messages per second since creation
    pub fn message_rate(&self) -> f64 {
        let secs = self.uptime.as_secs_f64();
        if secs > 0.0 {
            self.messages as f64 / secs
        } else {
            0.0
        }
    }
}

/// Live counters owned by the bridge controller
#[derive(Debug, Default)]
pub struct BridgeCounters {
    received: AtomicU64,
    opened: AtomicU64,
    closed: AtomicU64,
    calls: AtomicU64,
    failed_calls: AtomicU64,
    data_messages: AtomicU64,
}

impl BridgeCounters {
    pub fn received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn opened(&self) {
        self.opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn closed(&self) {
        self.closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn call(&self, ok: bool) {
        if ok {
            self.calls.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_calls.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn data(&self) {
        self.data_messages.fetch_add(1, Ordering::Relaxed);
    }

    /// Read the counters
    pub fn snapshot(&self, listeners: usize, open_peers: usize) -> BridgeStats {
        BridgeStats {
            listeners,
            open_peers,
            connections_received: self.received.load(Ordering::Relaxed),
            connections_opened: self.opened.load(Ordering::Relaxed),
            connections_closed: self.closed.load(Ordering::Relaxed),
            calls_placed: self.calls.load(Ordering::Relaxed),
            calls_failed: self.failed_calls.load(Ordering::Relaxed),
            data_messages: self.data_messages.load(Ordering::Relaxed),
        }
    }
}

/// Bridge-wide statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Listeners attached to the bus
    pub listeners: usize,
    /// Connections currently open
    pub open_peers: usize,
    /// Connections reported by the transport
    pub connections_received: u64,
    /// Connections that reached the open state
    pub connections_opened: u64,
    /// Connections closed
    pub connections_closed: u64,
    /// Media calls started
    pub calls_placed: u64,
    /// Media calls the transport refused
    pub calls_failed: u64,
    /// Inbound data messages on open connections
    pub data_messages: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_counters() {
        let counters = ListenerCounters::new();
        counters.message();
        counters.delivered();
        counters.delivered();
        counters.delivery_failed();
        counters.frame_dropped();

        let stats = counters.snapshot(2);
        assert_eq!(stats.connections, 2);
        assert_eq!(stats.messages, 1);
        assert_eq!(stats.deliveries, 2);
        assert_eq!(stats.failed_deliveries, 1);
        assert_eq!(stats.frames_published, 0);
        assert_eq!(stats.frames_dropped, 1);
    }

    #[test]
    fn test_message_rate_zero_uptime() {
        let stats = ListenerStats {
            messages: 10,
            ..Default::default()
        };
        assert_eq!(stats.message_rate(), 0.0);
    }

    #[test]
    fn test_message_rate() {
        let stats = ListenerStats {
            messages: 50,
            uptime: Duration::from_secs(10),
            ..Default::default()
        };
        assert_eq!(stats.message_rate(), 5.0);
    }

    #[test]
    fn test_bridge_counters() {
        let counters = BridgeCounters::default();
        counters.received();
        counters.opened();
        counters.call(true);
        counters.call(false);
        counters.data();
        counters.closed();

        let stats = counters.snapshot(3, 0);
        assert_eq!(stats.listeners, 3);
        assert_eq!(stats.connections_received, 1);
        assert_eq!(stats.connections_opened, 1);
        assert_eq!(stats.connections_closed, 1);
        assert_eq!(stats.calls_placed, 1);
        assert_eq!(stats.calls_failed, 1);
        assert_eq!(stats.data_messages, 1);
    }
}

//! Bridge controller
//!
//! Owns every listener and the shared media stream, and keeps each
//! connection's registration in lockstep across all listeners as transport
//! events arrive.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

use super::config::BridgeConfig;
use crate::bus::MessageBus;
use crate::convert::{ColorConverter, StandardConverter};
use crate::error::Result;
use crate::listener::{FaultSink, Listener, TracingFaultSink};
use crate::media::MediaStream;
use crate::peer::{
    ConnectionId, PeerConnection, PeerPhase, PeerState, PeerTransport, TransportEvent,
};
use crate::stats::{BridgeCounters, BridgeStats, ListenerStats};

/// Routes bus topics to connected peers
pub struct BridgeController {
    listeners: Vec<Arc<Listener>>,
    stream: Arc<MediaStream>,
    transport: Arc<dyn PeerTransport>,
    peers: RwLock<HashMap<ConnectionId, PeerState>>,
    tasks: Vec<JoinHandle<()>>,
    counters: BridgeCounters,
}

impl BridgeController {
    /// Build listeners for every configured topic and attach them to `bus`
    ///
    /// Uses the built-in color converter and logs faults through `tracing`.
    pub async fn start(
        config: &BridgeConfig,
        bus: &dyn MessageBus,
        transport: Arc<dyn PeerTransport>,
    ) -> Result<Self> {
        Self::start_with(
            config,
            bus,
            transport,
            Arc::new(StandardConverter),
            Arc::new(TracingFaultSink),
        )
        .await
    }

    /// Like [`start`](Self::start) with an explicit converter and fault sink
    ///
    /// Any invalid topic or refused subscription aborts startup.
    pub async fn start_with(
        config: &BridgeConfig,
        bus: &dyn MessageBus,
        transport: Arc<dyn PeerTransport>,
        converter: Arc<dyn ColorConverter>,
        faults: Arc<dyn FaultSink>,
    ) -> Result<Self> {
        config.validate()?;

        let stream = Arc::new(MediaStream::new(config.stream_id.clone()));
        let mut listeners = Vec::with_capacity(config.topics.len() + config.video.len());

        for topic in &config.topics {
            listeners.push(Arc::new(Listener::fanout(topic.topic(), Arc::clone(&faults))));
        }

        for name in &config.video {
            let listener = Listener::media(
                name.clone(),
                &stream,
                Arc::clone(&converter),
                Arc::clone(&faults),
                config.frame_capacity,
            )
            .await;
            listeners.push(Arc::new(listener));
        }

        let mut tasks = Vec::with_capacity(listeners.len());
        for listener in &listeners {
            match listener.attach(bus) {
                Ok(task) => tasks.push(task),
                Err(e) => {
                    tasks.iter().for_each(JoinHandle::abort);
                    return Err(e.into());
                }
            }
        }

        tracing::info!(
            node = %config.node_name,
            text_topics = config.topics.len(),
            video_topics = config.video.len(),
            "Bridge started"
        );

        Ok(Self {
            listeners,
            stream,
            transport,
            peers: RwLock::new(HashMap::new()),
            tasks,
            counters: BridgeCounters::default(),
        })
    }

    /// Consume transport events until the channel closes
    pub async fn run(&self, mut events: mpsc::Receiver<TransportEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        tracing::info!("Transport event stream ended");
    }

    /// Apply one transport event
    pub async fn handle_event(&self, event: TransportEvent) {
        tracing::trace!(conn = %event.connection_id(), event = ?event, "Transport event");

        match event {
            TransportEvent::ConnectionReceived(conn) => self.on_connection(conn).await,
            TransportEvent::Open(id) => self.on_open(id).await,
            TransportEvent::Data(id, data) => self.on_data(id, data.len()).await,
            TransportEvent::Close(id) => self.on_close(id).await,
        }
    }

    async fn on_connection(&self, conn: Arc<dyn PeerConnection>) {
        let mut peers = self.peers.write().await;
        let id = conn.id();

        if peers.contains_key(&id) {
            tracing::warn!(conn = %id, "Duplicate connection ignored");
            return;
        }

        tracing::info!(conn = %id, peer = %conn.peer(), "Connection received");
        peers.insert(id, PeerState::new(conn));
        self.counters.received();
    }

    async fn on_open(&self, id: ConnectionId) {
        // Held across registration so a racing close cannot interleave.
        let mut peers = self.peers.write().await;

        let Some(state) = peers.get_mut(&id) else {
            tracing::warn!(conn = %id, "Open for unknown connection");
            return;
        };
        if !state.open() {
            tracing::debug!(conn = %id, phase = ?state.phase, "Open ignored");
            return;
        }

        for listener in &self.listeners {
            listener.add_connection(&state.connection).await;
        }
        self.counters.opened();

        let peer = state.peer().clone();
        match self.transport.call(&peer, Arc::clone(&self.stream)) {
            Ok(()) => self.counters.call(true),
            Err(e) => {
                self.counters.call(false);
                tracing::warn!(conn = %id, peer = %peer, error = %e, "Media call failed");
            }
        }

        tracing::info!(
            conn = %id,
            peer = %peer,
            listeners = self.listeners.len(),
            "Connection open"
        );
    }

    async fn on_data(&self, id: ConnectionId, len: usize) {
        let mut peers = self.peers.write().await;

        match peers.get_mut(&id).map(|state| state.on_data()) {
            Some(true) => {
                self.counters.data();
                tracing::debug!(conn = %id, bytes = len, "Data received");
            }
            _ => tracing::debug!(conn = %id, "Data on connection that is not open ignored"),
        }
    }

    async fn on_close(&self, id: ConnectionId) {
        let mut peers = self.peers.write().await;

        // Closed entries are not kept, so a later connection may reuse the id.
        let Some(mut state) = peers.remove(&id) else {
            tracing::debug!(conn = %id, "Close for unknown or closed connection");
            return;
        };

        let was_open = state.is_open();
        if !state.close() {
            tracing::debug!(conn = %id, "Connection already closed");
            return;
        }

        for listener in &self.listeners {
            listener.remove_connection(id).await;
        }
        self.counters.closed();

        tracing::info!(
            conn = %id,
            peer = %state.peer(),
            was_open = was_open,
            data_messages = state.data_messages,
            "Connection closed"
        );
    }

    /// The shared outbound stream
    pub fn stream(&self) -> &Arc<MediaStream> {
        &self.stream
    }

    pub fn listeners(&self) -> &[Arc<Listener>] {
        &self.listeners
    }

    /// Listener for a topic name
    pub fn listener(&self, topic: &str) -> Option<&Arc<Listener>> {
        self.listeners.iter().find(|l| l.topic().name == topic)
    }

    /// Phase of a tracked connection
    ///
    /// Only `Pending` and `Open` are ever reported: a connection is dropped
    /// from the table as soon as it reaches `Closed`.
    pub async fn peer_phase(&self, id: ConnectionId) -> Option<PeerPhase> {
        self.peers.read().await.get(&id).map(|state| state.phase)
    }

    /// Bridge-wide statistics
    pub async fn stats(&self) -> BridgeStats {
        let open = self
            .peers
            .read()
            .await
            .values()
            .filter(|state| state.is_open())
            .count();
        self.counters.snapshot(self.listeners.len(), open)
    }

    /// Per-topic statistics
    pub async fn listener_stats(&self) -> Vec<(String, ListenerStats)> {
        let mut out = Vec::with_capacity(self.listeners.len());
        for listener in &self.listeners {
            out.push((listener.topic().name.clone(), listener.stats().await));
        }
        out
    }

    /// Stop every listener task
    pub fn shutdown(&self) {
        for task in &self.tasks {
            task.abort();
        }
        tracing::info!("Bridge stopped");
    }
}

impl Drop for BridgeController {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;

    use super::*;
    use crate::bus::LocalBus;
    use crate::error::{Error, SendError, TransportError};
    use crate::message::Topic;
    use crate::peer::PeerId;

    struct StubConnection(ConnectionId, PeerId);

    impl PeerConnection for StubConnection {
        fn id(&self) -> ConnectionId {
            self.0
        }

        fn peer(&self) -> &PeerId {
            &self.1
        }

        fn send(&self, _payload: Bytes) -> std::result::Result<(), SendError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        calls: Mutex<Vec<PeerId>>,
        refuse: bool,
    }

    impl PeerTransport for RecordingTransport {
        fn call(
            &self,
            peer: &PeerId,
            _stream: Arc<MediaStream>,
        ) -> std::result::Result<(), TransportError> {
            if self.refuse {
                return Err(TransportError::CallFailed(peer.to_string(), "busy".into()));
            }
            self.calls.lock().unwrap().push(peer.clone());
            Ok(())
        }
    }

    fn conn(id: u64) -> Arc<dyn PeerConnection> {
        Arc::new(StubConnection(ConnectionId(id), PeerId::new(format!("peer-{id}"))))
    }

    fn config() -> BridgeConfig {
        BridgeConfig::default()
            .topic("/status", "std_msgs/Bool")
            .topic("/battery", "sensor_msgs/BatteryState")
            .video("/camera")
    }

    async fn bridge(transport: Arc<RecordingTransport>) -> BridgeController {
        let bus = LocalBus::new();
        BridgeController::start(&config(), &bus, transport).await.unwrap()
    }

    #[tokio::test]
    async fn test_start_builds_listeners() {
        let bridge = bridge(Arc::new(RecordingTransport::default())).await;

        assert_eq!(bridge.listeners().len(), 3);
        assert!(bridge.listener("/camera").unwrap().is_media());
        assert!(!bridge.listener("/status").unwrap().is_media());
        assert_eq!(bridge.stream().tracks().await.len(), 1);
    }

    #[tokio::test]
    async fn test_open_registers_everywhere_and_calls() {
        let transport = Arc::new(RecordingTransport::default());
        let bridge = bridge(Arc::clone(&transport)).await;
        let c = conn(1);

        bridge.handle_event(TransportEvent::ConnectionReceived(Arc::clone(&c))).await;
        assert_eq!(bridge.peer_phase(ConnectionId(1)).await, Some(PeerPhase::Pending));
        for listener in bridge.listeners() {
            assert!(!listener.has_connection(ConnectionId(1)).await);
        }

        bridge.handle_event(TransportEvent::Open(ConnectionId(1))).await;
        assert_eq!(bridge.peer_phase(ConnectionId(1)).await, Some(PeerPhase::Open));
        for listener in bridge.listeners() {
            assert!(listener.has_connection(ConnectionId(1)).await);
        }
        assert_eq!(*transport.calls.lock().unwrap(), vec![PeerId::new("peer-1")]);

        // A repeated open neither re-registers nor calls again
        bridge.handle_event(TransportEvent::Open(ConnectionId(1))).await;
        assert_eq!(transport.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let bridge = bridge(Arc::new(RecordingTransport::default())).await;
        bridge.handle_event(TransportEvent::ConnectionReceived(conn(1))).await;
        bridge.handle_event(TransportEvent::Open(ConnectionId(1))).await;

        bridge.handle_event(TransportEvent::Close(ConnectionId(1))).await;
        bridge.handle_event(TransportEvent::Close(ConnectionId(1))).await;

        assert_eq!(bridge.peer_phase(ConnectionId(1)).await, None);
        for listener in bridge.listeners() {
            assert_eq!(listener.connection_count().await, 0);
        }

        let stats = bridge.stats().await;
        assert_eq!(stats.connections_closed, 1);
        assert_eq!(stats.open_peers, 0);
    }

    #[tokio::test]
    async fn test_closed_id_can_reconnect() {
        let transport = Arc::new(RecordingTransport::default());
        let bridge = bridge(Arc::clone(&transport)).await;
        bridge.handle_event(TransportEvent::ConnectionReceived(conn(1))).await;
        bridge.handle_event(TransportEvent::Open(ConnectionId(1))).await;
        bridge.handle_event(TransportEvent::Close(ConnectionId(1))).await;

        let again = conn(1);
        bridge.handle_event(TransportEvent::ConnectionReceived(Arc::clone(&again))).await;
        assert_eq!(bridge.peer_phase(ConnectionId(1)).await, Some(PeerPhase::Pending));

        bridge.handle_event(TransportEvent::Open(ConnectionId(1))).await;
        for listener in bridge.listeners() {
            assert!(listener.has_connection(ConnectionId(1)).await);
        }
        assert_eq!(transport.calls.lock().unwrap().len(), 2);

        let stats = bridge.stats().await;
        assert_eq!(stats.connections_received, 2);
        assert_eq!(stats.connections_closed, 1);
        assert_eq!(stats.open_peers, 1);
    }

    #[tokio::test]
    async fn test_pending_close_never_registers() {
        let transport = Arc::new(RecordingTransport::default());
        let bridge = bridge(Arc::clone(&transport)).await;
        bridge.handle_event(TransportEvent::ConnectionReceived(conn(1))).await;
        bridge.handle_event(TransportEvent::Close(ConnectionId(1))).await;
        bridge.handle_event(TransportEvent::Open(ConnectionId(1))).await;

        for listener in bridge.listeners() {
            assert!(!listener.has_connection(ConnectionId(1)).await);
        }
        assert!(transport.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_data_counted_only_when_open() {
        let bridge = bridge(Arc::new(RecordingTransport::default())).await;
        bridge.handle_event(TransportEvent::ConnectionReceived(conn(1))).await;
        bridge
            .handle_event(TransportEvent::Data(ConnectionId(1), Bytes::from_static(b"early")))
            .await;
        bridge.handle_event(TransportEvent::Open(ConnectionId(1))).await;
        bridge
            .handle_event(TransportEvent::Data(ConnectionId(1), Bytes::from_static(b"ping")))
            .await;

        assert_eq!(bridge.stats().await.data_messages, 1);
    }

    #[tokio::test]
    async fn test_refused_call_keeps_peer_open() {
        let transport = Arc::new(RecordingTransport {
            refuse: true,
            ..Default::default()
        });
        let bridge = bridge(transport).await;
        bridge.handle_event(TransportEvent::ConnectionReceived(conn(1))).await;
        bridge.handle_event(TransportEvent::Open(ConnectionId(1))).await;

        assert_eq!(bridge.peer_phase(ConnectionId(1)).await, Some(PeerPhase::Open));
        let stats = bridge.stats().await;
        assert_eq!(stats.calls_failed, 1);
        assert_eq!(stats.open_peers, 1);
    }

    #[tokio::test]
    async fn test_invalid_config_aborts_start() {
        let bus = LocalBus::new();
        let config = BridgeConfig::default().topic("/status", "");
        let result =
            BridgeController::start(&config, &bus, Arc::new(RecordingTransport::default())).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_refused_subscription_aborts_start() {
        let bus = LocalBus::new();
        bus.advertise(&Topic::new("/status", "std_msgs/String")).unwrap();

        let result =
            BridgeController::start(&config(), &bus, Arc::new(RecordingTransport::default())).await;
        assert!(matches!(result, Err(Error::Bus(_))));
    }

    #[tokio::test]
    async fn test_run_drains_event_channel() {
        let bridge = bridge(Arc::new(RecordingTransport::default())).await;
        let (tx, rx) = mpsc::channel(8);

        tx.send(TransportEvent::ConnectionReceived(conn(1))).await.unwrap();
        tx.send(TransportEvent::Open(ConnectionId(1))).await.unwrap();
        drop(tx);
        bridge.run(rx).await;

        assert_eq!(bridge.stats().await.open_peers, 1);
        assert_eq!(bridge.listener_stats().await.len(), 3);
    }
}

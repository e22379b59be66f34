//! Loopback bridge demo
//!
//! Run with: cargo run --example loopback_bridge [TOPICS_JSON]
//!
//! Without an argument the bridge carries one text topic (`/status`) and one
//! video topic (`/camera`). A synthetic publisher feeds both through an
//! in-process bus, and two simulated viewers connect, receive for a while,
//! and leave again.
//!
//! Set `RUST_LOG=topic_bridge=debug` for per-connection detail.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde_json::json;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use topic_bridge::error::{SendError, TransportError};
use topic_bridge::{
    BridgeConfig, BridgeController, ConnectionId, Encoding, ImageMessage, LocalBus, MediaStream,
    Message, PeerConfig, PeerConnection, PeerId, PeerTransport, TransportEvent,
};

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;

/// Viewer whose data channel prints what arrives
struct ConsoleViewer {
    id: ConnectionId,
    peer: PeerId,
}

impl PeerConnection for ConsoleViewer {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer(&self) -> &PeerId {
        &self.peer
    }

    fn send(&self, payload: Bytes) -> Result<(), SendError> {
        println!("[{}] data: {}", self.peer, String::from_utf8_lossy(&payload));
        Ok(())
    }
}

/// Transport that "answers" calls by reading every track in the stream
struct LoopbackTransport;

impl PeerTransport for LoopbackTransport {
    fn call(&self, peer: &PeerId, stream: Arc<MediaStream>) -> Result<(), TransportError> {
        let peer = peer.clone();
        tokio::spawn(async move {
            for track in stream.tracks().await {
                let mut frames = track.subscribe();
                let peer = peer.clone();
                tokio::spawn(async move {
                    let mut count = 0u64;
                    while let Ok(frame) = frames.recv().await {
                        count += 1;
                        if count % 10 == 0 {
                            println!(
                                "[{}] {} frame {} ({}x{}, {} bytes)",
                                peer,
                                track.label(),
                                count,
                                frame.width,
                                frame.height,
                                frame.data.len()
                            );
                        }
                    }
                });
            }
        });
        Ok(())
    }
}

/// Horizontal gradient shifted by `tick`
fn gradient(tick: u32) -> ImageMessage {
    let mut data = Vec::with_capacity((WIDTH * HEIGHT * 3) as usize);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            data.extend_from_slice(&[((x + tick) * 4) as u8, (y * 5) as u8, 128]);
        }
    }
    ImageMessage::packed(WIDTH, HEIGHT, Encoding::Rgb8, data)
}

fn viewer(id: u64, name: &str) -> Arc<dyn PeerConnection> {
    Arc::new(ConsoleViewer {
        id: ConnectionId(id),
        peer: PeerId::new(name),
    })
}

#[tokio::main]
async fn main() -> topic_bridge::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("topic_bridge=info")),
        )
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => BridgeConfig::from_file(path)?,
        None => BridgeConfig::default()
            .topic("/status", "std_msgs/String")
            .video("/camera"),
    };

    let peer_config = PeerConfig::from_env(false);
    println!(
        "Listening as {} via {}:{}",
        peer_config.display_name(),
        peer_config.host,
        peer_config.port
    );

    let bus = Arc::new(LocalBus::with_capacity(config.bus_capacity));
    let bridge =
        BridgeController::start(&config, bus.as_ref(), Arc::new(LoopbackTransport)).await?;
    let bridge = Arc::new(bridge);

    let (events_tx, events_rx) = mpsc::channel(32);
    let runner = {
        let bridge = Arc::clone(&bridge);
        tokio::spawn(async move { bridge.run(events_rx).await })
    };

    let publisher = {
        let bus = Arc::clone(&bus);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(33));
            for tick in 0u32.. {
                ticker.tick().await;
                if tick % 30 == 0 {
                    let body = json!({ "data": format!("tick {tick}") });
                    let status = Message::record("std_msgs/String", body);
                    if let Err(e) = bus.publish("/status", status) {
                        tracing::warn!(error = %e, "Status publish failed");
                    }
                }
                if let Err(e) = bus.publish("/camera", Message::Image(gradient(tick))) {
                    tracing::warn!(error = %e, "Camera publish failed");
                }
            }
        })
    };

    let alice = viewer(1, "alice");
    let bob = viewer(2, "bob");
    let script = [
        (0, TransportEvent::ConnectionReceived(Arc::clone(&alice))),
        (100, TransportEvent::Open(alice.id())),
        (1000, TransportEvent::ConnectionReceived(Arc::clone(&bob))),
        (100, TransportEvent::Open(bob.id())),
        (100, TransportEvent::Data(bob.id(), Bytes::from_static(b"hello"))),
        (1500, TransportEvent::Close(alice.id())),
        (1000, TransportEvent::Close(bob.id())),
    ];

    for (delay_ms, event) in script {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        if events_tx.send(event).await.is_err() {
            break;
        }
    }

    drop(events_tx);
    let _ = runner.await;
    publisher.abort();

    let stats = bridge.stats().await;
    println!("Bridge: {stats:?}");
    for (topic, stats) in bridge.listener_stats().await {
        println!(
            "{topic}: messages={} deliveries={} frames={} dropped={}",
            stats.messages, stats.deliveries, stats.frames_published, stats.frames_dropped
        );
    }

    for track in bridge.stream().tracks().await {
        println!("{}: {} track readers left", track.label(), track.receiver_count());
    }
    println!("/status: {} bus subscribers", bus.subscriber_count("/status"));

    bridge.shutdown();
    Ok(())
}

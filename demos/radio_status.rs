//! # Example: radio_status
//!
//! A simulated radio stack driven through a [`Coordinator`].
//!
//! Demonstrates how to:
//! - Implement [`Subsystem`] and [`Radio`] for a stack whose events arrive on its own thread.
//! - Query status from several callers racing the first (and only) setup.
//! - Dispose while the stack keeps emitting, and observe that late events are ignored.
//!
//! ## Flow
//! ```text
//! build() ──► Created
//!   ├─► status() x3 ──► ensure_ready ──► SimStack::start() (once)
//!   │                      └─► home: subscribe streams, start watcher
//!   ├─► scanner thread ──► EventSink::emit ──► home: apply ──► PeerDiscovered
//!   ├─► peers()
//!   └─► dispose() ──► home: unsubscribe ─► stop watcher ─► release ──► Disposed
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example radio_status --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use radiovisor::{
    Config, Coordinator, EventSink, LogWriter, Peer, Radio, RadioEvent, RadioState,
    RegistrationToken, SetupError, StreamKind, Subscribe, Subsystem, SubsystemError,
};
use tracing_subscriber::EnvFilter;

/// Emits a fake scan result every 50ms until stopped.
struct SimRadio {
    next_token: u64,
    scanning: Arc<AtomicBool>,
    scanner: Option<std::thread::JoinHandle<()>>,
}

impl Radio for SimRadio {
    fn state(&self) -> RadioState {
        RadioState::On
    }

    fn subscribe(
        &mut self,
        stream: StreamKind,
        sink: EventSink,
    ) -> Result<RegistrationToken, SubsystemError> {
        self.next_token += 1;
        if stream == StreamKind::Discovery {
            let scanning = Arc::clone(&self.scanning);
            self.scanner = Some(std::thread::spawn(move || {
                let mut n = 0u32;
                while scanning.load(Ordering::Acquire) {
                    n += 1;
                    let peer = Peer::new(format!("00:1A:7D:DA:71:{n:02X}"))
                        .with_name(format!("sensor-{n}"))
                        .with_rssi(-40 - (n as i16 % 50));
                    sink.emit(RadioEvent::PeerDiscovered(peer));
                    std::thread::sleep(Duration::from_millis(50));
                }
            }));
        }
        Ok(RegistrationToken {
            id: self.next_token,
            stream,
        })
    }

    fn unsubscribe(&mut self, _token: RegistrationToken) -> Result<(), SubsystemError> {
        Ok(())
    }

    fn start_watcher(&mut self) -> Result<(), SubsystemError> {
        Ok(())
    }

    fn stop_watcher(&mut self) -> Result<(), SubsystemError> {
        Ok(())
    }

    fn release(&mut self) -> Result<(), SubsystemError> {
        // The scanner keeps running a little longer to show that late events are dropped.
        let scanning = Arc::clone(&self.scanning);
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(120));
            scanning.store(false, Ordering::Release);
        });
        self.scanner.take();
        Ok(())
    }
}

struct SimStack;

#[async_trait]
impl Subsystem for SimStack {
    type Radio = SimRadio;

    async fn start(&self) -> Result<SimRadio, SetupError> {
        println!("[stack] powering up adapter");
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(SimRadio {
            next_token: 0,
            scanning: Arc::new(AtomicBool::new(true)),
            scanner: None,
        })
    }

    fn name(&self) -> &'static str {
        "sim-stack"
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cfg = Config {
        name: "demo-radio".into(),
        ..Config::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let plugin = Coordinator::builder(SimStack, cfg)
        .with_subscribers(subs)
        .build()?;

    let (a, b, c) = tokio::join!(plugin.status(), plugin.status(), plugin.status());
    println!("[main] three callers, one setup: {:?}", a?);
    assert_eq!(b?, c?);

    tokio::time::sleep(Duration::from_millis(300)).await;
    let peers = plugin.peers().await?;
    println!("[main] {} peers discovered", peers.len());
    for p in peers.iter().take(3) {
        println!("  {} {:?} rssi={:?}", p.id, p.name, p.rssi);
    }

    plugin.dispose();
    plugin.closed().await;
    println!("[main] after dispose: {:?}", plugin.status().await);

    // Give the scanner time to emit into the revoked sink.
    tokio::time::sleep(Duration::from_millis(200)).await;
    Ok(())
}

//! Shared fake radio stack for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use radiovisor::{
    Event, EventKind, EventSink, Radio, RadioState, RegistrationToken, SetupError, StreamKind,
    Subscribe, Subsystem, SubsystemError,
};
use tokio::sync::{broadcast, oneshot};

/// Counts every call the coordinator makes into the fake stack.
#[derive(Default)]
pub struct Probe {
    pub starts: AtomicUsize,
    pub state_reads: AtomicUsize,
    pub subscribes: AtomicUsize,
    pub unsubscribes: AtomicUsize,
    pub watcher_starts: AtomicUsize,
    pub watcher_stops: AtomicUsize,
    pub releases: AtomicUsize,
    pub sinks: Mutex<Vec<EventSink>>,
}

impl Probe {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn sink(&self, stream: StreamKind) -> EventSink {
        self.sinks
            .lock()
            .iter()
            .find(|s| s.stream() == stream)
            .cloned()
            .expect("stream subscribed")
    }
}

pub struct FakeRadio {
    probe: Arc<Probe>,
    state: RadioState,
    fail_unsubscribe: bool,
    next_token: u64,
}

impl Radio for FakeRadio {
    fn state(&self) -> RadioState {
        self.probe.state_reads.fetch_add(1, Ordering::SeqCst);
        self.state
    }

    fn subscribe(
        &mut self,
        stream: StreamKind,
        sink: EventSink,
    ) -> Result<RegistrationToken, SubsystemError> {
        self.probe.subscribes.fetch_add(1, Ordering::SeqCst);
        self.probe.sinks.lock().push(sink);
        self.next_token += 1;
        Ok(RegistrationToken {
            id: self.next_token,
            stream,
        })
    }

    fn unsubscribe(&mut self, token: RegistrationToken) -> Result<(), SubsystemError> {
        self.probe.unsubscribes.fetch_add(1, Ordering::SeqCst);
        if self.fail_unsubscribe {
            return Err(SubsystemError::UnknownToken(token.id));
        }
        Ok(())
    }

    fn start_watcher(&mut self) -> Result<(), SubsystemError> {
        self.probe.watcher_starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop_watcher(&mut self) -> Result<(), SubsystemError> {
        self.probe.watcher_stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn release(&mut self) -> Result<(), SubsystemError> {
        self.probe.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Fake setup routine.
pub struct FakeStack {
    pub probe: Arc<Probe>,
    result: Result<RadioState, SetupError>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    delay: Duration,
    fail_unsubscribe: bool,
    panics: bool,
}

impl FakeStack {
    pub fn ok(state: RadioState) -> Self {
        Self {
            probe: Arc::new(Probe::default()),
            result: Ok(state),
            gate: Mutex::new(None),
            delay: Duration::from_millis(10),
            fail_unsubscribe: false,
            panics: false,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(SetupError::new(reason)),
            ..Self::ok(RadioState::Unknown)
        }
    }

    /// Setup routine that panics instead of answering.
    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::ok(RadioState::Unknown)
        }
    }

    /// Holds the setup routine until the returned sender fires.
    pub fn gated(mut self) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        self.gate = Mutex::new(Some(rx));
        (self, tx)
    }

    pub fn with_failing_unsubscribe(mut self) -> Self {
        self.fail_unsubscribe = true;
        self
    }
}

#[async_trait]
impl Subsystem for FakeStack {
    type Radio = FakeRadio;

    async fn start(&self) -> Result<FakeRadio, SetupError> {
        self.probe.starts.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        tokio::time::sleep(self.delay).await;
        if self.panics {
            panic!("driver crashed during setup");
        }
        let state = self.result.clone()?;
        Ok(FakeRadio {
            probe: Arc::clone(&self.probe),
            state,
            fail_unsubscribe: self.fail_unsubscribe,
            next_token: 0,
        })
    }

    fn name(&self) -> &'static str {
        "fake-stack"
    }
}

/// Subscriber recording every event kind it sees.
#[derive(Default)]
pub struct Recorder {
    pub seen: Mutex<Vec<EventKind>>,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.seen.lock().push(event.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

/// Waits until an event of `kind` arrives, returning it.
pub async fn wait_for(rx: &mut broadcast::Receiver<Event>, kind: EventKind) -> Event {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match rx.recv().await {
                Ok(ev) if ev.kind == kind => return ev,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("bus closed before {kind:?}"),
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {kind:?}"))
}

/// Polls `cond` until it holds.
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never held");
}

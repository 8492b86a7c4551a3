//! # Home-context state.
//!
//! [`HomeState`] lives inside the dispatcher's home task and is only ever
//! touched by jobs running there. It owns the [`ExternalHandle`] and the
//! containers derived from radio events.
//!
//! ## Teardown order
//! ```text
//! revoke every RegistrationToken ─► stop watcher ─► release radio ─► clear peers/connections
//! ```
//! Each step is best-effort: a failure is collected and the next step still runs.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::SubsystemError;
use crate::radio::{
    EventSink, Peer, PeerId, Radio, RadioEvent, RadioState, RadioStatus, RegistrationToken,
    StreamKind,
};

/// A teardown step that failed and was absorbed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: &'static str,
    pub error: SubsystemError,
}

/// Live radio plus everything derived from it.
///
/// Releases the radio on drop if teardown never got to it (e.g. a handle
/// created by a setup that finished after dispose).
pub struct ExternalHandle<R: Radio> {
    radio: R,
    tokens: Vec<RegistrationToken>,
    watching: bool,
    released: bool,
}

impl<R: Radio> ExternalHandle<R> {
    pub fn new(radio: R) -> Self {
        Self {
            radio,
            tokens: Vec::new(),
            watching: false,
            released: false,
        }
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Registration tokens currently held.
    pub fn tokens(&self) -> &[RegistrationToken] {
        &self.tokens
    }

    fn subscribe(&mut self, stream: StreamKind, sink: EventSink) -> Result<(), SubsystemError> {
        let token = self.radio.subscribe(stream, sink)?;
        self.tokens.push(token);
        Ok(())
    }

    fn start_watcher(&mut self) -> Result<(), SubsystemError> {
        self.radio.start_watcher()?;
        self.watching = true;
        Ok(())
    }

    /// Runs the teardown steps in order, collecting failures.
    fn shutdown(mut self, failures: &mut Vec<StepFailure>) {
        for token in std::mem::take(&mut self.tokens) {
            if let Err(error) = self.radio.unsubscribe(token) {
                failures.push(StepFailure {
                    step: "unsubscribe",
                    error,
                });
            }
        }
        if self.watching {
            self.watching = false;
            if let Err(error) = self.radio.stop_watcher() {
                failures.push(StepFailure {
                    step: "stop_watcher",
                    error,
                });
            }
        }
        self.released = true;
        if let Err(error) = self.radio.release() {
            failures.push(StepFailure {
                step: "release",
                error,
            });
        }
    }
}

impl<R: Radio> Drop for ExternalHandle<R> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = self.radio.release() {
            tracing::warn!(error = %err, "releasing discarded radio handle failed");
        }
    }
}

/// State owned by the home context.
pub struct HomeState<R: Radio> {
    handle: Option<ExternalHandle<R>>,
    state: RadioState,
    peers: BTreeMap<PeerId, Peer>,
    connections: BTreeSet<PeerId>,
}

impl<R: Radio> Default for HomeState<R> {
    fn default() -> Self {
        Self {
            handle: None,
            state: RadioState::Unknown,
            peers: BTreeMap::new(),
            connections: BTreeSet::new(),
        }
    }
}

impl<R: Radio> HomeState<R> {
    /// Installs the radio and subscribes to `streams`.
    ///
    /// Subscription and watcher failures are logged; the handle is kept either way.
    pub fn install(
        &mut self,
        mut handle: ExternalHandle<R>,
        streams: &[StreamKind],
        mut sink_for: impl FnMut(StreamKind) -> EventSink,
        watch: bool,
    ) {
        debug_assert!(self.handle.is_none(), "radio installed twice");
        self.state = handle.radio.state();
        for &stream in streams {
            if let Err(err) = handle.subscribe(stream, sink_for(stream)) {
                tracing::warn!(stream = stream.as_str(), error = %err, "subscribing to radio stream failed");
            }
        }
        if watch {
            if let Err(err) = handle.start_watcher() {
                tracing::warn!(error = %err, "starting discovery watcher failed");
            }
        }
        self.handle = Some(handle);
    }

    pub fn is_installed(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<&ExternalHandle<R>> {
        self.handle.as_ref()
    }

    pub fn status(&self) -> RadioStatus {
        RadioStatus {
            state: self.state,
            availability: self.state.availability(),
            peers: self.peers.len(),
            connections: self.connections.len(),
        }
    }

    pub fn peers(&self) -> Vec<Peer> {
        self.peers.values().cloned().collect()
    }

    pub fn connections(&self) -> Vec<PeerId> {
        self.connections.iter().cloned().collect()
    }

    /// Applies a radio event. Returns `false` if it changed nothing.
    pub fn apply(&mut self, event: &RadioEvent) -> bool {
        match event {
            RadioEvent::StateChanged(state) => {
                let changed = self.state != *state;
                self.state = *state;
                changed
            }
            RadioEvent::PeerDiscovered(peer) => {
                self.peers.insert(peer.id.clone(), peer.clone()) != Some(peer.clone())
            }
            RadioEvent::PeerLost(id) => {
                self.connections.remove(id);
                self.peers.remove(id).is_some()
            }
            RadioEvent::Connected(id) => self.connections.insert(id.clone()),
            RadioEvent::Disconnected(id) => self.connections.remove(id),
        }
    }

    /// Revokes, stops, releases and clears. Never fails; returns absorbed failures.
    pub fn teardown(&mut self) -> Vec<StepFailure> {
        let mut failures = Vec::new();
        if let Some(handle) = self.handle.take() {
            handle.shutdown(&mut failures);
        }
        self.peers.clear();
        self.connections.clear();
        self.state = RadioState::Unknown;
        failures
    }
}

//! # Lifecycle events emitted by the coordinator.
//!
//! The [`EventKind`] enum classifies events across four categories:
//! - **Initialization**: the single-flight setup routine (started, succeeded, failed, discarded)
//! - **Radio**: notifications forwarded from the subsystem after the home context applied them
//! - **Teardown**: dispose requested, absorbed step failures, teardown finished
//! - **Subscriber**: fan-out workers dropping events or panicking
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use radiovisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TeardownStepFailed)
//!     .with_component("printer")
//!     .with_step("unsubscribe")
//!     .with_reason("unknown registration token 3");
//!
//! assert_eq!(ev.kind, EventKind::TeardownStepFailed);
//! assert_eq!(ev.step, Some("unsubscribe"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::radio::{PeerId, RadioEvent, RadioState, StreamKind};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Initialization ===
    /// The setup routine was invoked (first caller won the single-flight race).
    ///
    /// Sets: `component`
    InitStarted,

    /// The setup routine succeeded; waiters are being released.
    ///
    /// Sets: `component`
    InitSucceeded,

    /// The setup routine failed. A panic is reported with reason `"setup panicked"`.
    ///
    /// Sets: `component`, `reason`
    InitFailed,

    /// The setup routine completed after teardown began; its result was dropped.
    ///
    /// Sets: `component`, `reason` (`"succeeded"` or the failure code)
    InitDiscarded,

    // === Radio ===
    /// Radio state changed.
    ///
    /// Sets: `component`, `stream`, `state`
    RadioStateChanged,

    /// A peer was discovered and recorded.
    ///
    /// Sets: `component`, `stream`, `peer`
    PeerDiscovered,

    /// A peer disappeared and was removed.
    ///
    /// Sets: `component`, `stream`, `peer`
    PeerLost,

    /// A connection record was added.
    ///
    /// Sets: `component`, `stream`, `peer`
    PeerConnected,

    /// A connection record was removed.
    ///
    /// Sets: `component`, `stream`, `peer`
    PeerDisconnected,

    // === Teardown ===
    /// `dispose()` was called for the first time.
    ///
    /// Sets: `component`
    DisposeRequested,

    /// A best-effort teardown step failed; teardown continued.
    ///
    /// Sets: `component`, `step`, `reason`
    TeardownStepFailed,

    /// Teardown finished on the home context.
    ///
    /// Sets: `component`
    Disposed,

    // === Subscriber ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `component` (subscriber name), `reason`
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `component` (subscriber name), `reason`
    SubscriberOverflow,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the emitting component or subscriber.
    pub component: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Teardown step name.
    pub step: Option<&'static str>,
    /// Originating radio stream.
    pub stream: Option<StreamKind>,
    /// Radio state carried by a state change.
    pub state: Option<RadioState>,
    /// Peer the event refers to.
    pub peer: Option<PeerId>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            component: None,
            reason: None,
            step: None,
            stream: None,
            state: None,
            peer: None,
        }
    }

    #[inline]
    pub fn with_component(mut self, component: impl Into<Arc<str>>) -> Self {
        self.component = Some(component.into());
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_step(mut self, step: &'static str) -> Self {
        self.step = Some(step);
        self
    }

    #[inline]
    pub fn with_stream(mut self, stream: StreamKind) -> Self {
        self.stream = Some(stream);
        self
    }

    #[inline]
    pub fn with_state(mut self, state: RadioState) -> Self {
        self.state = Some(state);
        self
    }

    #[inline]
    pub fn with_peer(mut self, peer: PeerId) -> Self {
        self.peer = Some(peer);
        self
    }

    /// Creates the event published after the home context applied a radio event.
    pub fn radio(stream: StreamKind, event: &RadioEvent) -> Self {
        let ev = match event {
            RadioEvent::StateChanged(state) => {
                Event::new(EventKind::RadioStateChanged).with_state(*state)
            }
            RadioEvent::PeerDiscovered(peer) => {
                Event::new(EventKind::PeerDiscovered).with_peer(peer.id.clone())
            }
            RadioEvent::PeerLost(id) => Event::new(EventKind::PeerLost).with_peer(id.clone()),
            RadioEvent::Connected(id) => {
                Event::new(EventKind::PeerConnected).with_peer(id.clone())
            }
            RadioEvent::Disconnected(id) => {
                Event::new(EventKind::PeerDisconnected).with_peer(id.clone())
            }
        };
        ev.with_stream(stream)
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_component(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_component(subscriber)
            .with_reason(info)
    }

    /// True for events produced by the subscriber machinery itself.
    #[inline]
    pub fn is_subscriber_internal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::InitStarted);
        let b = Event::new(EventKind::InitSucceeded);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn subscriber_events_are_internal() {
        assert!(Event::subscriber_overflow("audit", "full").is_subscriber_internal());
        assert!(!Event::new(EventKind::Disposed).is_subscriber_internal());
    }
}

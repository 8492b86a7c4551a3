//! # Subsystem traits
//!
//! [`Subsystem`] is the setup routine; [`Radio`] is what it produces.
//!
//! ## Contract
//! - `Subsystem::start` is invoked **at most once** per coordinator, and only
//!   after the first public operation. Constructing a coordinator never calls it.
//! - `Radio` methods are called only from the home context, one at a time.
//! - Events pushed into an [`EventSink`] may come from any thread, at any time,
//!   including after teardown; the sink turns late events into no-ops.
//!
//! ## Example (skeleton)
//! ```rust
//! use async_trait::async_trait;
//! use radiovisor::{
//!     EventSink, Radio, RadioState, RegistrationToken, SetupError, StreamKind,
//!     Subsystem, SubsystemError,
//! };
//!
//! struct NullRadio;
//!
//! impl Radio for NullRadio {
//!     fn state(&self) -> RadioState { RadioState::Unsupported }
//!     fn subscribe(&mut self, stream: StreamKind, _sink: EventSink)
//!         -> Result<RegistrationToken, SubsystemError> {
//!         Ok(RegistrationToken { id: 1, stream })
//!     }
//!     fn unsubscribe(&mut self, _token: RegistrationToken) -> Result<(), SubsystemError> { Ok(()) }
//!     fn start_watcher(&mut self) -> Result<(), SubsystemError> { Ok(()) }
//!     fn stop_watcher(&mut self) -> Result<(), SubsystemError> { Ok(()) }
//!     fn release(&mut self) -> Result<(), SubsystemError> { Ok(()) }
//! }
//!
//! struct NullStack;
//!
//! #[async_trait]
//! impl Subsystem for NullStack {
//!     type Radio = NullRadio;
//!     async fn start(&self) -> Result<NullRadio, SetupError> { Ok(NullRadio) }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{SetupError, SubsystemError};
use crate::radio::{RadioEvent, RadioState, RegistrationToken, StreamKind};

/// The external subsystem's one-time setup routine.
#[async_trait]
pub trait Subsystem: Send + Sync + 'static {
    /// Live handle produced by a successful setup.
    type Radio: Radio;

    /// Starts the subsystem.
    ///
    /// May complete on any thread after an arbitrary delay. A failure here is
    /// treated as a stable fact for the process lifetime and is never retried.
    async fn start(&self) -> Result<Self::Radio, SetupError>;

    /// Human-readable name (for logs/events).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A live connection to the radio stack.
///
/// Owned exclusively by the home context; every method runs there.
pub trait Radio: Send + 'static {
    /// Current power/support state.
    fn state(&self) -> RadioState;

    /// Subscribes to one event stream. Events are delivered through `sink`.
    fn subscribe(
        &mut self,
        stream: StreamKind,
        sink: EventSink,
    ) -> Result<RegistrationToken, SubsystemError>;

    /// Revokes a subscription made by [`Radio::subscribe`].
    fn unsubscribe(&mut self, token: RegistrationToken) -> Result<(), SubsystemError>;

    /// Starts the long-lived discovery watcher.
    fn start_watcher(&mut self) -> Result<(), SubsystemError>;

    /// Stops the discovery watcher. Called during teardown if it was started.
    fn stop_watcher(&mut self) -> Result<(), SubsystemError>;

    /// Releases the underlying OS resources. Called exactly once.
    fn release(&mut self) -> Result<(), SubsystemError>;
}

/// Callback the radio uses to deliver [`RadioEvent`]s.
///
/// Cheap to clone; callable from any thread.
#[derive(Clone)]
pub struct EventSink {
    stream: StreamKind,
    deliver: Arc<dyn Fn(StreamKind, RadioEvent) + Send + Sync>,
}

impl EventSink {
    /// Wraps a delivery function for the given stream.
    pub fn new(
        stream: StreamKind,
        deliver: impl Fn(StreamKind, RadioEvent) + Send + Sync + 'static,
    ) -> Self {
        Self {
            stream,
            deliver: Arc::new(deliver),
        }
    }

    /// Stream this sink was created for.
    pub fn stream(&self) -> StreamKind {
        self.stream
    }

    /// Delivers one event. Never blocks.
    pub fn emit(&self, event: RadioEvent) {
        (self.deliver)(self.stream, event);
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("stream", &self.stream)
            .finish_non_exhaustive()
    }
}

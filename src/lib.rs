//! # radiovisor
//!
//! **radiovisor** is the lifecycle-safety core for a long-lived plugin that
//! drives an asynchronous radio subsystem it does not own.
//!
//! The subsystem delivers completions and events on its own threads, at any
//! time, including after the plugin has been torn down. This crate guarantees:
//!
//! - the subsystem is not touched until the first public operation;
//! - its setup routine runs at most once, however many callers race for it;
//! - once teardown begins, no pending or future callback observes or mutates
//!   the plugin's state, and no caller is left without an answer.
//!
//! ## Architecture
//! ```text
//!   caller threads                       subsystem threads
//!        │ get_status(reply)                  │ setup completion / radio events
//!        ▼                                    ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ Coordinator                                                      │
//! │  - LivenessFlag            (alive → dead latch, acquire/release) │
//! │  - SingleFlightInitializer (NotStarted → InFlight → terminal)    │
//! │  - CompletionDispatcher    (post_to_home, checked twice)         │
//! │  - Bus + SubscriberSet     (lifecycle events)                    │
//! └──────────────────────────────┬───────────────────────────────────┘
//!                                ▼
//!                      home task (single, lazy)
//!                      HomeState: ExternalHandle<Radio>,
//!                      RegistrationTokens, peers, connections
//! ```
//!
//! ### Lifecycle
//! ```text
//! build() ─► Created ─► (first op) Initializing ─► Ready ─► dispose() ─► Disposed
//!
//! dispose():
//!   ├─► mark_dead()
//!   ├─► discard init waiters      → their callers get CallError::Disposed
//!   └─► home: revoke tokens → stop watcher → release radio → clear state
//!             (each step best-effort, failures logged)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Coordinator**   | Guarded public operations and ordered teardown.               | [`Coordinator`], [`CoordinatorBuilder`]     |
//! | **Primitives**    | Liveness latch, single-flight init, home-context dispatch.    | [`LivenessFlag`], [`SingleFlightInitializer`], [`CompletionDispatcher`] |
//! | **Subsystem seam**| Setup routine, live radio handle, event sinks.                | [`Subsystem`], [`Radio`], [`EventSink`]     |
//! | **Replies**       | Exactly-once answers; dropping answers `Disposed`.            | [`Responder`], [`CallError`]                |
//! | **Events**        | Lifecycle events and subscriber fan-out.                      | [`Event`], [`Subscribe`], [`SubscriberSet`] |
//! | **Configuration** | Streams, watcher, bus capacity.                               | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports [`LogWriter`], a subscriber rendering events through `tracing`.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use radiovisor::{
//!     Availability, Config, Coordinator, EventSink, Radio, RadioState, RegistrationToken,
//!     SetupError, StreamKind, Subsystem, SubsystemError,
//! };
//!
//! struct Adapter;
//!
//! impl Radio for Adapter {
//!     fn state(&self) -> RadioState { RadioState::On }
//!     fn subscribe(&mut self, stream: StreamKind, _sink: EventSink)
//!         -> Result<RegistrationToken, SubsystemError> {
//!         Ok(RegistrationToken { id: 1, stream })
//!     }
//!     fn unsubscribe(&mut self, _t: RegistrationToken) -> Result<(), SubsystemError> { Ok(()) }
//!     fn start_watcher(&mut self) -> Result<(), SubsystemError> { Ok(()) }
//!     fn stop_watcher(&mut self) -> Result<(), SubsystemError> { Ok(()) }
//!     fn release(&mut self) -> Result<(), SubsystemError> { Ok(()) }
//! }
//!
//! struct Stack;
//!
//! #[async_trait]
//! impl Subsystem for Stack {
//!     type Radio = Adapter;
//!     async fn start(&self) -> Result<Adapter, SetupError> { Ok(Adapter) }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let plugin = Coordinator::builder(Stack, Config::default()).build()?;
//!
//!     let status = plugin.status().await?;
//!     assert_eq!(status.availability, Availability::Available);
//!
//!     plugin.dispose();
//!     plugin.closed().await;
//!     assert!(plugin.status().await.unwrap_err().is_disposed());
//!     Ok(())
//! }
//! ```

mod core;
mod error;
mod events;
mod radio;
mod reply;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{
    CompletionDispatcher, Config, Continuation, Coordinator, CoordinatorBuilder, ExternalHandle,
    HomeJob, HomeState, InitOutcome, InitState, LifecycleState, LivenessFlag,
    SingleFlightInitializer, StepFailure,
};
pub use error::{CallError, RuntimeError, SetupError, SubsystemError};
pub use events::{Bus, Event, EventKind};
pub use radio::{
    Availability, EventSink, Peer, PeerId, Radio, RadioEvent, RadioState, RadioStatus,
    RegistrationToken, StreamKind, Subsystem,
};
pub use reply::{Reply, Responder};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a built-in tracing subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

//! Lifecycle core.
//!
//! The only entry point from this module is [`Coordinator`] (built through
//! [`CoordinatorBuilder`]); the primitives it composes are public so hosts can
//! reuse them on their own seams.
//!
//! Internal modules:
//! - [`liveness`]: the monotonic alive → dead latch;
//! - [`initializer`]: single-flight setup with a waiter list;
//! - [`dispatcher`]: marshals completions onto the single home task;
//! - [`home`]: state owned by the home task (radio handle, tokens, peers);
//! - [`coordinator`]: public operations and ordered teardown;
//! - [`builder`]: wiring of bus, subscribers and runtime.

mod builder;
mod config;
mod coordinator;
mod dispatcher;
mod home;
mod initializer;
mod liveness;

pub use builder::CoordinatorBuilder;
pub use config::Config;
pub use coordinator::{Coordinator, LifecycleState};
pub use dispatcher::{CompletionDispatcher, HomeJob};
pub use home::{ExternalHandle, HomeState, StepFailure};
pub use initializer::{Continuation, InitOutcome, InitState, SingleFlightInitializer};
pub use liveness::LivenessFlag;

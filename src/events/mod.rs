//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the initializer, the home context,
//! teardown and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Coordinator` (init, dispose, teardown), the home context
//!   (forwarded radio events), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the subscriber listener (fans out to `SubscriberSet`) and
//!   anyone holding [`Coordinator::subscribe_events`](crate::Coordinator::subscribe_events).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};

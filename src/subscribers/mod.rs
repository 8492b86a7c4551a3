//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] that
//! drives user subscribers from the coordinator's [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Coordinator / home context ── publish(Event) ──► Bus ──► subscriber listener
//!                                                              │
//!                                                              ▼
//!                                                       SubscriberSet::emit
//!                                                   ┌──────────┼──────────┐
//!                                                   ▼          ▼          ▼
//!                                               LogWriter    Audit     Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use radiovisor::{Subscribe, Event, EventKind};
//! use async_trait::async_trait;
//!
//! struct TeardownAudit;
//!
//! #[async_trait]
//! impl Subscribe for TeardownAudit {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::TeardownStepFailed {
//!             // record the absorbed failure
//!         }
//!     }
//! }
//! ```

mod embedded;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;

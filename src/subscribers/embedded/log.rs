//! # LogWriter: event renderer
//!
//! A minimal subscriber that renders incoming [`Event`]s as `tracing` records
//! under the `radiovisor::events` target.
//!
//! ## Example output
//! ```text
//! INFO radiovisor::events: init started component="printer"
//! WARN radiovisor::events: init failed component="printer" reason="radio_missing"
//! WARN radiovisor::events: teardown step failed component="printer" step="unsubscribe" reason="..."
//! INFO radiovisor::events: disposed component="printer"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "radiovisor::events";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let component = e.component.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::InitStarted => {
                tracing::info!(target: TARGET, component, "init started");
            }
            EventKind::InitSucceeded => {
                tracing::info!(target: TARGET, component, "init succeeded");
            }
            EventKind::InitFailed => {
                tracing::warn!(target: TARGET, component, reason, "init failed");
            }
            EventKind::InitDiscarded => {
                tracing::info!(target: TARGET, component, reason, "init result discarded");
            }
            EventKind::RadioStateChanged => {
                tracing::info!(target: TARGET, component, state = ?e.state, "radio state changed");
            }
            EventKind::PeerDiscovered
            | EventKind::PeerLost
            | EventKind::PeerConnected
            | EventKind::PeerDisconnected => {
                tracing::debug!(
                    target: TARGET,
                    component,
                    kind = ?e.kind,
                    peer = e.peer.as_ref().map(|p| p.as_str()).unwrap_or("-"),
                    "peer update"
                );
            }
            EventKind::DisposeRequested => {
                tracing::info!(target: TARGET, component, "dispose requested");
            }
            EventKind::TeardownStepFailed => {
                tracing::warn!(
                    target: TARGET,
                    component,
                    step = e.step.unwrap_or("-"),
                    reason,
                    "teardown step failed"
                );
            }
            EventKind::Disposed => {
                tracing::info!(target: TARGET, component, "disposed");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: TARGET, subscriber = component, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: TARGET, subscriber = component, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

//! # Coordinator configuration.
//!
//! Provides [`Config`], the settings applied when the radio becomes ready and
//! when the coordinator wires its event plumbing.
//!
//! ## Sentinel values
//! - `bus_capacity = 0` → clamped to 1
//! - `streams` empty → no event subscriptions (status stays at the initial reading)

use std::sync::Arc;

use crate::radio::StreamKind;

/// Configuration for a [`Coordinator`](crate::Coordinator).
///
/// ## Field semantics
/// - `name`: component label used in logs and events
/// - `bus_capacity`: lifecycle event ring buffer size (min 1)
/// - `streams`: radio event streams subscribed once setup succeeds
/// - `watch_on_ready`: start the discovery watcher once setup succeeds
#[derive(Clone, Debug)]
pub struct Config {
    /// Component label used in logs and events.
    pub name: Arc<str>,

    /// Capacity of the lifecycle event broadcast channel.
    ///
    /// Receivers lagging more than `bus_capacity` events skip the oldest ones.
    pub bus_capacity: usize,

    /// Radio event streams to subscribe to, in order.
    pub streams: Vec<StreamKind>,

    /// Whether to start the discovery watcher after setup.
    pub watch_on_ready: bool,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Streams with duplicates removed, first occurrence wins.
    pub fn unique_streams(&self) -> Vec<StreamKind> {
        let mut out: Vec<StreamKind> = Vec::with_capacity(self.streams.len());
        for s in &self.streams {
            if !out.contains(s) {
                out.push(*s);
            }
        }
        out
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `name = "radio"`
    /// - `bus_capacity = 1024`
    /// - `streams` = every [`StreamKind`]
    /// - `watch_on_ready = true`
    fn default() -> Self {
        Self {
            name: Arc::from("radio"),
            bus_capacity: 1024,
            streams: StreamKind::ALL.to_vec(),
            watch_on_ready: true,
        }
    }
}

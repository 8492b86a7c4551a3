//! # Liveness latch.
//!
//! A one-way `alive → dead` flag read by every asynchronous entry point.
//!
//! ## Rules
//! - Initial value is `alive`.
//! - [`LivenessFlag::mark_dead`] is idempotent and never undone.
//! - The store is `Release`, every load is `Acquire`: a thread that observes
//!   `dead` also observes every write made before `mark_dead()`.

use std::sync::atomic::{AtomicBool, Ordering};

/// Monotonic liveness latch shared by the coordinator and its continuations.
#[derive(Debug)]
pub struct LivenessFlag {
    alive: AtomicBool,
}

impl Default for LivenessFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl LivenessFlag {
    /// Creates a flag in the `alive` state.
    pub const fn new() -> Self {
        Self {
            alive: AtomicBool::new(true),
        }
    }

    /// Flips the flag to `dead`.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn mark_dead(&self) -> bool {
        self.alive.swap(false, Ordering::AcqRel)
    }

    /// Returns `false` once [`mark_dead`](Self::mark_dead) has run. Never blocks.
    #[inline]
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn mark_dead_is_idempotent() {
        let flag = LivenessFlag::new();
        assert!(flag.is_alive());
        assert!(flag.mark_dead());
        assert!(!flag.mark_dead());
        assert!(!flag.is_alive());
    }

    #[test]
    fn no_thread_sees_alive_after_mark_dead_returns() {
        let flag = Arc::new(LivenessFlag::new());
        flag.mark_dead();

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let flag = Arc::clone(&flag);
                std::thread::spawn(move || (0..1_000).all(|_| !flag.is_alive()))
            })
            .collect();

        for r in readers {
            assert!(r.join().expect("reader thread"));
        }
    }
}

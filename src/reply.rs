//! # Response continuation for public operations.
//!
//! Every public operation receives a [`Responder`] and must answer it exactly
//! once. The type makes that structural:
//!
//! - [`Responder::send`] consumes the responder, so it cannot answer twice;
//! - dropping an unanswered responder answers [`CallError::Disposed`], so a
//!   continuation discarded by teardown still reaches its caller.
//!
//! ## Example
//! ```rust
//! use radiovisor::{CallError, Responder};
//!
//! let (reply, rx) = Responder::<u32>::oneshot();
//! drop(reply);
//! assert_eq!(rx.blocking_recv().unwrap(), Err(CallError::Disposed));
//! ```

use std::fmt;

use tokio::sync::oneshot;

use crate::error::CallError;

/// Result delivered to a caller.
pub type Reply<T> = Result<T, CallError>;

/// One-shot answer channel for a public operation.
#[must_use = "a Responder answers `Disposed` when dropped unanswered"]
pub struct Responder<T> {
    answer: Option<Box<dyn FnOnce(Reply<T>) + Send>>,
}

impl<T: Send + 'static> Responder<T> {
    /// Wraps a callback. It will be invoked exactly once.
    pub fn new(f: impl FnOnce(Reply<T>) + Send + 'static) -> Self {
        Self {
            answer: Some(Box::new(f)),
        }
    }

    /// Creates a responder paired with a receiver for its answer.
    pub fn oneshot() -> (Self, oneshot::Receiver<Reply<T>>) {
        let (tx, rx) = oneshot::channel();
        let responder = Self::new(move |reply| {
            let _ = tx.send(reply);
        });
        (responder, rx)
    }

    /// Answers the caller.
    pub fn send(mut self, reply: Reply<T>) {
        if let Some(answer) = self.answer.take() {
            answer(reply);
        }
    }
}

impl<T> Drop for Responder<T> {
    fn drop(&mut self) {
        if let Some(answer) = self.answer.take() {
            answer(Err(CallError::Disposed));
        }
    }
}

impl<T> fmt::Debug for Responder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Responder")
            .field("answered", &self.answer.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn answers_exactly_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let reply = Responder::new(move |r: Reply<u8>| {
            assert_eq!(r, Ok(7));
            h.fetch_add(1, Ordering::SeqCst);
        });
        reply.send(Ok(7));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_answers_disposed() {
        let (reply, mut rx) = Responder::<()>::oneshot();
        drop(reply);
        assert_eq!(rx.try_recv().expect("answered"), Err(CallError::Disposed));
    }
}

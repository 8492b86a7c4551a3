//! # Single-flight initialization of the external subsystem.
//!
//! [`SingleFlightInitializer`] runs the setup routine **at most once**, no matter
//! how many threads call [`ensure_ready`](SingleFlightInitializer::ensure_ready)
//! concurrently, and fans the result out to every caller.
//!
//! ## State machine
//! ```text
//! NotStarted ──(first ensure_ready)──► InFlight ──(setup Ok)──►  Succeeded
//!                                           └──────(setup Err)─► Failed(reason)
//! ```
//!
//! ## Rules
//! - `ensure_ready` never blocks and never waits on another thread.
//! - While `InFlight`, continuations are queued in registration order.
//! - Once terminal, continuations run synchronously on the caller's thread.
//! - A failed setup is terminal: it is reported to every later caller and never retried.
//! - After teardown (`is_alive() == false`) continuations are dropped, not invoked.
//!   Callers answer their own callers from the drop (see [`Responder`](crate::Responder)).

use std::future::Future;
use std::mem;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tokio::runtime::Handle;

use crate::core::liveness::LivenessFlag;
use crate::error::SetupError;

/// Result fanned out to every waiter.
pub type InitOutcome = Result<(), SetupError>;

/// Callback registered with [`SingleFlightInitializer::ensure_ready`].
pub type Continuation = Box<dyn FnOnce(InitOutcome) + Send>;

/// Failure reason recorded when the setup routine panics.
pub(crate) const SETUP_PANICKED: &str = "setup panicked";

type SetupFn = Box<dyn FnOnce() -> BoxFuture<'static, InitOutcome> + Send>;

/// Observable initialization state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitState {
    NotStarted,
    InFlight,
    Succeeded,
    Failed(SetupError),
}

impl InitState {
    /// True for `Succeeded` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InitState::Succeeded | InitState::Failed(_))
    }
}

struct Inner {
    state: InitState,
    waiters: Vec<Continuation>,
    setup: Option<SetupFn>,
}

/// Runs a setup routine once and shares its outcome.
pub struct SingleFlightInitializer {
    liveness: Arc<LivenessFlag>,
    runtime: Handle,
    inner: Mutex<Inner>,
}

impl SingleFlightInitializer {
    /// Creates an initializer. `setup` is not called here.
    ///
    /// The setup future is spawned on `runtime` by the first `ensure_ready`.
    pub fn new<F, Fut>(liveness: Arc<LivenessFlag>, runtime: Handle, setup: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = InitOutcome> + Send + 'static,
    {
        let setup: SetupFn = Box::new(move || setup().boxed());
        Self {
            liveness,
            runtime,
            inner: Mutex::new(Inner {
                state: InitState::NotStarted,
                waiters: Vec::new(),
                setup: Some(setup),
            }),
        }
    }

    /// Requests initialization and schedules `on_ready` for its outcome.
    ///
    /// - dead: returns without invoking `on_ready`;
    /// - terminal: invokes `on_ready` synchronously;
    /// - in flight: queues `on_ready`;
    /// - not started: queues `on_ready` and launches the setup routine.
    pub fn ensure_ready(self: &Arc<Self>, on_ready: Continuation) {
        if !self.liveness.is_alive() {
            return;
        }

        let mut inner = self.inner.lock();
        // Teardown marks dead before it empties the waiter list under this lock.
        if !self.liveness.is_alive() {
            return;
        }
        match &inner.state {
            InitState::Succeeded => {
                drop(inner);
                on_ready(Ok(()));
            }
            InitState::Failed(err) => {
                let err = err.clone();
                drop(inner);
                on_ready(Err(err));
            }
            InitState::InFlight => inner.waiters.push(on_ready),
            InitState::NotStarted => {
                inner.state = InitState::InFlight;
                inner.waiters.push(on_ready);
                let setup = inner.setup.take();
                drop(inner);
                if let Some(setup) = setup {
                    self.launch(setup);
                }
            }
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> InitState {
        self.inner.lock().state.clone()
    }

    /// Drops every queued continuation without invoking it. Used by teardown.
    ///
    /// Returns the number of discarded continuations.
    pub fn discard_waiters(&self) -> usize {
        let waiters = mem::take(&mut self.inner.lock().waiters);
        let n = waiters.len();
        drop(waiters);
        n
    }

    fn launch(self: &Arc<Self>, setup: SetupFn) {
        let me = Arc::clone(self);
        self.runtime.spawn(async move {
            let outcome = match std::panic::AssertUnwindSafe(async move { setup().await })
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(SetupError::new(SETUP_PANICKED)),
            };
            me.complete(outcome);
        });
    }

    fn complete(&self, outcome: InitOutcome) {
        let waiters = {
            let mut inner = self.inner.lock();
            debug_assert!(
                !inner.state.is_terminal(),
                "initialization reached a terminal state twice"
            );
            if inner.state.is_terminal() {
                tracing::error!(previous = ?inner.state, "initialization completed twice; keeping last result");
            }
            inner.state = match &outcome {
                Ok(()) => InitState::Succeeded,
                Err(err) => InitState::Failed(err.clone()),
            };
            mem::take(&mut inner.waiters)
        };

        if !self.liveness.is_alive() {
            tracing::debug!(waiters = waiters.len(), "initialization finished after teardown; dropping waiters");
            return;
        }
        for waiter in waiters {
            waiter(outcome.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::{mpsc, oneshot};

    fn counting(
        liveness: Arc<LivenessFlag>,
        calls: Arc<AtomicUsize>,
        outcome: InitOutcome,
    ) -> Arc<SingleFlightInitializer> {
        Arc::new(SingleFlightInitializer::new(
            liveness,
            Handle::current(),
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                outcome
            },
        ))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_callers_share_one_setup() {
        let calls = Arc::new(AtomicUsize::new(0));
        let init = counting(Arc::new(LivenessFlag::new()), calls.clone(), Ok(()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let threads: Vec<_> = (0..16)
            .map(|i| {
                let init = Arc::clone(&init);
                let tx = tx.clone();
                std::thread::spawn(move || {
                    init.ensure_ready(Box::new(move |outcome| {
                        let _ = tx.send((i, outcome));
                    }));
                })
            })
            .collect();
        for t in threads {
            t.join().expect("caller thread");
        }
        drop(tx);

        let mut seen = Vec::new();
        while let Some((i, outcome)) = rx.recv().await {
            assert_eq!(outcome, Ok(()));
            seen.push(i);
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..16).collect::<Vec<_>>());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(init.state(), InitState::Succeeded);
    }

    #[tokio::test]
    async fn waiters_run_in_registration_order() {
        let (gate_tx, gate_rx) = oneshot::channel::<()>();
        let init = Arc::new(SingleFlightInitializer::new(
            Arc::new(LivenessFlag::new()),
            Handle::current(),
            move || async move {
                let _ = gate_rx.await;
                Ok(())
            },
        ));
        let order = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();

        for i in 0..5 {
            let order = Arc::clone(&order);
            let done_tx = done_tx.clone();
            init.ensure_ready(Box::new(move |_| {
                order.lock().push(i);
                let _ = done_tx.send(());
            }));
        }
        assert_eq!(init.state(), InitState::InFlight);

        gate_tx.send(()).expect("gate");
        for _ in 0..5 {
            done_rx.recv().await.expect("waiter");
        }
        assert_eq!(*order.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn failure_is_terminal_and_answered_synchronously() {
        let calls = Arc::new(AtomicUsize::new(0));
        let init = counting(
            Arc::new(LivenessFlag::new()),
            calls.clone(),
            Err(SetupError::new("no_adapter")),
        );
        let (tx, rx) = oneshot::channel();
        init.ensure_ready(Box::new(move |outcome| {
            let _ = tx.send(outcome);
        }));
        assert_eq!(rx.await.expect("first"), Err(SetupError::new("no_adapter")));

        for _ in 0..3 {
            let hits = Arc::new(AtomicUsize::new(0));
            let h = Arc::clone(&hits);
            init.ensure_ready(Box::new(move |outcome| {
                assert_eq!(outcome, Err(SetupError::new("no_adapter")));
                h.fetch_add(1, Ordering::SeqCst);
            }));
            assert_eq!(hits.load(Ordering::SeqCst), 1, "fast path is synchronous");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dead_initializer_never_starts_setup() {
        let calls = Arc::new(AtomicUsize::new(0));
        let liveness = Arc::new(LivenessFlag::new());
        let init = counting(liveness.clone(), calls.clone(), Ok(()));
        liveness.mark_dead();

        let invoked = Arc::new(AtomicUsize::new(0));
        let i = Arc::clone(&invoked);
        init.ensure_ready(Box::new(move |_| {
            i.fetch_add(1, Ordering::SeqCst);
        }));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(invoked.load(Ordering::SeqCst), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(init.state(), InitState::NotStarted);
    }

    #[tokio::test]
    async fn completion_after_teardown_drops_waiters() {
        let (gate_tx, gate_rx) = oneshot::channel::<()>();
        let liveness = Arc::new(LivenessFlag::new());
        let init = Arc::new(SingleFlightInitializer::new(
            liveness.clone(),
            Handle::current(),
            move || async move {
                let _ = gate_rx.await;
                Ok(())
            },
        ));
        let (tx, rx) = oneshot::channel::<InitOutcome>();
        init.ensure_ready(Box::new(move |outcome| {
            let _ = tx.send(outcome);
        }));

        liveness.mark_dead();
        gate_tx.send(()).expect("gate");

        assert!(rx.await.is_err(), "waiter must be dropped, not invoked");
        assert_eq!(init.state(), InitState::Succeeded);
    }

    #[tokio::test]
    async fn panicking_setup_is_recorded_as_failure() {
        let init = Arc::new(SingleFlightInitializer::new(
            Arc::new(LivenessFlag::new()),
            Handle::current(),
            || async {
                if true {
                    panic!("driver exploded");
                }
                Ok(())
            },
        ));
        let (tx, rx) = oneshot::channel();
        init.ensure_ready(Box::new(move |outcome| {
            let _ = tx.send(outcome);
        }));
        assert_eq!(rx.await.expect("outcome"), Err(SetupError::new("setup panicked")));
    }

    #[tokio::test]
    async fn caller_racing_teardown_neither_queues_nor_starts_setup() {
        let calls = Arc::new(AtomicUsize::new(0));
        let liveness = Arc::new(LivenessFlag::new());
        let init = counting(liveness.clone(), calls.clone(), Ok(()));
        let (tx, rx) = oneshot::channel::<InitOutcome>();

        // The caller passes the liveness check, then blocks on the lock.
        let mut guard = init.inner.lock();
        let caller = {
            let init = Arc::clone(&init);
            std::thread::spawn(move || {
                init.ensure_ready(Box::new(move |outcome| {
                    let _ = tx.send(outcome);
                }));
            })
        };
        std::thread::sleep(Duration::from_millis(50));

        liveness.mark_dead();
        assert!(mem::take(&mut guard.waiters).is_empty());
        drop(guard);
        caller.join().expect("caller thread");

        assert!(rx.await.is_err(), "continuation must be dropped");
        assert!(init.inner.lock().waiters.is_empty());
        assert_eq!(init.state(), InitState::NotStarted);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn discard_waiters_drops_queued_continuations() {
        let (_gate_tx, gate_rx) = oneshot::channel::<()>();
        let init = Arc::new(SingleFlightInitializer::new(
            Arc::new(LivenessFlag::new()),
            Handle::current(),
            move || async move {
                let _ = gate_rx.await;
                Ok(())
            },
        ));
        let (tx, rx) = oneshot::channel::<InitOutcome>();
        init.ensure_ready(Box::new(move |outcome| {
            let _ = tx.send(outcome);
        }));

        assert_eq!(init.discard_waiters(), 1);
        assert!(rx.await.is_err());
    }
}

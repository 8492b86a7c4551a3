//! # Completion dispatcher: marshals work onto the home context.
//!
//! The home context is a single tokio task that owns the home state `S` and
//! runs posted jobs one at a time, in submission order. Nothing outside that
//! task ever holds a reference to `S`.
//!
//! ## Architecture
//! ```text
//! caller / subsystem thread                       home task (spawned lazily)
//!   post_to_home(job) ──[is_alive?]──► mpsc ──► [is_alive?] ──► job(&mut S)
//!   post_teardown(job) ───────────────► mpsc ──►               teardown(&mut S) ──► exit
//! ```
//!
//! ## Rules
//! - Liveness is checked **twice**: when posting and immediately before running.
//!   A job posted before teardown but reached after it is dropped unexecuted.
//! - The home task is spawned on the first post, never at construction.
//! - The teardown job runs regardless of liveness and is always the last job.
//!   If the home task never started it runs inline, on an empty state.
//! - A panicking job is caught and logged; the home context keeps running.

use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

use crate::core::liveness::LivenessFlag;

/// Work executed on the home context.
pub type HomeJob<S> = Box<dyn FnOnce(&mut S) + Send>;

enum Message<S> {
    Run(HomeJob<S>),
    Teardown(HomeJob<S>),
}

enum Slot<S> {
    /// No job has been posted yet; no task exists.
    Idle,
    Running(mpsc::UnboundedSender<Message<S>>),
    Closed,
}

/// Serializes jobs onto a single home task.
pub struct CompletionDispatcher<S> {
    liveness: Arc<LivenessFlag>,
    runtime: Handle,
    slot: Mutex<Slot<S>>,
    closed: CancellationToken,
}

impl<S> CompletionDispatcher<S>
where
    S: Default + Send + 'static,
{
    pub fn new(liveness: Arc<LivenessFlag>, runtime: Handle) -> Self {
        Self {
            liveness,
            runtime,
            slot: Mutex::new(Slot::Idle),
            closed: CancellationToken::new(),
        }
    }

    /// Queues `action` for the home context.
    ///
    /// Returns `false` if the job was dropped (teardown started or home closed).
    pub fn post_to_home(&self, action: HomeJob<S>) -> bool {
        if !self.liveness.is_alive() {
            return false;
        }

        let mut slot = self.slot.lock();
        if let Slot::Idle = *slot {
            *slot = Slot::Running(self.start());
        }
        match &*slot {
            Slot::Running(tx) => tx.send(Message::Run(action)).is_ok(),
            Slot::Idle | Slot::Closed => false,
        }
    }

    /// Queues the final job and closes the home context behind it.
    ///
    /// If the home context was never started, `action` runs inline against an
    /// empty state before `closed()` resolves. Returns `false` only when the
    /// home context was already closed and `action` was dropped.
    pub fn post_teardown(&self, action: HomeJob<S>) -> bool {
        let previous = mem::replace(&mut *self.slot.lock(), Slot::Closed);
        match previous {
            Slot::Running(tx) => match tx.send(Message::Teardown(action)) {
                Ok(()) => true,
                Err(mpsc::error::SendError(Message::Teardown(action))) => {
                    run_guarded(action, &mut S::default());
                    self.closed.cancel();
                    true
                }
                Err(_) => {
                    self.closed.cancel();
                    false
                }
            },
            Slot::Idle => {
                run_guarded(action, &mut S::default());
                self.closed.cancel();
                true
            }
            Slot::Closed => false,
        }
    }

    /// True once the home context has been started.
    pub fn is_started(&self) -> bool {
        !matches!(*self.slot.lock(), Slot::Idle)
    }

    /// Resolves once the home context has exited (or was closed before starting).
    pub fn closed(&self) -> WaitForCancellationFutureOwned {
        self.closed.clone().cancelled_owned()
    }

    fn start(&self) -> mpsc::UnboundedSender<Message<S>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let liveness = Arc::clone(&self.liveness);
        let closed = self.closed.clone();
        self.runtime.spawn(run_home::<S>(rx, liveness, closed));
        tx
    }
}

async fn run_home<S: Default>(
    mut rx: mpsc::UnboundedReceiver<Message<S>>,
    liveness: Arc<LivenessFlag>,
    closed: CancellationToken,
) {
    let mut state = S::default();
    while let Some(msg) = rx.recv().await {
        match msg {
            Message::Run(job) => {
                if !liveness.is_alive() {
                    continue;
                }
                run_guarded(job, &mut state);
            }
            Message::Teardown(job) => {
                run_guarded(job, &mut state);
                break;
            }
        }
    }
    drop(rx);
    drop(state);
    closed.cancel();
}

fn run_guarded<S>(job: HomeJob<S>, state: &mut S) {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| job(state)));
    if result.is_err() {
        tracing::error!("home job panicked; continuing");
    }
}

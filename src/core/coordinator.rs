//! # Coordinator: the plugin-facing lifecycle component.
//!
//! [`Coordinator`] owns the liveness flag, the single-flight initializer and the
//! completion dispatcher, and exposes the public operations a host calls on
//! behalf of its end callers.
//!
//! ## Lifecycle
//! ```text
//! Created ──(first public op)──► Initializing ──(setup terminal)──► Ready
//!    │                                │                               │
//!    └──────────────── dispose() ─────┴───────────────────────────────┴──► Disposed
//! ```
//!
//! ## Public operation pattern
//! ```text
//! get_status(reply)
//!   ├─ !is_alive()              → reply(Disposed)           (synchronous)
//!   └─ ensure_ready(cont)
//!        cont(outcome):
//!          ├─ !is_alive()       → reply(Disposed)
//!          ├─ Err(setup)        → reply(InitializationFailed)
//!          └─ Ok                → post_to_home(job)
//!                                   job(&home): reply(Ok(home.status()))
//! ```
//! Whatever drops `reply` on the way (a discarded waiter, a job skipped after
//! teardown) answers `Disposed`, so a direct caller is never left hanging.
//!
//! ## Teardown
//! ```text
//! dispose()
//!   ├─► mark_dead()                     (first, happens-before everything below)
//!   ├─► discard queued init waiters     (their replies answer Disposed)
//!   └─► post_teardown(home):
//!         revoke tokens ─► stop watcher ─► release radio ─► clear peers/connections
//!         (each step best-effort; failures logged + TeardownStepFailed)
//! ```

use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};

use futures::FutureExt;
use tokio::sync::broadcast;

use crate::core::builder::CoordinatorBuilder;
use crate::core::config::Config;
use crate::core::dispatcher::CompletionDispatcher;
use crate::core::home::{ExternalHandle, HomeState};
use crate::core::initializer::{InitOutcome, InitState, SETUP_PANICKED, SingleFlightInitializer};
use crate::core::liveness::LivenessFlag;
use crate::error::{CallError, SetupError};
use crate::events::{Bus, Event, EventKind};
use crate::radio::{EventSink, Peer, PeerId, RadioEvent, RadioStatus, StreamKind, Subsystem};
use crate::reply::{Reply, Responder};
use crate::subscribers::SubscriberSet;

type Dispatcher<S> = CompletionDispatcher<HomeState<<S as Subsystem>::Radio>>;

/// Coarse lifecycle position of a [`Coordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Constructed; the subsystem has not been touched.
    Created,
    /// The setup routine is running.
    Initializing,
    /// The setup routine reached a terminal state (success or failure).
    Ready,
    /// `dispose()` has run. Irreversible.
    Disposed,
}

/// Lifecycle-safe front for an asynchronous radio subsystem.
pub struct Coordinator<S: Subsystem> {
    cfg: Config,
    liveness: Arc<LivenessFlag>,
    initializer: Arc<SingleFlightInitializer>,
    dispatcher: Arc<Dispatcher<S>>,
    bus: Bus,
    _subs: Option<Arc<SubscriberSet>>,
}

impl<S: Subsystem> Coordinator<S> {
    /// Returns a builder for a coordinator over `subsystem`.
    pub fn builder(subsystem: S, cfg: Config) -> CoordinatorBuilder<S> {
        CoordinatorBuilder::new(subsystem, cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        subsystem: S,
        runtime: tokio::runtime::Handle,
        bus: Bus,
        subs: Option<Arc<SubscriberSet>>,
    ) -> Self {
        let liveness = Arc::new(LivenessFlag::new());
        let dispatcher = Arc::new(CompletionDispatcher::new(
            Arc::clone(&liveness),
            runtime.clone(),
        ));
        let setup = SetupRoutine {
            subsystem,
            component: Arc::clone(&cfg.name),
            streams: cfg.unique_streams(),
            watch: cfg.watch_on_ready,
            liveness: Arc::clone(&liveness),
            dispatcher: Arc::downgrade(&dispatcher),
            bus: bus.clone(),
        };
        let initializer = Arc::new(SingleFlightInitializer::new(
            Arc::clone(&liveness),
            runtime,
            move || setup.run(),
        ));

        Self {
            cfg,
            liveness,
            initializer,
            dispatcher,
            bus,
            _subs: subs,
        }
    }

    /// Answers the current radio status.
    pub fn get_status(&self, reply: Responder<RadioStatus>) {
        self.call(reply, |home| home.status());
    }

    /// Answers a snapshot of the discovered peers.
    pub fn get_peers(&self, reply: Responder<Vec<Peer>>) {
        self.call(reply, |home| home.peers());
    }

    /// Answers a snapshot of the live connection records.
    pub fn get_connections(&self, reply: Responder<Vec<PeerId>>) {
        self.call(reply, |home| home.connections());
    }

    /// Async form of [`get_status`](Self::get_status).
    pub async fn status(&self) -> Reply<RadioStatus> {
        let (reply, rx) = Responder::oneshot();
        self.get_status(reply);
        rx.await.unwrap_or(Err(CallError::Disposed))
    }

    /// Async form of [`get_peers`](Self::get_peers).
    pub async fn peers(&self) -> Reply<Vec<Peer>> {
        let (reply, rx) = Responder::oneshot();
        self.get_peers(reply);
        rx.await.unwrap_or(Err(CallError::Disposed))
    }

    /// Async form of [`get_connections`](Self::get_connections).
    pub async fn connections(&self) -> Reply<Vec<PeerId>> {
        let (reply, rx) = Responder::oneshot();
        self.get_connections(reply);
        rx.await.unwrap_or(Err(CallError::Disposed))
    }

    /// Starts teardown. Idempotent; returns `true` only for the first call.
    ///
    /// Never blocks: revocation and release run on the home context. Await
    /// [`closed`](Self::closed) to observe their completion.
    pub fn dispose(&self) -> bool {
        if !self.liveness.mark_dead() {
            return false;
        }
        let component = Arc::clone(&self.cfg.name);
        self.bus.publish(Event::new(EventKind::DisposeRequested).with_component(Arc::clone(&component)));

        let discarded = self.initializer.discard_waiters();
        tracing::debug!(component = %component, discarded, "dispose: liveness revoked");

        let bus = self.bus.clone();
        let teardown_component = Arc::clone(&component);
        let posted = self.dispatcher.post_teardown(Box::new(move |home: &mut HomeState<S::Radio>| {
            for failure in home.teardown() {
                tracing::warn!(
                    component = %teardown_component,
                    step = failure.step,
                    error = %failure.error,
                    "teardown step failed; continuing"
                );
                bus.publish(
                    Event::new(EventKind::TeardownStepFailed)
                        .with_component(Arc::clone(&teardown_component))
                        .with_step(failure.step)
                        .with_reason(failure.error.as_message()),
                );
            }
            bus.publish(Event::new(EventKind::Disposed).with_component(teardown_component));
        }));

        if !posted {
            tracing::warn!(component = %component, "dispose: home context already closed");
        }
        true
    }

    /// `false` once [`dispose`](Self::dispose) has started.
    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        if !self.liveness.is_alive() {
            return LifecycleState::Disposed;
        }
        match self.initializer.state() {
            InitState::NotStarted => LifecycleState::Created,
            InitState::InFlight => LifecycleState::Initializing,
            InitState::Succeeded | InitState::Failed(_) => LifecycleState::Ready,
        }
    }

    /// Initialization state of the subsystem.
    pub fn init_state(&self) -> InitState {
        self.initializer.state()
    }

    /// Receiver for lifecycle events published after this call.
    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Resolves once teardown has finished on the home context.
    pub fn closed(&self) -> impl Future<Output = ()> + Send + 'static {
        self.dispatcher.closed()
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    fn call<T, F>(&self, reply: Responder<T>, op: F)
    where
        T: Send + 'static,
        F: FnOnce(&HomeState<S::Radio>) -> T + Send + 'static,
    {
        if !self.liveness.is_alive() {
            reply.send(Err(CallError::Disposed));
            return;
        }

        let liveness = Arc::clone(&self.liveness);
        let dispatcher = Arc::clone(&self.dispatcher);
        self.initializer.ensure_ready(Box::new(move |outcome: InitOutcome| {
            if !liveness.is_alive() {
                reply.send(Err(CallError::Disposed));
                return;
            }
            match outcome {
                Err(err) => reply.send(Err(err.into())),
                Ok(()) => {
                    dispatcher.post_to_home(Box::new(move |home: &mut HomeState<S::Radio>| {
                        reply.send(Ok(op(home)))
                    }));
                }
            }
        }));
    }
}

impl<S: Subsystem> Drop for Coordinator<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<S: Subsystem> fmt::Debug for Coordinator<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coordinator")
            .field("name", &self.cfg.name)
            .field("state", &self.lifecycle_state())
            .finish_non_exhaustive()
    }
}

/// The setup routine handed to the initializer: starts the subsystem and
/// installs the resulting radio on the home context.
struct SetupRoutine<S: Subsystem> {
    subsystem: S,
    component: Arc<str>,
    streams: Vec<StreamKind>,
    watch: bool,
    liveness: Arc<LivenessFlag>,
    dispatcher: Weak<Dispatcher<S>>,
    bus: Bus,
}

impl<S: Subsystem> SetupRoutine<S> {
    async fn run(self) -> InitOutcome {
        let component = Arc::clone(&self.component);
        tracing::debug!(component = %component, subsystem = self.subsystem.name(), "starting subsystem");
        self.bus
            .publish(Event::new(EventKind::InitStarted).with_component(Arc::clone(&component)));

        let started = AssertUnwindSafe(self.subsystem.start())
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(SetupError::new(SETUP_PANICKED)));
        let radio = match started {
            Ok(radio) => radio,
            Err(err) => {
                let kind = if self.liveness.is_alive() {
                    EventKind::InitFailed
                } else {
                    EventKind::InitDiscarded
                };
                tracing::debug!(component = %component, reason = %err.reason, "subsystem setup failed");
                self.bus.publish(
                    Event::new(kind)
                        .with_component(component)
                        .with_reason(Arc::clone(&err.reason)),
                );
                return Err(err);
            }
        };

        let handle = ExternalHandle::new(radio);
        let dispatcher = match self.dispatcher.upgrade() {
            Some(d) if self.liveness.is_alive() => d,
            _ => {
                tracing::debug!(component = %component, "subsystem started after dispose; releasing");
                drop(handle);
                self.bus.publish(
                    Event::new(EventKind::InitDiscarded)
                        .with_component(component)
                        .with_reason("succeeded"),
                );
                return Ok(());
            }
        };

        let sinks = SinkFactory {
            component: Arc::clone(&component),
            liveness: Arc::clone(&self.liveness),
            dispatcher: Arc::downgrade(&dispatcher),
            bus: self.bus.clone(),
        };
        let streams = self.streams;
        let watch = self.watch;
        dispatcher.post_to_home(Box::new(move |home: &mut HomeState<S::Radio>| {
            home.install(handle, &streams, |stream| sinks.sink(stream), watch);
        }));

        self.bus
            .publish(Event::new(EventKind::InitSucceeded).with_component(component));
        Ok(())
    }
}

/// Builds the sinks handed to `Radio::subscribe`.
struct SinkFactory<R: crate::radio::Radio> {
    component: Arc<str>,
    liveness: Arc<LivenessFlag>,
    dispatcher: Weak<CompletionDispatcher<HomeState<R>>>,
    bus: Bus,
}

impl<R: crate::radio::Radio> SinkFactory<R> {
    /// Sink that ignores events once dead and otherwise forwards them to the
    /// home context, which applies them and publishes the result.
    fn sink(&self, stream: StreamKind) -> EventSink {
        let component = Arc::clone(&self.component);
        let liveness = Arc::clone(&self.liveness);
        let dispatcher = Weak::clone(&self.dispatcher);
        let bus = self.bus.clone();

        EventSink::new(stream, move |stream, event: RadioEvent| {
            if !liveness.is_alive() {
                return;
            }
            let Some(dispatcher) = dispatcher.upgrade() else {
                return;
            };
            let bus = bus.clone();
            let component = Arc::clone(&component);
            dispatcher.post_to_home(Box::new(move |home: &mut HomeState<R>| {
                if home.apply(&event) {
                    bus.publish(Event::radio(stream, &event).with_component(component));
                }
            }));
        })
    }
}

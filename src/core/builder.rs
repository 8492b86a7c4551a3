use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use super::{config::Config, coordinator::Coordinator};
use crate::{
    error::RuntimeError,
    events::Bus,
    radio::Subsystem,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for constructing a [`Coordinator`].
///
/// Building never touches the subsystem: the setup routine is deferred until
/// the first public operation.
pub struct CoordinatorBuilder<S: Subsystem> {
    subsystem: S,
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    runtime: Option<Handle>,
}

impl<S: Subsystem> CoordinatorBuilder<S> {
    /// Creates a new builder for `subsystem` with the given configuration.
    pub fn new(subsystem: S, cfg: Config) -> Self {
        Self {
            subsystem,
            cfg,
            subscribers: Vec::new(),
            runtime: None,
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Hosts the setup routine and the home context on `runtime`.
    ///
    /// Without it, `build()` uses the runtime of the calling thread.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Builds the coordinator in the `Created` state.
    pub fn build(self) -> Result<Arc<Coordinator<S>>, RuntimeError> {
        let runtime = match self.runtime {
            Some(h) => h,
            None => Handle::try_current().map_err(|_| RuntimeError::NoRuntime)?,
        };
        let bus = Bus::new(self.cfg.bus_capacity_clamped());

        let subs = if self.subscribers.is_empty() {
            None
        } else {
            Some(Arc::new(SubscriberSet::new(
                self.subscribers,
                bus.clone(),
                &runtime,
            )))
        };

        let coordinator = Arc::new(Coordinator::new_internal(
            self.cfg,
            self.subsystem,
            runtime.clone(),
            bus.clone(),
            subs.clone(),
        ));
        if let Some(set) = subs {
            subscriber_listener(&bus, set, coordinator.closed(), &runtime);
        }
        Ok(coordinator)
    }
}

/// Forwards bus events to the subscriber set until the home context closes.
///
/// Events already queued when `closed` resolves (e.g. `Disposed`) are still
/// delivered. Dropping the listener's set handle lets the workers drain and exit
/// once the coordinator is gone.
fn subscriber_listener(
    bus: &Bus,
    set: Arc<SubscriberSet>,
    closed: impl Future<Output = ()> + Send + 'static,
    runtime: &Handle,
) {
    let mut rx = bus.subscribe();
    runtime.spawn(async move {
        tokio::pin!(closed);
        loop {
            tokio::select! {
                biased;
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "subscriber listener lagged");
                    }
                    Err(RecvError::Closed) => return,
                },
                _ = &mut closed => break,
            }
        }
        loop {
            match rx.try_recv() {
                Ok(ev) => set.emit(&ev),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        tracing::debug!(subscribers = set.len(), "subscriber listener stopped");
    });
}

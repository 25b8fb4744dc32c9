use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crossbeam::channel::{unbounded, Receiver};
use log::{debug, warn};

use crate::types::StampDetected;

/// Returns `false` once the subscriber is gone for good.
type Handler = Arc<dyn Fn(&StampDetected) -> bool + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler)>,
}

/// Fan-out point for stamp events
///
/// Every registered handler receives every emitted event exactly once, in
/// registration order. Cloning yields another handle to the same bus.
/// Handlers run without the bus lock held, so they may subscribe or
/// unsubscribe from inside a delivery.
#[derive(Clone, Default)]
pub struct GestureBus {
    subscribers: Arc<RwLock<Subscribers>>,
}

impl GestureBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Subscribers> {
        match self.subscribers.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Subscribers> {
        match self.subscribers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn register(&self, handler: Handler) -> SubscriptionId {
        let mut subs = self.write();
        let id = SubscriptionId(subs.next_id);
        subs.next_id += 1;
        subs.handlers.push((id, handler));
        id
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&StampDetected) + Send + Sync + 'static,
    {
        self.register(Arc::new(move |event: &StampDetected| {
            handler(event);
            true
        }))
    }

    /// Returns `false` if the id was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.write();
        let before = subs.handlers.len();
        subs.handlers.retain(|(handler_id, _)| *handler_id != id);
        subs.handlers.len() != before
    }

    /// Subscribe through a channel. The subscription is removed on the first
    /// emit after the receiver is dropped.
    pub fn subscribe_channel(&self) -> Receiver<StampDetected> {
        let (tx, rx) = unbounded();
        self.register(Arc::new(move |event: &StampDetected| tx.send(*event).is_ok()));
        rx
    }

    /// Deliver to a copy of the handler list. A panicking handler is logged
    /// and skipped; the remaining handlers still run.
    pub fn emit(&self, event: &StampDetected) {
        let handlers: Vec<(SubscriptionId, Handler)> = self.read().handlers.clone();

        let mut closed = Vec::new();
        for (id, handler) in &handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(true) => {}
                Ok(false) => closed.push(*id),
                Err(_) => warn!("Stamp handler {:?} panicked on t={}", id, event.timestamp),
            }
        }

        if !closed.is_empty() {
            debug!("Dropping {} closed stamp subscriber(s)", closed.len());
            self.write().handlers.retain(|(id, _)| !closed.contains(id));
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.read().handlers.len()
    }
}

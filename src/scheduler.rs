use crate::{
    clock::{Clock, TimeT},
    entry::{Entry, Handle},
    error::SchedulerError,
    store::Store,
    wheel::WheelConfig,
};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Runs a callback once after a delay.
///
/// Cancelling a handle before its callback fires guarantees the callback
/// never runs.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: TimeT, callback: Callback) -> Result<Handle, SchedulerError>;

    /// Returns false if the handle is unknown or its callback already ran.
    fn cancel(&self, handle: &Handle) -> bool;

    /// Whether the handle's callback is still waiting to run.
    fn is_scheduled(&self, handle: &Handle) -> bool;
}

struct Inner {
    store: Store,
    callbacks: HashMap<Handle, Callback>,
}

/// A [`Scheduler`] backed by a hierarchical timer wheel.
///
/// Nothing fires on its own: callbacks run from [`WheelScheduler::tick`],
/// either called directly or from a [`crate::Driver`] thread.
pub struct WheelScheduler {
    clock: Arc<dyn Clock>,
    resolution: TimeT,
    inner: Mutex<Inner>,
}

impl WheelScheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::build(clock, WheelConfig::default())
    }

    pub fn with_config(clock: Arc<dyn Clock>, config: WheelConfig) -> Result<Self, SchedulerError> {
        config.validate()?;
        Ok(Self::build(clock, config))
    }

    fn build(clock: Arc<dyn Clock>, config: WheelConfig) -> Self {
        let store = Store::new(clock.clone(), &config);
        Self {
            clock,
            resolution: config.resolution_ms,
            inner: Mutex::new(Inner {
                store,
                callbacks: HashMap::new(),
            }),
        }
    }

    /// How late a callback may run, in ms.
    pub fn resolution(&self) -> TimeT {
        self.resolution
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().store.len()
    }

    /// Runs every callback that is due, earliest first, and returns how many
    /// ran. Callbacks run without the lock held and may schedule or cancel.
    pub fn tick(&self) -> usize {
        let due: Vec<Callback> = {
            let mut guard = self.inner.lock();
            let inner = &mut *guard;

            let mut entries: Vec<Entry> = inner.store.pop().into_iter().collect();
            entries.sort_by_key(Entry::pop_time);
            entries
                .iter()
                .filter_map(|entry| inner.callbacks.remove(&entry.handle))
                .collect()
        };

        let count = due.len();
        if count > 0 {
            debug!(count, "firing due callbacks");
        }
        due.into_iter().for_each(|callback| callback());
        count
    }
}

impl Scheduler for WheelScheduler {
    fn schedule(&self, delay: TimeT, callback: Callback) -> Result<Handle, SchedulerError> {
        let handle = Handle::new();
        let entry = Entry::new(handle.clone(), self.clock.now(), delay);

        let mut inner = self.inner.lock();
        inner.store.insert(entry)?;
        inner.callbacks.insert(handle.clone(), callback);

        debug!(%handle, delay, "callback scheduled");
        Ok(handle)
    }

    fn cancel(&self, handle: &Handle) -> bool {
        let mut inner = self.inner.lock();
        inner.store.remove(handle);
        let cancelled = inner.callbacks.remove(handle).is_some();
        if cancelled {
            debug!(%handle, "callback cancelled");
        }
        cancelled
    }

    fn is_scheduled(&self, handle: &Handle) -> bool {
        self.inner.lock().callbacks.contains_key(handle)
    }
}

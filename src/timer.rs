use crate::{
    clock::{Clock, TimeT},
    entry::Handle,
    hook::Hook,
    scheduler::Scheduler,
    stopwatch::Stopwatch,
};
use parking_lot::Mutex;
use std::{fmt, sync::Arc};
use tracing::{debug, warn};

/// A countdown of a fixed delay that calls `on_finish` when it runs out.
///
/// Elapsed time is tracked by an owned [`Stopwatch`]. Every start reschedules
/// the finish callback for the time remaining, and every stop cancels it, so
/// at most one callback is pending at any time.
///
/// The finish callback is scheduled at construction for the full delay even
/// when `auto_start` is false, and `reset` reschedules it even while stopped.
pub struct Timer {
    delay: TimeT,
    stopwatch: Stopwatch,
    scheduler: Arc<dyn Scheduler>,
    pending: Option<Handle>,
    on_finish: Arc<Mutex<Arc<Hook>>>,
}

impl Timer {
    pub fn new(
        delay: TimeT,
        auto_start: bool,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let mut timer = Self {
            delay,
            stopwatch: Stopwatch::new(clock, auto_start),
            scheduler,
            pending: None,
            on_finish: Arc::new(Mutex::new(Arc::new(Hook::noop()))),
        };
        timer.reschedule(delay);
        timer
    }

    pub fn with_callback<F>(
        delay: TimeT,
        auto_start: bool,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn Scheduler>,
        callback: F,
    ) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut timer = Self::new(delay, auto_start, clock, scheduler);
        timer.set_on_finish(callback);
        timer
    }

    /// Returns false if the timer was already running.
    pub fn start(&mut self) -> bool {
        if !self.stopwatch.start() {
            return false;
        }
        self.on_stopwatch_start();
        true
    }

    /// Returns false if the timer was not running.
    ///
    /// Stopping cancels the pending finish callback, but a callback that a
    /// [`Driver`](crate::Driver) thread has already taken off the scheduler
    /// still runs, so `on_finish` may be called after `stop` returns once the
    /// deadline has passed.
    pub fn stop(&mut self) -> bool {
        if !self.stopwatch.stop() {
            return false;
        }
        self.on_stopwatch_stop();
        true
    }

    /// Returns the active state after toggling.
    pub fn toggle(&mut self) -> bool {
        if self.stopwatch.is_active() {
            self.stop();
            false
        } else {
            self.start();
            true
        }
    }

    /// Restores the full delay and keeps the running state. Returns whether
    /// the timer is running, or false if it never started.
    pub fn reset(&mut self) -> bool {
        self.on_stopwatch_stop();
        let active = self.stopwatch.reset_with(false);
        self.on_stopwatch_start();
        active
    }

    pub fn since_start(&self) -> Option<TimeT> {
        self.stopwatch.since_start()
    }

    pub fn is_active(&self) -> bool {
        self.stopwatch.is_active()
    }

    /// Negative once the countdown has overrun.
    pub fn time_remaining(&self) -> TimeT {
        self.value()
    }

    /// Alias of [`Timer::time_remaining`].
    pub fn value(&self) -> TimeT {
        self.delay - self.stopwatch.time_with(false)
    }

    pub fn delay(&self) -> TimeT {
        self.delay
    }

    /// Whether a finish callback is scheduled and has not run yet.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| self.scheduler.is_scheduled(handle))
    }

    /// Replaces the finish handler. Takes effect for the pending callback too.
    pub fn set_on_finish<F>(&mut self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.on_finish.lock() = Arc::new(Hook::new(callback));
    }

    pub fn clear_on_finish(&mut self) {
        *self.on_finish.lock() = Arc::new(Hook::noop());
    }

    fn on_stopwatch_start(&mut self) {
        let remaining = self.delay - self.stopwatch.time();
        self.reschedule(remaining);
    }

    fn on_stopwatch_stop(&mut self) {
        self.cancel_pending();
    }

    fn reschedule(&mut self, delay: TimeT) {
        self.cancel_pending();

        let slot = self.on_finish.clone();
        let callback = Box::new(move || {
            // Release the slot before calling so the handler may replace it.
            let hook = slot.lock().clone();
            hook.call();
        });

        match self.scheduler.schedule(delay, callback) {
            Ok(handle) => {
                debug!(%handle, delay, "finish scheduled");
                self.pending = Some(handle);
            }
            Err(err) => warn!("failed to schedule timer finish: {err}"),
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            if !self.scheduler.cancel(&handle) {
                debug!(%handle, "finish already fired or running");
            }
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

impl From<&Timer> for TimeT {
    fn from(timer: &Timer) -> Self {
        timer.value()
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}ms", self.time_remaining(), self.delay)
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timer")
            .field("delay", &self.delay)
            .field("stopwatch", &self.stopwatch)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

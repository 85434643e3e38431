use crate::{
    clock::{Clock, SystemClock, TimeT},
    hook::Hook,
};
use std::{fmt, sync::Arc};
use tracing::trace;

/// Accumulates the time spent active across start/stop cycles.
///
/// Invalid transitions (starting twice, stopping a stopwatch that never
/// started, ...) are rejected by returning `false` and leave the state as is.
pub struct Stopwatch {
    clock: Arc<dyn Clock>,
    accumulated: TimeT,
    started_at: Option<TimeT>,
    last_stop: Option<TimeT>,
    active: bool,

    pub on_start: Hook,
    pub on_stop: Hook,
    pub on_reset: Hook,
    pub on_time: Hook,
}

impl Stopwatch {
    pub fn new(clock: Arc<dyn Clock>, auto_start: bool) -> Self {
        let mut stopwatch = Self {
            clock,
            accumulated: 0,
            started_at: None,
            last_stop: None,
            active: false,
            on_start: Hook::noop(),
            on_stop: Hook::noop(),
            on_reset: Hook::noop(),
            on_time: Hook::noop(),
        };
        if auto_start {
            stopwatch.start();
        }
        stopwatch
    }

    pub fn start(&mut self) -> bool {
        self.start_with(true)
    }

    /// Starts the stopwatch, firing `on_start` only when `emit` is set.
    /// Returns false if it was already running.
    pub fn start_with(&mut self, emit: bool) -> bool {
        if self.active {
            return false;
        }
        let now = self.clock.now();
        self.started_at = Some(now);
        self.active = true;
        trace!(at = now, "stopwatch started");
        if emit {
            self.on_start.call();
        }
        true
    }

    pub fn stop(&mut self) -> bool {
        self.stop_with(true)
    }

    /// Stops the stopwatch and adds the finished interval to the total.
    /// Returns false if it was not running.
    pub fn stop_with(&mut self, emit: bool) -> bool {
        let Some(started_at) = self.started_at.filter(|_| self.active) else {
            return false;
        };
        let interval = self.clock.now() - started_at;
        self.last_stop = Some(interval);
        self.accumulated += interval;
        self.active = false;
        trace!(interval, total = self.accumulated, "stopwatch stopped");
        if emit {
            self.on_stop.call();
        }
        true
    }

    pub fn toggle(&mut self) -> bool {
        self.toggle_with(true)
    }

    /// Returns the active state after toggling.
    pub fn toggle_with(&mut self, emit: bool) -> bool {
        if self.active {
            self.stop_with(emit);
            false
        } else {
            self.start_with(emit);
            true
        }
    }

    pub fn reset(&mut self) -> bool {
        self.reset_with(true)
    }

    /// Clears the total but keeps the running state: a running stopwatch
    /// carries on from now. Returns false if the stopwatch never started,
    /// otherwise whether it is active.
    pub fn reset_with(&mut self, emit: bool) -> bool {
        if self.started_at.is_none() {
            return false;
        }
        if emit {
            self.on_reset.call();
        }
        self.started_at = Some(self.clock.now());
        self.accumulated = 0;
        self.active
    }

    /// Stops without counting the current interval.
    pub fn cancel_start(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        true
    }

    /// Undoes the last stop: the stopped interval is taken off the total and
    /// the stopwatch runs again from its previous start, so the time spent
    /// stopped counts as active.
    ///
    /// Returns false while running, and also when the stopwatch never
    /// started: there is no start to resume from, and `is_active` must never
    /// report true without one.
    pub fn cancel_stop(&mut self) -> bool {
        if self.active || self.started_at.is_none() {
            return false;
        }
        self.active = true;
        self.accumulated -= self.last_stop.unwrap_or(0);
        true
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn time(&self) -> TimeT {
        self.time_with(true)
    }

    /// Total active time, firing `on_time` when `emit` is set.
    pub fn time_with(&self, emit: bool) -> TimeT {
        if emit {
            self.on_time.call();
        }
        self.accumulated + self.since_start().unwrap_or(0)
    }

    /// Alias of [`Stopwatch::time`].
    pub fn value(&self) -> TimeT {
        self.time()
    }

    pub fn value_with(&self, emit: bool) -> TimeT {
        self.time_with(emit)
    }

    /// Time since the latest start, or `None` while stopped.
    pub fn since_start(&self) -> Option<TimeT> {
        let started_at = self.started_at.filter(|_| self.active)?;
        Some(self.clock.now() - started_at)
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), false)
    }
}

impl From<&Stopwatch> for TimeT {
    fn from(stopwatch: &Stopwatch) -> Self {
        stopwatch.time()
    }
}

impl fmt::Display for Stopwatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.time())
    }
}

impl fmt::Debug for Stopwatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stopwatch")
            .field("accumulated", &self.accumulated)
            .field("started_at", &self.started_at)
            .field("last_stop", &self.last_stop)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

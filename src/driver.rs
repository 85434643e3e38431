use crate::scheduler::WheelScheduler;
use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};
use tracing::{debug, warn};

/// Ticks a [`WheelScheduler`] from a background thread once per resolution
/// until stopped or dropped.
pub struct Driver {
    terminate: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Driver {
    pub fn start(scheduler: Arc<WheelScheduler>) -> io::Result<Self> {
        let terminate = Arc::new(AtomicBool::new(false));
        let interval = Duration::from_millis(scheduler.resolution().max(1) as u64);

        let flag = terminate.clone();
        let handle = thread::Builder::new()
            .name("lapse-driver".into())
            .spawn(move || {
                while !flag.load(Ordering::Acquire) {
                    scheduler.tick();
                    thread::sleep(interval);
                }
            })?;

        debug!(?interval, "driver started");
        Ok(Self {
            terminate,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Signals the thread and waits for it to exit. Idempotent.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.terminate.store(true, Ordering::Release);
        if handle.join().is_err() {
            warn!("driver thread panicked");
        } else {
            debug!("driver stopped");
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::SystemClock, scheduler::Scheduler};

    #[test]
    fn driver_fires_callbacks_in_real_time() {
        let scheduler = Arc::new(WheelScheduler::new(Arc::new(SystemClock)));
        let fired = Arc::new(AtomicBool::new(false));

        let flag = fired.clone();
        scheduler
            .schedule(20, Box::new(move || flag.store(true, Ordering::SeqCst)))
            .unwrap();

        let mut driver = Driver::start(scheduler.clone()).unwrap();
        assert!(driver.is_running());
        thread::sleep(Duration::from_millis(300));
        driver.stop();

        assert!(!driver.is_running());
        assert!(fired.load(Ordering::SeqCst));
        assert_eq!(0, scheduler.pending());
    }

    #[test]
    fn stopped_driver_no_longer_ticks() {
        let scheduler = Arc::new(WheelScheduler::new(Arc::new(SystemClock)));
        let mut driver = Driver::start(scheduler.clone()).unwrap();
        driver.stop();
        driver.stop();

        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        scheduler
            .schedule(0, Box::new(move || flag.store(true, Ordering::SeqCst)))
            .unwrap();

        thread::sleep(Duration::from_millis(50));
        assert!(!fired.load(Ordering::SeqCst));
        assert_eq!(1, scheduler.pending());
    }
}

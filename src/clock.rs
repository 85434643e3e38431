use chrono::Utc;
use parking_lot::Mutex;

/// The signed 64-bit integer type used to store time in ms.
pub type TimeT = i64;

/// A source of "now", in milliseconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> TimeT;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimeT {
        Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
pub struct FakeClock {
    current: Mutex<TimeT>,
}

impl FakeClock {
    pub fn new(start: TimeT) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    pub fn advance(&self, duration: TimeT) {
        let mut guard = self.current.lock();
        *guard += duration;
    }

    pub fn set(&self, timestamp: TimeT) {
        *self.current.lock() = timestamp;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> TimeT {
        *self.current.lock()
    }
}

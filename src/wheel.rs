use crate::{
    clock::TimeT,
    entry::{Entry, Handle},
    error::SchedulerError,
};
use std::collections::{BinaryHeap, HashSet};

pub const SHORT_WHEEL_NUM_BUCKETS: usize = 128;
pub const LONG_WHEEL_NUM_BUCKETS: usize = 4096;
pub const SHORT_WHEEL_RESOLUTION_MS: TimeT = 8;

pub type Bucket = HashSet<Entry>;

/// Shape of the two wheels. The long wheel's resolution is the short wheel's
/// period, so only the short resolution and the bucket counts are free.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelConfig {
    pub resolution_ms: TimeT,
    pub short_buckets: usize,
    pub long_buckets: usize,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            resolution_ms: SHORT_WHEEL_RESOLUTION_MS,
            short_buckets: SHORT_WHEEL_NUM_BUCKETS,
            long_buckets: LONG_WHEEL_NUM_BUCKETS,
        }
    }
}

impl WheelConfig {
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.resolution_ms <= 0 {
            return Err(SchedulerError::InvalidConfig {
                reason: "resolution must be positive",
            });
        }
        if self.short_buckets == 0 || self.long_buckets == 0 {
            return Err(SchedulerError::InvalidConfig {
                reason: "wheels need at least one bucket",
            });
        }
        // Ticks are offset by up to a long period, so keep half the range free.
        match self.checked_long_period() {
            Some(period) if period <= TimeT::MAX / 2 => Ok(()),
            _ => Err(SchedulerError::InvalidConfig {
                reason: "wheel period overflows",
            }),
        }
    }

    fn checked_long_period(&self) -> Option<TimeT> {
        let short_buckets = TimeT::try_from(self.short_buckets).ok()?;
        let long_buckets = TimeT::try_from(self.long_buckets).ok()?;
        self.resolution_ms
            .checked_mul(short_buckets)?
            .checked_mul(long_buckets)
    }

    pub fn short_period(&self) -> TimeT {
        self.resolution_ms * self.short_buckets as TimeT
    }

    pub fn long_period(&self) -> TimeT {
        self.short_period() * self.long_buckets as TimeT
    }
}

pub struct Wheel {
    buckets: Vec<Bucket>,
    pub resolution: TimeT,
    pub period: TimeT,
}

impl Wheel {
    pub fn new_short_wheel(config: &WheelConfig) -> Self {
        Wheel::new(
            config.short_buckets,
            config.resolution_ms,
            config.short_period(),
        )
    }

    pub fn new_long_wheel(config: &WheelConfig) -> Self {
        Wheel::new(
            config.long_buckets,
            config.short_period(),
            config.long_period(),
        )
    }

    fn new(num_buckets: usize, resolution: TimeT, period: TimeT) -> Self {
        let buckets: Vec<Bucket> = (0..num_buckets).map(|_| HashSet::new()).collect();
        Wheel {
            buckets,
            resolution,
            period,
        }
    }

    pub fn insert(&mut self, entry: Entry) {
        let index = self.bucket_index(entry.pop_time());
        self.buckets[index].insert(entry);
    }

    pub fn pop(&mut self, timestamp: TimeT) -> Bucket {
        let index = self.bucket_index(timestamp);
        std::mem::take(&mut self.buckets[index])
    }

    pub fn remove(&mut self, entry: &Entry) -> bool {
        let index = self.bucket_index(entry.pop_time());
        self.buckets[index].remove(entry)
    }

    fn bucket_index(&self, timestamp: TimeT) -> usize {
        timestamp
            .div_euclid(self.resolution)
            .rem_euclid(self.buckets.len() as TimeT) as usize
    }

    pub fn round_timestamp(&self, timestamp: TimeT) -> TimeT {
        timestamp - timestamp.rem_euclid(self.resolution)
    }

    pub fn should_insert(&self, tick: TimeT, entry: &Entry) -> bool {
        self.round_timestamp(entry.pop_time()) < self.round_timestamp(tick + self.period)
    }
}

/// Min-heap of entries beyond the long wheel's reach.
#[derive(Default)]
pub struct TimerHeap {
    heap: BinaryHeap<Entry>,
    tombstones: HashSet<Handle>,
}

impl TimerHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Entry) {
        self.heap.push(entry)
    }

    /// Marks the entry as removed; it is dropped when it reaches the top.
    pub fn remove(&mut self, entry: &Entry) -> bool {
        self.tombstones.insert(entry.handle.clone())
    }

    /// Wrapper around the heap peek which buries tombstoned entries.
    pub fn peek(&mut self) -> Option<&Entry> {
        self.bury();
        self.heap.peek()
    }

    /// Wrapper around the heap pop which buries tombstoned entries.
    pub fn pop(&mut self) -> Option<Entry> {
        self.bury();
        self.heap.pop()
    }

    /// Bury upcoming entries which have a tombstone (RIP).
    fn bury(&mut self) {
        while let Some(next) = self.heap.peek() {
            if !self.tombstones.contains(&next.handle) {
                break;
            }
            if let Some(entry) = self.heap.pop() {
                self.tombstones.remove(&entry.handle);
            }
        }
    }
}

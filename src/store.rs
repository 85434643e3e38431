use crate::{
    clock::{Clock, TimeT},
    entry::{Entry, Handle},
    error::SchedulerError,
    wheel::{Bucket, TimerHeap, Wheel, WheelConfig},
};
use std::{collections::HashMap, sync::Arc};

/// Hierarchical timer wheel: a fine short wheel, a coarse long wheel, and a
/// heap for anything further out. Entries cascade heap -> long -> short as
/// the tick advances.
pub struct Store {
    clock: Arc<dyn Clock>,
    tick: TimeT,
    lookup: HashMap<Handle, Entry>,
    short_wheel: Wheel,
    long_wheel: Wheel,
    overdue: Bucket,
    heap: TimerHeap,
}

impl Store {
    pub fn new(clock: Arc<dyn Clock>, config: &WheelConfig) -> Self {
        // Start ticking from now, rounded down to the short wheel resolution.
        let short_wheel = Wheel::new_short_wheel(config);
        let tick = short_wheel.round_timestamp(clock.now());
        Self {
            clock,
            tick,
            lookup: HashMap::new(),
            short_wheel,
            long_wheel: Wheel::new_long_wheel(config),
            overdue: Bucket::default(),
            heap: TimerHeap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn insert(&mut self, entry: Entry) -> Result<(), SchedulerError> {
        if self.lookup.contains_key(&entry.handle) {
            return Err(SchedulerError::DuplicateHandle(entry.handle));
        }
        self.lookup.insert(entry.handle.clone(), entry.clone());

        if entry.pop_time() < self.tick {
            // Entry is overdue.
            self.overdue.insert(entry);
        } else if self.short_wheel.should_insert(self.tick, &entry) {
            self.short_wheel.insert(entry);
        } else if self.long_wheel.should_insert(self.tick, &entry) {
            self.long_wheel.insert(entry);
        } else {
            // Too far into the future, park it in the heap.
            self.heap.push(entry);
        }
        Ok(())
    }

    /// Advances the tick to the clock and returns every entry that is due.
    pub fn pop(&mut self) -> Bucket {
        // Overdue entries pop regardless of whether a new tick is processed.
        let mut entries = std::mem::take(&mut self.overdue);

        let ticks = (self.clock.now() - self.tick) / self.short_wheel.resolution;
        for _ in 0..ticks {
            entries.extend(self.short_wheel.pop(self.tick));

            self.tick += self.short_wheel.resolution;
            self.fill_wheels();
        }

        // Entries that were removed after being cascaded are no longer in the
        // lookup and must not pop.
        entries.retain(|entry| self.lookup.remove(&entry.handle).is_some());
        entries
    }

    pub fn remove(&mut self, handle: &Handle) -> bool {
        let Some(entry) = self.lookup.remove(handle) else {
            return false;
        };

        // The entry may not have cascaded yet, so look in every level.
        self.overdue.remove(&entry)
            || self.short_wheel.remove(&entry)
            || self.long_wheel.remove(&entry)
            || self.heap.remove(&entry)
    }

    fn fill_wheels(&mut self) {
        // Refill the long wheel at the end of a long wheel period.
        if self.tick % self.long_wheel.period == 0 {
            self.fill_long_wheel();
        }

        // Refill the short wheel at the end of a short wheel period.
        // This is done second as entries may need to propagate from
        // heap -> long wheel -> short wheel.
        if self.tick % self.short_wheel.period == 0 {
            self.fill_short_wheel();
        }
    }

    fn fill_long_wheel(&mut self) {
        while let Some(next) = self.heap.peek() {
            if next.pop_time() >= self.tick + self.long_wheel.period {
                break;
            }
            if let Some(entry) = self.heap.pop() {
                self.long_wheel.insert(entry);
            }
        }
    }

    fn fill_short_wheel(&mut self) {
        let bucket = self.long_wheel.pop(self.tick);
        bucket
            .into_iter()
            .for_each(|entry| self.short_wheel.insert(entry));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::FakeClock, units::HOUR, wheel::SHORT_WHEEL_RESOLUTION_MS};
    use test_case::test_case;

    const GRANULARITY_MS: TimeT = SHORT_WHEEL_RESOLUTION_MS;

    fn setup() -> (Arc<FakeClock>, Store) {
        let clock = Arc::new(FakeClock::new(0));
        let store = Store::new(clock.clone(), &WheelConfig::default());
        (clock, store)
    }

    #[test_case(100; "short")]
    #[test_case(1600; "long")]
    #[test_case(HOUR * 10; "really_long")]
    fn entry_pops_after_delay(delay: TimeT) {
        let (clock, mut store) = setup();
        store
            .insert(Entry::new(Handle::new(), clock.now(), delay))
            .unwrap();

        clock.advance(delay - GRANULARITY_MS);
        assert_eq!(0, store.pop().len());

        clock.advance(2 * GRANULARITY_MS);
        assert_eq!(1, store.pop().len());
        assert_eq!(0, store.len());
    }

    #[test_case(100; "short")]
    #[test_case(1600; "long")]
    #[test_case(HOUR * 10; "really_long")]
    fn multiple_entries_pop(delay: TimeT) {
        let (clock, mut store) = setup();
        store
            .insert(Entry::new(Handle::new(), clock.now(), delay))
            .unwrap();
        store
            .insert(Entry::new(Handle::new(), clock.now(), delay))
            .unwrap();
        assert_eq!(2, store.len());

        clock.advance(delay - GRANULARITY_MS);
        assert_eq!(0, store.pop().len());

        clock.advance(2 * GRANULARITY_MS);
        assert_eq!(2, store.pop().len());
    }

    #[test_case(100; "short")]
    #[test_case(1600; "long")]
    #[test_case(HOUR * 10; "really_long")]
    fn removed_entry_does_not_pop(delay: TimeT) {
        let (clock, mut store) = setup();
        let handle = Handle::new();
        store
            .insert(Entry::new(handle.clone(), clock.now(), delay))
            .unwrap();

        assert!(store.remove(&handle));
        assert!(!store.remove(&handle));

        clock.advance(delay + GRANULARITY_MS);
        assert_eq!(0, store.pop().len());
    }

    #[test]
    fn removal_before_cascade() {
        // Inserted into the long wheel, removed once it would belong to the
        // short wheel but before the short wheel refills.
        let (clock, mut store) = setup();
        clock.advance(500);
        store.pop();

        let handle = Handle::new();
        store
            .insert(Entry::new(handle.clone(), clock.now(), 1100))
            .unwrap();

        clock.advance(400);
        store.pop();
        assert!(store.remove(&handle));

        clock.advance(2000);
        assert_eq!(0, store.pop().len());
    }

    #[test]
    fn duplicate_handle_is_rejected() {
        let (clock, mut store) = setup();
        let handle = Handle::new();
        store
            .insert(Entry::new(handle.clone(), clock.now(), 100))
            .unwrap();

        assert_eq!(
            Err(SchedulerError::DuplicateHandle(handle.clone())),
            store.insert(Entry::new(handle, clock.now(), 200))
        );
    }

    #[test]
    fn overdue_entry_pop() {
        let (clock, mut store) = setup();
        clock.advance(500);
        assert_eq!(0, store.pop().len());

        // Insert an entry set to pop in the past.
        store.insert(Entry::new(Handle::new(), 0, 100)).unwrap();
        assert_eq!(1, store.pop().len());
    }

    #[test]
    fn overdue_entry_removal() {
        let (clock, mut store) = setup();
        clock.advance(500);
        assert_eq!(0, store.pop().len());

        let handle = Handle::new();
        store.insert(Entry::new(handle.clone(), 0, 100)).unwrap();

        assert!(store.remove(&handle));
        assert_eq!(0, store.pop().len());
    }

    #[test]
    fn negative_delay_is_overdue() {
        let (clock, mut store) = setup();
        clock.advance(100);
        store.pop();

        store
            .insert(Entry::new(Handle::new(), clock.now(), -50))
            .unwrap();
        assert_eq!(1, store.pop().len());
    }

    #[test]
    fn mixture_of_delays_pop() {
        // Entries that pop at the same time, inserted at different distances
        // so that two cascade from the long wheel and one starts in the short.
        let (clock, mut store) = setup();

        store
            .insert(Entry::new(Handle::new(), clock.now(), HOUR + 1000 + 500))
            .unwrap();

        clock.advance(HOUR);
        assert_eq!(0, store.pop().len());

        store
            .insert(Entry::new(Handle::new(), clock.now(), 1000 + 500))
            .unwrap();

        clock.advance(1000);
        assert_eq!(0, store.pop().len());

        store
            .insert(Entry::new(Handle::new(), clock.now(), 500))
            .unwrap();

        clock.advance(500 + GRANULARITY_MS);
        assert_eq!(3, store.pop().len());
    }

    #[test]
    fn heap_entries_pop_in_order() {
        let (clock, mut store) = setup();

        let first = Handle::new();
        let first_delay = HOUR + GRANULARITY_MS * 4;

        store
            .insert(Entry::new(Handle::new(), clock.now(), HOUR * 10))
            .unwrap();
        store
            .insert(Entry::new(first.clone(), clock.now(), first_delay))
            .unwrap();
        store
            .insert(Entry::new(Handle::new(), clock.now(), HOUR * 5))
            .unwrap();

        clock.advance(first_delay + GRANULARITY_MS);

        let entries = store.pop();
        assert_eq!(1, entries.len());
        assert!(entries.iter().any(|entry| entry.handle == first));
        assert_eq!(2, store.len());
    }
}

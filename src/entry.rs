use crate::clock::TimeT;
use std::{cmp::Ordering, fmt};
use uuid::Uuid;

/// A Universally Unique Identifier (UUID) for scheduled callbacks.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Handle(pub Uuid);

impl Handle {
    pub fn new() -> Self {
        Handle(Uuid::new_v4())
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for Handle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A pending callback's place in the wheel store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    pub handle: Handle,
    scheduled_at: TimeT,
    delay: TimeT,
}

impl Entry {
    pub fn new(handle: Handle, scheduled_at: TimeT, delay: TimeT) -> Self {
        Self {
            handle,
            scheduled_at,
            delay,
        }
    }

    pub fn pop_time(&self) -> TimeT {
        self.scheduled_at + self.delay
    }
}

// Reversed so that `BinaryHeap<Entry>` yields the earliest pop time first.
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.pop_time().cmp(&self.pop_time())
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn heap_yields_earliest_first() {
        let mut heap = BinaryHeap::new();
        heap.push(Entry::new(Handle::new(), 0, 300));
        heap.push(Entry::new(Handle::new(), 100, 50));
        heap.push(Entry::new(Handle::new(), 0, 200));

        let order: Vec<TimeT> = std::iter::from_fn(|| heap.pop())
            .map(|entry| entry.pop_time())
            .collect();
        assert_eq!(vec![150, 200, 300], order);
    }

    #[test]
    fn handles_are_unique() {
        assert_ne!(Handle::new(), Handle::new());
    }

    #[test]
    fn handle_displays_its_uuid() {
        let handle = Handle::new();
        assert_eq!(handle.uuid().to_string(), handle.to_string());
        assert_eq!(Some(uuid::Version::Random), handle.uuid().get_version());
    }
}

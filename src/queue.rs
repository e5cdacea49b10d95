//! A min-priority queue that breaks ties by insertion order.

use std::{cmp::Reverse, collections::BinaryHeap};

use ordered_float::OrderedFloat;

struct Item<T> {
    key: Reverse<(OrderedFloat<f64>, u64)>,
    value: T,
}

impl<T> PartialEq for Item<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for Item<T> {}

impl<T> PartialOrd for Item<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Item<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

/// Pops the value with the smallest priority first; among equal priorities,
/// the one pushed earliest.
pub struct PriorityQueue<T> {
    heap: BinaryHeap<Item<T>>,
    next_seq: u64,
}

impl<T> Default for PriorityQueue<T> {
    fn default() -> Self {
        PriorityQueue {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<T> PriorityQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value.
    pub fn push(&mut self, priority: f64, value: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Item {
            key: Reverse((OrderedFloat(priority), seq)),
            value,
        });
    }

    /// Removes and returns the value with the smallest priority.
    pub fn pop(&mut self) -> Option<T> {
        self.heap.pop().map(|item| item.value)
    }

    /// The number of queued values.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Is the queue empty?
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ties_pop_in_insertion_order() {
        let mut q = PriorityQueue::new();
        q.push(1.0, "b");
        q.push(0.0, "a");
        q.push(1.0, "c");
        q.push(6.0, "e");
        q.push(1.0, "d");
        let order: Vec<_> = std::iter::from_fn(|| q.pop()).collect();
        assert_eq!(order, ["a", "b", "c", "d", "e"]);
        assert!(q.is_empty());
    }

    proptest! {
        #[test]
        fn matches_a_stable_sort(priorities in prop::collection::vec(0u8..8, 0..64)) {
            let mut q = PriorityQueue::new();
            for (i, p) in priorities.iter().enumerate() {
                q.push(f64::from(*p), i);
            }
            let mut expected: Vec<usize> = (0..priorities.len()).collect();
            expected.sort_by_key(|&i| priorities[i]);
            let popped: Vec<usize> = std::iter::from_fn(|| q.pop()).collect();
            prop_assert_eq!(popped, expected);
        }
    }
}

//! Lazily recomputed values keyed by a revision counter.

use std::cell::Cell;

/// A monotonically increasing counter, bumped every time the geometry it
/// guards changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(u64);

impl Revision {
    /// Marks the guarded geometry as changed.
    pub fn bump(&mut self) {
        self.0 += 1;
    }

    /// The raw counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A derived value together with the revision it was computed at.
///
/// The value is recomputed exactly when the current revision differs from the
/// one it was last computed for. It uses interior mutability so that derived
/// geometry can be read through shared references.
#[derive(Clone)]
pub struct Cached<T: Copy> {
    slot: Cell<Option<(T, Revision)>>,
}

impl<T: Copy> Cached<T> {
    /// An empty cache; the first read always computes.
    pub fn new() -> Self {
        Cached {
            slot: Cell::new(None),
        }
    }

    /// Returns the cached value if it was computed at `current`, and otherwise
    /// recomputes it with `compute` and remembers it.
    pub fn get_or_compute(&self, current: Revision, compute: impl FnOnce() -> T) -> T {
        match self.slot.get() {
            Some((value, rev)) if rev == current => value,
            _ => {
                let value = compute();
                self.slot.set(Some((value, current)));
                value
            }
        }
    }
}

impl<T: Copy> Default for Cached<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + std::fmt::Debug> std::fmt::Debug for Cached<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.slot.get() {
            Some((value, rev)) => write!(f, "{value:?}@{}", rev.get()),
            None => write!(f, "<stale>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recomputes_only_on_revision_change() {
        let cache = Cached::<u32>::new();
        let mut rev = Revision::default();
        let mut calls = 0;

        let read = |rev: Revision, calls: &mut u32| {
            cache.get_or_compute(rev, || {
                *calls += 1;
                *calls * 10
            })
        };

        assert_eq!(read(rev, &mut calls), 10);
        assert_eq!(read(rev, &mut calls), 10);
        assert_eq!(calls, 1);

        rev.bump();
        assert_eq!(read(rev, &mut calls), 20);
        assert_eq!(read(rev, &mut calls), 20);
        assert_eq!(calls, 2);
    }
}

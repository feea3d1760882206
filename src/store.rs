//! Ordered multimap store.
//!
//! The shared backbone under the mock registry and, indirectly, the call
//! ordering engine: a map from a key chain to a FIFO of entries, where each
//! entry carries a remaining-use count that governs whether it is consumed,
//! skipped, or left behind as a leftover expectation.

use indexmap::IndexMap;
use std::collections::VecDeque;

use crate::location::SourceLocation;

/// How many more times an entry may be matched before it is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseCount {
    /// Consumed exactly this many times, then removed.
    Exact(u32),
    /// Never removed by use; only reaped explicitly as a leftover.
    Always,
    /// Consumed at most once; before use it is sticky (skipped by
    /// order-sensitive scans), after use it is inert and reapable.
    Maybe(MaybeState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaybeState {
    NeverUsed,
    Used,
}

impl UseCount {
    /// Whether a call-ordering scan should treat this entry as a mismatch
    /// that must be skipped over rather than matched or rejected.
    pub fn is_sticky(&self) -> bool {
        matches!(self, UseCount::Always | UseCount::Maybe(MaybeState::NeverUsed))
    }
}

#[derive(Debug, Clone)]
pub struct Entry<V> {
    pub value: V,
    pub use_count: UseCount,
    pub location: SourceLocation,
}

#[derive(Debug, Default)]
struct Bucket<V> {
    queue: VecDeque<Entry<V>>,
}

/// A multimap keyed by an ordered chain of strings (e.g. `[function,
/// parameter]`), each key mapping to a FIFO of entries.
#[derive(Debug)]
pub struct Store<V> {
    buckets: IndexMap<Vec<String>, Bucket<V>>,
}

impl<V> Default for Store<V> {
    fn default() -> Self {
        Store {
            buckets: IndexMap::new(),
        }
    }
}

impl<V> Store<V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    /// Enqueues an entry at the back of the bucket for `parts`.
    pub fn add(&mut self, parts: &[&str], value: V, use_count: UseCount, location: SourceLocation) {
        self.buckets
            .entry(Self::key(parts))
            .or_default()
            .queue
            .push_back(Entry {
                value,
                use_count,
                location,
            });
    }

    /// Removes and returns the front entry for `parts`, decrementing an
    /// `Exact` count or flipping a `Maybe(NeverUsed)` to `Maybe(Used)`.
    /// Returns `None` if the bucket is empty or missing.
    pub fn take(&mut self, parts: &[&str]) -> Option<Entry<V>>
    where
        V: Clone,
    {
        let key = Self::key(parts);
        let bucket = self.buckets.get_mut(&key)?;
        let front = bucket.queue.front_mut()?;

        let result = Entry {
            value: front.value.clone(),
            use_count: front.use_count,
            location: front.location,
        };

        match &mut front.use_count {
            UseCount::Exact(n) => {
                *n -= 1;
                if *n == 0 {
                    bucket.queue.pop_front();
                }
            }
            UseCount::Always => {}
            UseCount::Maybe(state @ MaybeState::NeverUsed) => {
                *state = MaybeState::Used;
            }
            UseCount::Maybe(MaybeState::Used) => {
                bucket.queue.pop_front();
            }
        }

        if bucket.queue.is_empty() {
            self.buckets.shift_remove(&key);
        }

        Some(result)
    }

    /// Returns the location of the front entry, if any — used as a cue
    /// when an underflow needs to point at "the last thing queued here".
    pub fn front_location(&self, parts: &[&str]) -> Option<SourceLocation> {
        self.buckets
            .get(&Self::key(parts))
            .and_then(|b| b.queue.front())
            .map(|e| e.location)
    }

    pub fn has_remaining(&self, parts: &[&str]) -> bool {
        self.buckets
            .get(&Self::key(parts))
            .map(|b| !b.queue.is_empty())
            .unwrap_or(false)
    }

    /// Drops every `Maybe` entry across all buckets, used or not. Called at
    /// the end of a test to discard "maybe consumed, maybe not" leftovers:
    /// a `Maybe(Used)` was in fact used, and a `Maybe(NeverUsed)` is
    /// permitted to go unused entirely (spec §8: "a MAYBE entry with zero
    /// takes is not a leftover"), matching cmocka's
    /// `remove_always_return_values_from_list` freeing every entry with
    /// `refcount < -1` before the leftover scan.
    pub fn reap_used_sticky(&mut self) {
        let mut empty_keys = Vec::new();
        for (key, bucket) in self.buckets.iter_mut() {
            bucket
                .queue
                .retain(|e| !matches!(e.use_count, UseCount::Maybe(_)));
            if bucket.queue.is_empty() {
                empty_keys.push(key.clone());
            }
        }
        for key in empty_keys {
            self.buckets.shift_remove(&key);
        }
    }

    /// Entries that are neither `Always` nor `Maybe` and were never
    /// consumed — the definition of a leftover expectation at test end.
    pub fn leftover_count(&self) -> usize {
        self.buckets
            .values()
            .flat_map(|b| b.queue.iter())
            .filter(|e| !matches!(e.use_count, UseCount::Always | UseCount::Maybe(_)))
            .count()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

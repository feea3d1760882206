//! Call-ordering engine.
//!
//! A single FIFO of expected calls shared across all mocked functions in a
//! test. Matching skips over sticky (`Always`/unused-`Maybe`) mismatches —
//! they represent "may happen any time" expectations that shouldn't block
//! a strictly-ordered pair behind them — and hard-fails on the first
//! non-sticky mismatch or on an empty queue.

use std::collections::VecDeque;

use crate::error::MockaError;
use crate::location::SourceLocation;
use crate::store::{MaybeState, UseCount};

#[derive(Debug, Clone)]
struct OrderingEntry {
    function: String,
    use_count: UseCount,
    location: SourceLocation,
}

#[derive(Debug, Default)]
pub struct OrderingQueue {
    queue: VecDeque<OrderingEntry>,
}

impl OrderingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn expect(&mut self, function: &str, use_count: UseCount, location: SourceLocation) {
        self.queue.push_back(OrderingEntry {
            function: function.to_string(),
            use_count,
            location,
        });
    }

    /// Records that `function` was called. Scans from the front, skipping
    /// past sticky mismatches, until it finds a matching entry (consumed
    /// in place) or a non-sticky mismatch / an empty queue (rejected).
    pub fn record_call(&mut self, function: &str, location: SourceLocation) -> Result<(), MockaError> {
        if self.queue.is_empty() {
            return Err(MockaError::OrderViolation {
                expected: function.to_string(),
                actual: None,
                location,
            });
        }

        let mut i = 0;
        while i < self.queue.len() {
            let entry = &mut self.queue[i];
            if entry.function == function {
                match &mut entry.use_count {
                    UseCount::Exact(n) => {
                        *n -= 1;
                        if *n == 0 {
                            self.queue.remove(i);
                        }
                    }
                    UseCount::Always => {}
                    UseCount::Maybe(state @ MaybeState::NeverUsed) => {
                        *state = MaybeState::Used;
                    }
                    UseCount::Maybe(MaybeState::Used) => {
                        self.queue.remove(i);
                    }
                }
                return Ok(());
            }

            if !entry.use_count.is_sticky() {
                return Err(MockaError::OrderViolation {
                    expected: entry.function.clone(),
                    actual: Some(function.to_string()),
                    location,
                });
            }

            i += 1;
        }

        Err(MockaError::OrderViolation {
            expected: front_function(&self.queue),
            actual: Some(function.to_string()),
            location,
        })
    }

    /// Drops every `Maybe` entry, used or not — neither a consumed nor an
    /// unexercised MAYBE call expectation is a leftover at end-of-test.
    /// Mirrors `remove_always_return_values_from_list`'s role for the
    /// ordering queue specifically.
    pub fn reap_used_sticky(&mut self) {
        self.queue.retain(|e| !matches!(e.use_count, UseCount::Maybe(_)));
    }

    pub fn leftover_count(&self) -> usize {
        self.queue
            .iter()
            .filter(|e| !matches!(e.use_count, UseCount::Always | UseCount::Maybe(_)))
            .count()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

fn front_function(queue: &VecDeque<OrderingEntry>) -> String {
    queue
        .front()
        .map(|e| e.function.clone())
        .unwrap_or_default()
}

/// Queues an expected call to `function`, matched against calls reported
/// through [`function_called`] in the order they are declared.
#[track_caller]
pub fn expect_function_call(function: &str, use_count: UseCount) {
    let location = SourceLocation::caller();
    crate::runner::with_context(|ctx| ctx.order.expect(function, use_count, location));
}

/// Reports that `function` was called, matching it against the head of the
/// ordering queue. Production code under test calls this directly (the
/// macro-wrapped surface is out of scope; see spec.md §1).
#[track_caller]
pub fn function_called(function: &str) -> Result<(), MockaError> {
    let location = SourceLocation::caller();
    crate::runner::with_context(|ctx| ctx.order.record_call(function, location))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation { file: "test", line: 1 }
    }

    #[test]
    fn strict_order_enforced() {
        let mut q = OrderingQueue::new();
        q.expect("a", UseCount::Exact(1), loc());
        q.expect("b", UseCount::Exact(1), loc());
        assert!(q.record_call("a", loc()).is_ok());
        assert!(q.record_call("b", loc()).is_ok());
    }

    #[test]
    fn out_of_order_is_rejected() {
        let mut q = OrderingQueue::new();
        q.expect("a", UseCount::Exact(1), loc());
        q.expect("b", UseCount::Exact(1), loc());
        assert!(q.record_call("b", loc()).is_err());
    }

    #[test]
    fn always_entry_is_skipped_over() {
        let mut q = OrderingQueue::new();
        q.expect("log", UseCount::Always, loc());
        q.expect("a", UseCount::Exact(1), loc());
        q.expect("b", UseCount::Exact(1), loc());
        assert!(q.record_call("a", loc()).is_ok());
        assert!(q.record_call("log", loc()).is_ok());
        assert!(q.record_call("b", loc()).is_ok());
    }

    #[test]
    fn empty_queue_rejects_any_call() {
        let mut q = OrderingQueue::new();
        assert!(q.record_call("a", loc()).is_err());
    }

    #[test]
    fn leftover_excludes_always_entries() {
        let mut q = OrderingQueue::new();
        q.expect("log", UseCount::Always, loc());
        q.expect("a", UseCount::Exact(1), loc());
        assert_eq!(q.leftover_count(), 1);
    }

    #[test]
    fn used_maybe_entry_is_not_a_leftover() {
        let mut q = OrderingQueue::new();
        q.expect("maybe_call", UseCount::Maybe(MaybeState::NeverUsed), loc());
        assert!(q.record_call("maybe_call", loc()).is_ok());
        assert_eq!(q.leftover_count(), 0);
        q.reap_used_sticky();
        assert_eq!(q.leftover_count(), 0);
    }

    #[test]
    fn unused_maybe_entry_is_not_a_leftover() {
        let mut q = OrderingQueue::new();
        q.expect("maybe_call", UseCount::Maybe(MaybeState::NeverUsed), loc());
        assert_eq!(q.leftover_count(), 0);
    }
}

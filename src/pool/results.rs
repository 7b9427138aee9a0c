//! Lazy result sequences produced by the map operations.
//!
//! Workers tag every outcome with the index of the input that produced it
//! and push `(index, outcome)` pairs onto a per-call crossbeam channel. The
//! two iterators here differ only in how they consume that channel:
//! [`OrderedResults`] reorders by index, [`UnorderedResults`] yields in
//! arrival order.
//!
//! Both are single-pass: once an outcome has been yielded it is gone. If the
//! pool is terminated while a sequence is still being consumed, the
//! producing side of the channel disconnects and the iterator ends early;
//! outcomes for abandoned tasks are never delivered.

use crate::pool::outcome::TaskOutcome;
use crossbeam::channel::Receiver;
use std::collections::HashMap;

/// Lazy, input-order-preserving result sequence.
///
/// The consumer blocks only when the next in-order outcome has not been
/// produced yet. Outcomes that completed out of order are parked in a buffer
/// and yielded without blocking once their turn comes.
#[derive(Debug)]
pub struct OrderedResults<R> {
    rx: Receiver<(usize, TaskOutcome<R>)>,
    parked: HashMap<usize, TaskOutcome<R>>,
    next_index: usize,
    total: usize,
}

impl<R> OrderedResults<R> {
    pub(crate) fn new(rx: Receiver<(usize, TaskOutcome<R>)>, total: usize) -> Self {
        Self {
            rx,
            parked: HashMap::new(),
            next_index: 0,
            total,
        }
    }

    /// Number of outcomes not yet yielded (assuming no early termination).
    pub fn remaining(&self) -> usize {
        self.total - self.next_index
    }
}

impl<R> Iterator for OrderedResults<R> {
    type Item = TaskOutcome<R>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.total {
            return None;
        }
        if let Some(outcome) = self.parked.remove(&self.next_index) {
            self.next_index += 1;
            return Some(outcome);
        }
        while let Ok((index, outcome)) = self.rx.recv() {
            if index == self.next_index {
                self.next_index += 1;
                return Some(outcome);
            }
            self.parked.insert(index, outcome);
        }
        // Producers disconnected before the batch completed: the pool was
        // terminated and the remaining outcomes abandoned.
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}

#[derive(Debug)]
enum UnorderedRepr<R> {
    /// Arrival order straight off the result channel.
    Arrival {
        rx: Receiver<(usize, TaskOutcome<R>)>,
        remaining: usize,
    },
    /// Delegation for backends whose primitive cannot reorder by completion
    /// time; yields in input order instead.
    InputOrder(OrderedResults<R>),
}

/// Lazy result sequence with no ordering guarantee.
///
/// On the channel backend each outcome is yielded as soon as any worker
/// completes it. The rayon backend delegates to the ordered primitive, so
/// there the sequence happens to arrive in input order.
#[derive(Debug)]
pub struct UnorderedResults<R> {
    repr: UnorderedRepr<R>,
}

impl<R> UnorderedResults<R> {
    pub(crate) fn by_arrival(rx: Receiver<(usize, TaskOutcome<R>)>, total: usize) -> Self {
        Self {
            repr: UnorderedRepr::Arrival {
                rx,
                remaining: total,
            },
        }
    }

    pub(crate) fn input_ordered(inner: OrderedResults<R>) -> Self {
        Self {
            repr: UnorderedRepr::InputOrder(inner),
        }
    }
}

impl<R> Iterator for UnorderedResults<R> {
    type Item = TaskOutcome<R>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.repr {
            UnorderedRepr::Arrival { rx, remaining } => {
                if *remaining == 0 {
                    return None;
                }
                match rx.recv() {
                    Ok((_, outcome)) => {
                        *remaining -= 1;
                        Some(outcome)
                    }
                    Err(_) => None,
                }
            }
            UnorderedRepr::InputOrder(inner) => inner.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.repr {
            UnorderedRepr::Arrival { remaining, .. } => (0, Some(*remaining)),
            UnorderedRepr::InputOrder(inner) => inner.size_hint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;

    #[test]
    fn test_ordered_results_reorder_out_of_order_arrivals() {
        let (tx, rx) = unbounded();
        tx.send((2, Ok(9))).unwrap();
        tx.send((0, Ok(1))).unwrap();
        tx.send((1, Ok(4))).unwrap();
        drop(tx);

        let collected: Vec<_> = OrderedResults::new(rx, 3).collect();
        assert_eq!(collected, vec![Ok(1), Ok(4), Ok(9)]);
    }

    #[test]
    fn test_ordered_results_end_early_on_disconnect() {
        let (tx, rx) = unbounded();
        tx.send((0, Ok(1))).unwrap();
        // Index 1 never arrives; the sender side goes away instead.
        drop(tx);

        let collected: Vec<TaskOutcome<i32>> = OrderedResults::new(rx, 3).collect();
        assert_eq!(collected, vec![Ok(1)]);
    }

    #[test]
    fn test_ordered_results_do_not_block_on_parked_outcomes() {
        let (tx, rx) = unbounded();
        tx.send((1, Ok(4))).unwrap();
        tx.send((0, Ok(1))).unwrap();
        drop(tx);

        let mut results = OrderedResults::new(rx, 2);
        assert_eq!(results.next(), Some(Ok(1)));
        // Channel is now empty and disconnected; index 1 must come from the
        // parking buffer without touching recv.
        assert_eq!(results.next(), Some(Ok(4)));
        assert_eq!(results.next(), None);
    }

    #[test]
    fn test_unordered_results_yield_in_arrival_order() {
        let (tx, rx) = unbounded();
        tx.send((3, Ok(16))).unwrap();
        tx.send((0, Ok(1))).unwrap();
        drop(tx);

        let collected: Vec<_> = UnorderedResults::by_arrival(rx, 2).collect();
        assert_eq!(collected, vec![Ok(16), Ok(1)]);
    }

    #[test]
    fn test_empty_batch_yields_nothing() {
        let (tx, rx) = unbounded::<(usize, TaskOutcome<i32>)>();
        drop(tx);
        assert_eq!(OrderedResults::new(rx, 0).count(), 0);
    }
}

//! Pool lifecycle state machine.
//!
//! `Uninitialized -> Active -> (Terminated | Closed)`. The two terminal
//! states are absorbing: once reached, the pool accepts no further
//! submissions and never re-enters `Active`.

use crate::error::{PoolError, Result};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Observable lifecycle state of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Backend construction has started but is not complete.
    Uninitialized,
    /// Workers are running and submissions are accepted.
    Active,
    /// Forcibly stopped; queued work was abandoned.
    Terminated,
    /// Gracefully drained; queued work was honored.
    Closed,
}

impl LifecycleState {
    /// Whether this state is terminal (no submissions, no re-entry).
    pub fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Terminated | LifecycleState::Closed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Uninitialized => write!(f, "uninitialized"),
            LifecycleState::Active => write!(f, "active"),
            LifecycleState::Terminated => write!(f, "terminated"),
            LifecycleState::Closed => write!(f, "closed"),
        }
    }
}

const UNINITIALIZED: u8 = 0;
const ACTIVE: u8 = 1;
const TERMINATED: u8 = 2;
const CLOSED: u8 = 3;

/// Atomic cell holding a pool's lifecycle state.
///
/// Shared by both backends; all transitions go through compare-exchange so
/// concurrent teardown paths (explicit call vs drop backstop) agree on which
/// one performed the terminal transition.
pub(crate) struct LifecycleCell(AtomicU8);

impl LifecycleCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(UNINITIALIZED))
    }

    pub(crate) fn get(&self) -> LifecycleState {
        match self.0.load(Ordering::SeqCst) {
            UNINITIALIZED => LifecycleState::Uninitialized,
            ACTIVE => LifecycleState::Active,
            TERMINATED => LifecycleState::Terminated,
            _ => LifecycleState::Closed,
        }
    }

    /// `Uninitialized -> Active`, once the backend is ready for submissions.
    pub(crate) fn activate(&self) -> Result<()> {
        self.0
            .compare_exchange(UNINITIALIZED, ACTIVE, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| PoolError::LifecycleViolation {
                operation: "activate",
                state: self.get(),
            })?;
        tracing::debug!("pool active");
        Ok(())
    }

    /// Guard used by every submission path.
    pub(crate) fn ensure_active(&self, operation: &'static str) -> Result<()> {
        let state = self.get();
        if state == LifecycleState::Active {
            Ok(())
        } else {
            Err(PoolError::LifecycleViolation { operation, state })
        }
    }

    /// Attempt the terminal transition into `target`.
    ///
    /// Returns `true` if this caller performed the transition, `false` if
    /// the cell was already terminal (absorbing; the teardown work has been
    /// done by someone else).
    pub(crate) fn finish(&self, target: LifecycleState) -> bool {
        let raw = match target {
            LifecycleState::Terminated => TERMINATED,
            LifecycleState::Closed => CLOSED,
            _ => unreachable!("finish targets are terminal states only"),
        };
        // A pool that never reached Active can still be finished; there is
        // simply nothing running to stop.
        let from_active = self
            .0
            .compare_exchange(ACTIVE, raw, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        let from_uninit = !from_active
            && self
                .0
                .compare_exchange(UNINITIALIZED, raw, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok();
        let transitioned = from_active || from_uninit;
        if transitioned {
            tracing::debug!(state = %target, "pool reached terminal state");
        }
        transitioned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_transition_chain() {
        let cell = LifecycleCell::new();
        assert_eq!(cell.get(), LifecycleState::Uninitialized);
        cell.activate().unwrap();
        assert_eq!(cell.get(), LifecycleState::Active);
        assert!(cell.finish(LifecycleState::Closed));
        assert_eq!(cell.get(), LifecycleState::Closed);
    }

    #[test]
    fn test_terminal_states_are_absorbing() {
        let cell = LifecycleCell::new();
        cell.activate().unwrap();
        assert!(cell.finish(LifecycleState::Terminated));
        // Second finisher loses the race and must not flip the state.
        assert!(!cell.finish(LifecycleState::Closed));
        assert_eq!(cell.get(), LifecycleState::Terminated);
    }

    #[test]
    fn test_double_activate_is_a_violation() {
        let cell = LifecycleCell::new();
        cell.activate().unwrap();
        assert!(cell.activate().is_err());
    }

    #[test]
    fn test_ensure_active_rejects_terminal_states() {
        let cell = LifecycleCell::new();
        cell.activate().unwrap();
        cell.finish(LifecycleState::Terminated);
        let err = cell.ensure_active("lazy_ordered_map").unwrap_err();
        assert!(matches!(
            err,
            crate::PoolError::LifecycleViolation {
                state: LifecycleState::Terminated,
                ..
            }
        ));
    }

    #[test]
    fn test_finish_before_activate() {
        let cell = LifecycleCell::new();
        assert!(cell.finish(LifecycleState::Terminated));
        assert_eq!(cell.get(), LifecycleState::Terminated);
    }
}

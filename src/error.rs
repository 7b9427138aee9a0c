//! Error taxonomy for pool construction and lifecycle misuse.
//!
//! Per-task failures are deliberately *not* part of this enum: a panicking
//! task is recorded against its own outcome as a
//! [`TaskFailure`](crate::pool::TaskFailure) and surfaced when that outcome
//! is retrieved, without touching the pool or its sibling tasks.

use crate::pool::LifecycleState;
use thiserror::Error;

/// Errors surfaced by pool construction, submission, and teardown.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The requested backend is not usable: either this build does not carry
    /// it, or the underlying executor failed to construct.
    #[error("pool backend unavailable: {0}")]
    BackendUnavailable(String),

    /// An operation was attempted in a lifecycle state that forbids it, such
    /// as submitting work to a pool that has already been terminated or
    /// closed. This is a programmer error, not a runtime condition to retry.
    #[error("`{operation}` is not allowed while the pool is {state}")]
    LifecycleViolation {
        operation: &'static str,
        state: LifecycleState,
    },

    /// The host refused to spawn a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

/// Result type alias for forkpool operations
pub type Result<T> = std::result::Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_violation_message_names_operation_and_state() {
        let err = PoolError::LifecycleViolation {
            operation: "eager_map",
            state: LifecycleState::Terminated,
        };
        let msg = err.to_string();
        assert!(msg.contains("eager_map"));
        assert!(msg.contains("terminated"));
    }

    #[test]
    fn test_worker_spawn_wraps_io_error() {
        let io = std::io::Error::other("no threads left");
        let err = PoolError::from(io);
        assert!(matches!(err, PoolError::WorkerSpawn(_)));
    }
}

//! Per-task outcomes and panic capture.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// Outcome of a single submitted task: the produced value, or the failure
/// recorded when the task panicked.
pub type TaskOutcome<R> = std::result::Result<R, TaskFailure>;

/// A task panicked while executing.
///
/// Recorded against the specific input that triggered it; sibling tasks in
/// the same batch are unaffected and keep running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("task for input #{input_index} panicked: {message}")]
pub struct TaskFailure {
    /// Zero-based position of the failing input in its batch.
    pub input_index: usize,
    /// Stringified panic payload.
    pub message: String,
}

/// Run one task invocation, converting a panic into a recorded failure.
///
/// Workers call this so a panicking task never unwinds through the worker
/// loop; the thread survives to pick up the next job.
pub(crate) fn run_catching<T, R, F>(task: &F, index: usize, input: T) -> TaskOutcome<R>
where
    F: Fn(T) -> R,
{
    match panic::catch_unwind(AssertUnwindSafe(|| task(input))) {
        Ok(value) => Ok(value),
        Err(payload) => Err(TaskFailure {
            input_index: index,
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string panic payload>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_successful_task_yields_value() {
        let outcome = run_catching(&|x: i32| x * x, 0, 7);
        assert_eq!(outcome, Ok(49));
    }

    #[test]
    fn test_panicking_task_records_failure_with_index() {
        let outcome: TaskOutcome<i32> = run_catching(&|x: i32| 1 / (x - 3), 2, 3);
        let failure = outcome.unwrap_err();
        assert_eq!(failure.input_index, 2);
        assert!(failure.message.contains("divide by zero"));
    }

    #[test]
    fn test_string_panic_payload_is_preserved() {
        let outcome: TaskOutcome<()> =
            run_catching(&|_: ()| panic!("boom {}", 42), 5, ());
        assert_eq!(outcome.unwrap_err().message, "boom 42");
    }
}

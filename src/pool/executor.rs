//! Managed-executor backend over `rayon::ThreadPool`.
//!
//! Rayon manages its own worker threads, which are joinable by construction,
//! so the fork-capable-worker guarantee the channel backend enforces through
//! its factory needs no override here; the pool configuration covers thread
//! naming and stack size only.
//!
//! Known behavioral gap: rayon exposes an ordered parallel map but no
//! completion-order primitive, so [`lazy_unordered_map`] delegates to the
//! ordered map and yields outcomes in input order. True completion-order
//! delivery would require routing raw per-task results past rayon's ordered
//! combiners; callers who need it should use the channel backend.
//!
//! [`lazy_unordered_map`]: RayonPool::lazy_unordered_map

use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::pool::lifecycle::{LifecycleCell, LifecycleState};
use crate::pool::outcome::{TaskOutcome, run_catching};
use crate::pool::results::{OrderedResults, UnorderedResults};
use crate::pool::ParallelMap;
use crossbeam::channel::unbounded;
use rayon::prelude::*;
use std::sync::Arc;

/// Worker pool backed by a dedicated `rayon::ThreadPool`.
pub struct RayonPool {
    state: LifecycleCell,
    executor: Option<rayon::ThreadPool>,
    worker_count: usize,
}

impl RayonPool {
    /// Construct the executor and its worker threads.
    pub fn new(config: &PoolConfig) -> Result<Self> {
        let state = LifecycleCell::new();
        let worker_count = config.resolved_workers();
        let prefix = config.worker_name_prefix.clone();

        let mut builder = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .thread_name(move |i| format!("{prefix}-{i}"));
        if let Some(bytes) = config.worker_stack_size {
            builder = builder.stack_size(bytes);
        }
        let executor = builder
            .build()
            .map_err(|e| PoolError::BackendUnavailable(e.to_string()))?;
        tracing::debug!(workers = worker_count, "rayon pool workers spawned");

        let pool = Self {
            state,
            executor: Some(executor),
            worker_count,
        };
        pool.state.activate()?;
        Ok(pool)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn state(&self) -> LifecycleState {
        self.state.get()
    }

    fn executor(&self, operation: &'static str) -> Result<&rayon::ThreadPool> {
        self.state.ensure_active(operation)?;
        self.executor
            .as_ref()
            .ok_or_else(|| PoolError::LifecycleViolation {
                operation,
                state: self.state.get(),
            })
    }

    /// Shut the executor down.
    ///
    /// Rayon has a single teardown operation: dropping the pool. Jobs
    /// already spawned complete against the surviving registry before its
    /// threads exit, so there is no distinct abandon-in-flight-work flavor;
    /// `terminate` and `close` differ only in the terminal state recorded.
    fn shutdown(&mut self, target: LifecycleState) -> Result<()> {
        if !self.state.finish(target) {
            return Ok(());
        }
        self.executor.take();
        Ok(())
    }

    /// See [`shutdown`](RayonPool::shutdown): same operation as `close`.
    pub fn terminate(&mut self) -> Result<()> {
        self.shutdown(LifecycleState::Terminated)
    }

    /// See [`shutdown`](RayonPool::shutdown): same operation as `terminate`.
    pub fn close(&mut self) -> Result<()> {
        self.shutdown(LifecycleState::Closed)
    }

    /// No-op: shutdown already waits for spawned work.
    pub fn join(&mut self) -> Result<()> {
        Ok(())
    }
}

impl ParallelMap for RayonPool {
    fn lazy_ordered_map<T, R, F, I>(&self, task: F, inputs: I) -> Result<OrderedResults<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        let executor = self.executor("lazy_ordered_map")?;
        let inputs: Vec<T> = inputs.into_iter().collect();
        let total = inputs.len();
        let task = Arc::new(task);
        let (result_tx, result_rx) = unbounded();

        for (index, input) in inputs.into_iter().enumerate() {
            let task = task.clone();
            let result_tx = result_tx.clone();
            executor.spawn(move || {
                let _ = result_tx.send((index, run_catching(task.as_ref(), index, input)));
            });
        }
        Ok(OrderedResults::new(result_rx, total))
    }

    /// Delegates to the ordered map; see the module docs for the gap.
    fn lazy_unordered_map<T, R, F, I>(&self, task: F, inputs: I) -> Result<UnorderedResults<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        Ok(UnorderedResults::input_ordered(
            self.lazy_ordered_map(task, inputs)?,
        ))
    }

    /// Overrides the drained-lazy default with rayon's native ordered bulk
    /// map, which already blocks until the whole batch completes.
    fn eager_map<T, R, F, I>(&self, task: F, inputs: I) -> Result<Vec<TaskOutcome<R>>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        let executor = self.executor("eager_map")?;
        let inputs: Vec<T> = inputs.into_iter().collect();
        Ok(executor.install(|| {
            inputs
                .into_par_iter()
                .enumerate()
                .map(|(index, input)| run_catching(&task, index, input))
                .collect()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_pool() -> RayonPool {
        RayonPool::new(&PoolConfig::with_workers(2)).unwrap()
    }

    #[test]
    fn test_eager_map_uses_native_ordered_primitive() {
        let mut pool = small_pool();
        let outcomes = pool.eager_map(|x: i32| x * x, vec![1, 2, 3, 4]).unwrap();
        let values: Vec<i32> = outcomes.into_iter().map(|o| o.unwrap()).collect();
        assert_eq!(values, vec![1, 4, 9, 16]);
        pool.terminate().unwrap();
    }

    #[test]
    fn test_lazy_ordered_map_reorders_spawned_outcomes() {
        let mut pool = small_pool();
        let values: Vec<u64> = pool
            .lazy_ordered_map(
                |x: u64| {
                    // Skew completion so later inputs finish first.
                    std::thread::sleep(std::time::Duration::from_millis(40 / x));
                    x * 10
                },
                vec![1, 2, 3, 4],
            )
            .unwrap()
            .map(|o| o.unwrap())
            .collect();
        assert_eq!(values, vec![10, 20, 30, 40]);
        pool.close().unwrap();
        pool.join().unwrap();
    }

    #[test]
    fn test_unordered_map_delegates_to_input_order() {
        let mut pool = small_pool();
        let values: Vec<i32> = pool
            .lazy_unordered_map(|x: i32| x + 1, vec![1, 2, 3])
            .unwrap()
            .map(|o| o.unwrap())
            .collect();
        assert_eq!(values, vec![2, 3, 4]);
        pool.terminate().unwrap();
    }

    #[test]
    fn test_submission_after_close_is_a_violation() {
        let mut pool = small_pool();
        pool.close().unwrap();
        let err = pool.eager_map(|x: i32| x, vec![1]).unwrap_err();
        assert!(matches!(
            err,
            PoolError::LifecycleViolation {
                state: LifecycleState::Closed,
                ..
            }
        ));
    }

    #[test]
    fn test_panicking_task_is_isolated() {
        let mut pool = small_pool();
        let outcomes = pool
            .eager_map(|x: i32| 1 / (x - 3), vec![1, 2, 3, 4])
            .unwrap();
        assert_eq!(outcomes.len(), 4);
        assert!(outcomes[2].is_err());
        assert_eq!(outcomes[3], Ok(1));
        pool.terminate().unwrap();
    }
}

//! Unified worker-pool abstraction.
//!
//! Two backends implement one capability set — the two lazy map primitives
//! plus the eager bulk map layered on top — and [`Pool`] dispatches over
//! them as enum variants, so backend selection is invisible past
//! construction. See [`crate::probe`] for how a backend is chosen.

mod channel;
#[cfg(feature = "rayon")]
mod executor;
mod lifecycle;
mod outcome;
mod results;
mod scope;

pub use channel::{ChannelPool, WorkerFactory};
#[cfg(feature = "rayon")]
pub use executor::RayonPool;
pub use lifecycle::LifecycleState;
pub use outcome::{TaskFailure, TaskOutcome};
pub use results::{OrderedResults, UnorderedResults};
pub use scope::{scoped, scoped_drained};

use crate::config::PoolConfig;
use crate::error::Result;
use crate::probe::{BackendKind, select_backend};

#[cfg(not(feature = "rayon"))]
use crate::error::PoolError;

/// The map capability set shared by every pool backend.
///
/// Tasks are plain closures; inputs move by value into the worker and
/// outcomes move back by value, so nothing is shared between the caller and
/// the workers beyond the channels the pool owns.
pub trait ParallelMap {
    /// Lazily map `task` over `inputs`, preserving input order.
    ///
    /// Submission happens up front; the returned sequence is consumed on
    /// demand and blocks only when the next in-order outcome is not ready
    /// yet. Single-pass.
    fn lazy_ordered_map<T, R, F, I>(&self, task: F, inputs: I) -> Result<OrderedResults<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
        I: IntoIterator<Item = T>;

    /// Lazily map `task` over `inputs` with no ordering guarantee.
    ///
    /// Blocks only until *some* outcome is ready. Which order outcomes
    /// arrive in is backend-dependent and deliberately unspecified.
    /// Single-pass.
    fn lazy_unordered_map<T, R, F, I>(&self, task: F, inputs: I) -> Result<UnorderedResults<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
        I: IntoIterator<Item = T>;

    /// Eagerly map `task` over `inputs`, blocking until the whole batch has
    /// completed and returning outcomes in input order.
    ///
    /// Bulk capability layered on the lazy ordered primitive; backends with
    /// a native bulk map override it.
    fn eager_map<T, R, F, I>(&self, task: F, inputs: I) -> Result<Vec<TaskOutcome<R>>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        Ok(self.lazy_ordered_map(task, inputs)?.collect())
    }
}

enum Backend {
    Channel(ChannelPool),
    #[cfg(feature = "rayon")]
    Rayon(RayonPool),
}

/// A worker pool over one of the interchangeable backends.
///
/// Construct with [`Pool::new`] (probe-selected backend) or
/// [`Pool::with_backend`] (explicit choice), or let the scope helpers in
/// [`scoped`]/[`scoped_drained`] manage the whole lifecycle.
///
/// Dropping a still-active pool forcibly terminates it; a pool can never
/// outlive its handle with workers left running.
pub struct Pool {
    kind: BackendKind,
    backend: Backend,
}

impl Pool {
    /// Construct a pool on the probe-selected backend.
    pub fn new(config: PoolConfig) -> Result<Self> {
        Self::with_backend(select_backend(), config)
    }

    /// Construct a pool on an explicitly chosen backend.
    pub fn with_backend(kind: BackendKind, config: PoolConfig) -> Result<Self> {
        let backend = match kind {
            BackendKind::Channel => Backend::Channel(ChannelPool::new(&config)?),
            #[cfg(feature = "rayon")]
            BackendKind::Rayon => Backend::Rayon(RayonPool::new(&config)?),
            #[cfg(not(feature = "rayon"))]
            BackendKind::Rayon => {
                return Err(PoolError::BackendUnavailable(
                    "this build does not carry the rayon backend".to_string(),
                ));
            }
        };
        Ok(Self { kind, backend })
    }

    /// Which backend this pool runs on; fixed at construction.
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn worker_count(&self) -> usize {
        match &self.backend {
            Backend::Channel(pool) => pool.worker_count(),
            #[cfg(feature = "rayon")]
            Backend::Rayon(pool) => pool.worker_count(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        match &self.backend {
            Backend::Channel(pool) => pool.state(),
            #[cfg(feature = "rayon")]
            Backend::Rayon(pool) => pool.state(),
        }
    }

    /// Forcibly stop the pool, abandoning queued work. No-op once terminal.
    pub fn terminate(&mut self) -> Result<()> {
        match &mut self.backend {
            Backend::Channel(pool) => pool.terminate(),
            #[cfg(feature = "rayon")]
            Backend::Rayon(pool) => pool.terminate(),
        }
    }

    /// Stop accepting submissions and let queued work finish. No-op once
    /// terminal.
    pub fn close(&mut self) -> Result<()> {
        match &mut self.backend {
            Backend::Channel(pool) => pool.close(),
            #[cfg(feature = "rayon")]
            Backend::Rayon(pool) => pool.close(),
        }
    }

    /// Block until every worker has exited. Requires a prior `close` or
    /// `terminate` on the channel backend; no-op on the rayon backend.
    pub fn join(&mut self) -> Result<()> {
        match &mut self.backend {
            Backend::Channel(pool) => pool.join(),
            #[cfg(feature = "rayon")]
            Backend::Rayon(pool) => pool.join(),
        }
    }
}

impl ParallelMap for Pool {
    fn lazy_ordered_map<T, R, F, I>(&self, task: F, inputs: I) -> Result<OrderedResults<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        match &self.backend {
            Backend::Channel(pool) => pool.lazy_ordered_map(task, inputs),
            #[cfg(feature = "rayon")]
            Backend::Rayon(pool) => pool.lazy_ordered_map(task, inputs),
        }
    }

    fn lazy_unordered_map<T, R, F, I>(&self, task: F, inputs: I) -> Result<UnorderedResults<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        match &self.backend {
            Backend::Channel(pool) => pool.lazy_unordered_map(task, inputs),
            #[cfg(feature = "rayon")]
            Backend::Rayon(pool) => pool.lazy_unordered_map(task, inputs),
        }
    }

    fn eager_map<T, R, F, I>(&self, task: F, inputs: I) -> Result<Vec<TaskOutcome<R>>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        match &self.backend {
            Backend::Channel(pool) => pool.eager_map(task, inputs),
            #[cfg(feature = "rayon")]
            Backend::Rayon(pool) => pool.eager_map(task, inputs),
        }
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        if !self.state().is_terminal() {
            tracing::warn!(
                backend = %self.kind,
                "pool dropped while active; terminating workers"
            );
            let _ = self.terminate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_selected_pool_round_trip() {
        let mut pool = Pool::new(PoolConfig::with_workers(2)).unwrap();
        assert_eq!(pool.kind(), select_backend());
        assert_eq!(pool.worker_count(), 2);
        assert_eq!(pool.state(), LifecycleState::Active);
        let outcomes = pool.eager_map(|x: i32| x - 1, vec![5, 6]).unwrap();
        assert_eq!(outcomes, vec![Ok(4), Ok(5)]);
        pool.terminate().unwrap();
        assert_eq!(pool.state(), LifecycleState::Terminated);
    }

    #[test]
    fn test_explicit_channel_backend() {
        let mut pool =
            Pool::with_backend(BackendKind::Channel, PoolConfig::with_workers(1)).unwrap();
        assert_eq!(pool.kind(), BackendKind::Channel);
        pool.close().unwrap();
        pool.join().unwrap();
        assert_eq!(pool.state(), LifecycleState::Closed);
    }

    #[test]
    fn test_empty_batch() {
        let mut pool = Pool::new(PoolConfig::with_workers(1)).unwrap();
        let outcomes = pool.eager_map(|x: i32| x, Vec::new()).unwrap();
        assert!(outcomes.is_empty());
        pool.terminate().unwrap();
    }

    #[test]
    fn test_drop_terminates_active_pool() {
        // Nothing to assert directly; the test passes by not hanging and
        // not leaking workers past the drop.
        let pool = Pool::new(PoolConfig::with_workers(2)).unwrap();
        let results = pool
            .lazy_ordered_map(|x: i32| x * 2, vec![1, 2, 3])
            .unwrap();
        drop(pool);
        // The iterator ends (possibly early) instead of blocking forever.
        assert!(results.count() <= 3);
    }
}

//! # Forkpool - Parallel task pools with fork-friendly workers
//!
//! A uniform parallel-task-execution abstraction over two interchangeable
//! worker-pool backends, built for workloads whose tasks need to spawn
//! child processes of their own.
//!
//! ## Features
//!
//! - **One interface, two backends**: a hand-rolled channel pool and a
//!   managed rayon executor behind the same map operations; selection
//!   happens once per process and is invisible to callers
//! - **Fork-friendly workers**: every worker is joinable and free to spawn
//!   child processes; no fire-and-forget daemon workers anywhere
//! - **Three map flavors**: eager ordered, lazy ordered, lazy unordered
//! - **Failure isolation**: a panicking task is recorded against its own
//!   outcome without aborting the batch or the pool
//! - **Leak-proof lifecycle**: scoped acquisition plus a drop backstop
//!   guarantee workers are torn down on every exit path
//!
//! ## Quick Start
//!
//! ```
//! use forkpool::{ParallelMap, PoolConfig, scoped};
//!
//! let outcomes = scoped(PoolConfig::default(), |pool| {
//!     pool.eager_map(|x: u64| x * x, vec![1, 2, 3, 4])
//! })??;
//!
//! let squares: Vec<u64> = outcomes.into_iter().map(|o| o.unwrap()).collect();
//! assert_eq!(squares, vec![1, 4, 9, 16]);
//! # Ok::<(), forkpool::PoolError>(())
//! ```
//!
//! Lazy consumption with per-outcome failure handling:
//!
//! ```
//! use forkpool::{ParallelMap, Pool, PoolConfig};
//!
//! let mut pool = Pool::new(PoolConfig::with_workers(2))?;
//! for outcome in pool.lazy_unordered_map(|x: i32| 100 / x, vec![5, 10, 20])? {
//!     match outcome {
//!         Ok(value) => println!("done: {value}"),
//!         Err(failure) => eprintln!("input {} failed: {failure}", failure.input_index),
//!     }
//! }
//! pool.close()?;
//! pool.join()?;
//! # Ok::<(), forkpool::PoolError>(())
//! ```

pub mod config;
pub mod error;
pub mod pool;
pub mod probe;

pub use config::PoolConfig;
pub use error::{PoolError, Result};
#[cfg(feature = "rayon")]
pub use pool::RayonPool;
pub use pool::{
    ChannelPool, LifecycleState, OrderedResults, ParallelMap, Pool, TaskFailure, TaskOutcome,
    UnorderedResults, WorkerFactory, scoped, scoped_drained,
};
pub use probe::{BackendKind, select_backend};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

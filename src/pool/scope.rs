//! Scoped pool acquisition.
//!
//! Acquire-use-release with the release guaranteed on every exit path: a
//! normal return runs the chosen teardown, and a panic unwinding out of the
//! caller's closure hits [`Pool`]'s `Drop`, which force-terminates a
//! still-active pool. A pool that leaks its workers past its scope is a
//! defect these helpers exist to rule out.

use crate::config::PoolConfig;
use crate::error::Result;
use crate::pool::Pool;

/// Run `body` with a freshly constructed pool, forcibly terminating it on
/// scope exit.
///
/// Queued work still pending when `body` returns is abandoned; use
/// [`scoped_drained`] when outstanding results must be honored.
///
/// ```
/// use forkpool::{ParallelMap, PoolConfig, scoped};
///
/// let squares = scoped(PoolConfig::with_workers(2), |pool| {
///     pool.eager_map(|x: i32| x * x, vec![1, 2, 3, 4])
/// })??;
/// assert_eq!(squares, vec![Ok(1), Ok(4), Ok(9), Ok(16)]);
/// # Ok::<(), forkpool::PoolError>(())
/// ```
pub fn scoped<O, F>(config: PoolConfig, body: F) -> Result<O>
where
    F: FnOnce(&Pool) -> O,
{
    let mut pool = Pool::new(config)?;
    let output = body(&pool);
    pool.terminate()?;
    Ok(output)
}

/// Run `body` with a freshly constructed pool, draining it gracefully on a
/// normal return.
///
/// Performs `close` + `join` after `body` returns, so every job submitted
/// inside the scope runs to completion before this function returns. If
/// `body` panics, the pool is terminated instead while the panic unwinds.
pub fn scoped_drained<O, F>(config: PoolConfig, body: F) -> Result<O>
where
    F: FnOnce(&Pool) -> O,
{
    let mut pool = Pool::new(config)?;
    let output = body(&pool);
    pool.close()?;
    pool.join()?;
    Ok(output)
}

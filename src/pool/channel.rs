//! Hand-rolled worker-thread pool over crossbeam channels.
//!
//! Workers are long-lived OS threads pulling type-erased jobs off a shared
//! MPMC channel, so one pool serves any number of map calls until it is torn
//! down. Every worker is spawned through [`WorkerFactory`], which only
//! produces joinable threads: workers are free to fork child processes of
//! their own, and the pool reaps every worker on teardown.

use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::pool::lifecycle::{LifecycleCell, LifecycleState};
use crate::pool::outcome::{TaskOutcome, run_catching};
use crate::pool::results::{OrderedResults, UnorderedResults};
use crate::pool::ParallelMap;
use crossbeam::channel::{Receiver, Sender, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Spawns pool workers with the configured name prefix and stack size.
///
/// Workers are always spawned joinable and their handles retained.
/// Fire-and-forget spawning (dropping the handle) is deliberately not
/// offered: a worker whose handle is kept can fork and reap child processes
/// of its own and is itself reaped when the pool is torn down.
pub struct WorkerFactory {
    name_prefix: String,
    stack_size: Option<usize>,
}

impl WorkerFactory {
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            name_prefix: config.worker_name_prefix.clone(),
            stack_size: config.worker_stack_size,
        }
    }

    /// Spawn worker `worker_id` running `run`, returning its join handle.
    pub fn spawn<F>(&self, worker_id: usize, run: F) -> Result<JoinHandle<()>>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut builder =
            thread::Builder::new().name(format!("{}-{}", self.name_prefix, worker_id));
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        Ok(builder.spawn(run)?)
    }
}

/// Worker pool built directly on OS threads and crossbeam channels.
///
/// Supports all three map operations natively, including true
/// completion-order delivery for the unordered map. Teardown comes in two
/// flavors: [`terminate`](ChannelPool::terminate) abandons queued work,
/// [`close`](ChannelPool::close) + [`join`](ChannelPool::join) drains it.
pub struct ChannelPool {
    state: LifecycleCell,
    workers: Vec<JoinHandle<()>>,
    job_tx: Option<Sender<Job>>,
    job_rx: Receiver<Job>,
    abandon: Arc<AtomicBool>,
    worker_count: usize,
}

impl ChannelPool {
    /// Construct the pool and spawn its workers.
    pub fn new(config: &PoolConfig) -> Result<Self> {
        let state = LifecycleCell::new();
        let worker_count = config.resolved_workers();
        let (job_tx, job_rx) = unbounded::<Job>();
        let abandon = Arc::new(AtomicBool::new(false));
        let factory = WorkerFactory::new(config);

        let mut workers = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let rx = job_rx.clone();
            let abandon = abandon.clone();
            workers.push(factory.spawn(worker_id, move || worker_loop(rx, abandon))?);
        }
        tracing::debug!(workers = worker_count, "channel pool workers spawned");

        let pool = Self {
            state,
            workers,
            job_tx: Some(job_tx),
            job_rx,
            abandon,
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

    fn submit(&self, operation: &'static str, job: Job) -> Result<()> {
        self.state.ensure_active(operation)?;
        let tx = self
            .job_tx
            .as_ref()
            .ok_or_else(|| PoolError::LifecycleViolation {
                operation,
                state: self.state.get(),
            })?;
        tx.send(job).map_err(|_| PoolError::LifecycleViolation {
            operation,
            state: self.state.get(),
        })
    }

    /// Submit one indexed job per input, routing outcomes to a fresh
    /// per-call result channel. Submission is eager; consumption is lazy.
    fn dispatch<T, R, F>(
        &self,
        operation: &'static str,
        task: F,
        inputs: Vec<T>,
    ) -> Result<(Receiver<(usize, TaskOutcome<R>)>, usize)>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        let total = inputs.len();
        let task = Arc::new(task);
        let (result_tx, result_rx) = unbounded();

        for (index, input) in inputs.into_iter().enumerate() {
            let task = task.clone();
            let result_tx = result_tx.clone();
            self.submit(
                operation,
                Box::new(move || {
                    // The consumer may have dropped its iterator early.
                    let _ = result_tx.send((index, run_catching(task.as_ref(), index, input)));
                }),
            )?;
        }
        Ok((result_rx, total))
    }

    /// Forcibly stop the pool, abandoning queued work.
    ///
    /// Jobs still in the queue are dropped un-run; a job a worker has
    /// already started finishes first (threads cannot be killed mid-task)
    /// but its outcome is discarded along with the per-call channel. Blocks
    /// until every worker has exited. No-op if already terminal.
    pub fn terminate(&mut self) -> Result<()> {
        if !self.state.finish(LifecycleState::Terminated) {
            return Ok(());
        }
        self.abandon.store(true, Ordering::SeqCst);
        while self.job_rx.try_recv().is_ok() {}
        self.job_tx.take();
        self.reap_workers();
        Ok(())
    }

    /// Stop accepting submissions; queued work keeps running.
    ///
    /// Follow with [`join`](ChannelPool::join) to block until every queued
    /// job has finished and every worker has exited. No-op if already
    /// terminal.
    pub fn close(&mut self) -> Result<()> {
        if !self.state.finish(LifecycleState::Closed) {
            return Ok(());
        }
        self.job_tx.take();
        Ok(())
    }

    /// Block until every worker thread has exited.
    ///
    /// Only valid after [`close`](ChannelPool::close) or
    /// [`terminate`](ChannelPool::terminate); joining an active pool would
    /// block forever since nothing has told the workers to stop.
    pub fn join(&mut self) -> Result<()> {
        if self.state.get() == LifecycleState::Active {
            return Err(PoolError::LifecycleViolation {
                operation: "join",
                state: LifecycleState::Active,
            });
        }
        self.reap_workers();
        Ok(())
    }

    fn reap_workers(&mut self) {
        for handle in self.workers.drain(..) {
            // Worker loops catch task panics, so a join error would mean the
            // loop itself panicked; nothing useful to do with it here.
            let _ = handle.join();
        }
    }
}

impl Drop for ChannelPool {
    fn drop(&mut self) {
        if !self.state.get().is_terminal() {
            tracing::warn!("channel pool dropped while active; terminating workers");
            let _ = self.terminate();
        } else {
            // close() without join() leaves handles behind; reap them now.
            self.reap_workers();
        }
    }
}

impl ParallelMap for ChannelPool {
    fn lazy_ordered_map<T, R, F, I>(&self, task: F, inputs: I) -> Result<OrderedResults<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        let inputs: Vec<T> = inputs.into_iter().collect();
        let (rx, total) = self.dispatch("lazy_ordered_map", task, inputs)?;
        Ok(OrderedResults::new(rx, total))
    }

    fn lazy_unordered_map<T, R, F, I>(&self, task: F, inputs: I) -> Result<UnorderedResults<R>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> R + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        let inputs: Vec<T> = inputs.into_iter().collect();
        let (rx, total) = self.dispatch("lazy_unordered_map", task, inputs)?;
        Ok(UnorderedResults::by_arrival(rx, total))
    }
}

fn worker_loop(rx: Receiver<Job>, abandon: Arc<AtomicBool>) {
    while let Ok(job) = rx.recv() {
        // Jobs received after termination began are dropped un-run.
        if abandon.load(Ordering::SeqCst) {
            continue;
        }
        job();
    }
}

//! Fixed-size pool of worker threads consuming the handoff channel.
//!
//! Each worker owns a single-threaded tokio runtime and loops on a blocking
//! receive. A worker exits only after it observes [`Handoff::Closed`], which
//! the channel reports once the dispatcher has closed it and every buffered
//! task has been taken, so closing never strands queued work.
//!
//! # Design Principles
//!
//! - **No polling**: workers block on the channel until work or closure
//! - **Exactly once**: a task leaves the channel into a single worker
//! - **Panic isolation**: an executor panic fails one task, not the worker

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};

use super::error::SchedulerError;
use super::executor::{TaskExecutor, WorkerContext};
use super::handoff::{Handoff, HandoffReceiver};

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,
    /// Tasks currently executing.
    pub active_tasks: u64,
    /// Tasks whose executor returned normally.
    pub executed_tasks: u64,
    /// Tasks whose executor panicked.
    pub failed_tasks: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_tasks: AtomicU64,
    pub executed_tasks: AtomicU64,
    pub failed_tasks: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            active_tasks: self.active_tasks.load(Ordering::Relaxed),
            executed_tasks: self.executed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.failed_tasks.load(Ordering::Relaxed),
        }
    }
}

/// Running set of worker threads.
#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
    counters: Arc<PoolCounters>,
}

impl WorkerPool {
    /// Start `worker_count` threads reading from `rx`.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::WorkerSpawn`] if a thread cannot be created.
    /// Workers already started keep their receiver and exit once the sender
    /// side is dropped.
    pub fn spawn<E>(
        worker_count: usize,
        stack_size: usize,
        rx: &HandoffReceiver,
        executor: &E,
    ) -> Result<Self, SchedulerError>
    where
        E: TaskExecutor,
    {
        let counters = Arc::new(PoolCounters::default());
        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let worker = spawn_worker(
                worker_id,
                rx.clone(),
                Arc::clone(&counters),
                executor.clone(),
                stack_size,
            )?;
            workers.push(worker);
        }

        info!(worker_count = worker_count, "Worker pool started");

        Ok(Self { workers, counters })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.workers.len())
    }

    /// Wait for every worker to observe closure and exit.
    ///
    /// Blocks until the channel has been closed and drained.
    pub fn join(self) -> PoolStats {
        let worker_count = self.workers.len();
        for (idx, worker) in self.workers.into_iter().enumerate() {
            if worker.join().is_err() {
                warn!(worker_id = idx, "Worker thread panicked outside executor");
            } else {
                debug!(worker_id = idx, "Worker joined");
            }
        }
        let stats = self.counters.snapshot(worker_count);
        info!(
            worker_count = worker_count,
            executed = stats.executed_tasks,
            failed = stats.failed_tasks,
            "Worker pool shut down"
        );
        stats
    }
}

fn build_runtime() -> std::io::Result<Runtime> {
    tokio::runtime::Builder::new_current_thread().enable_time().build()
}

/// Spawn a worker thread.
fn spawn_worker<E>(
    worker_id: usize,
    rx: HandoffReceiver,
    counters: Arc<PoolCounters>,
    executor: E,
    stack_size: usize,
) -> Result<JoinHandle<()>, SchedulerError>
where
    E: TaskExecutor,
{
    let handle = thread::Builder::new()
        .name(format!("as-worker-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || {
            debug!(worker_id = worker_id, "Worker thread started");

            let mut rt = match build_runtime() {
                Ok(rt) => rt,
                Err(e) => {
                    error!(worker_id = worker_id, error = %e, "Failed to create worker runtime");
                    return;
                }
            };
            let ctx = WorkerContext { worker_id };

            loop {
                let task = match rx.recv() {
                    Handoff::Task(task) => task,
                    Handoff::Closed => {
                        debug!(worker_id = worker_id, "Handoff closed and drained, exiting");
                        break;
                    }
                };

                let seq = task.seq();
                debug!(
                    worker_id = worker_id,
                    seq = seq,
                    name = task.name(),
                    "Worker executing task"
                );

                counters.active_tasks.fetch_add(1, Ordering::Relaxed);
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                    rt.block_on(executor.execute(task, ctx));
                }));
                counters.active_tasks.fetch_sub(1, Ordering::Relaxed);

                if outcome.is_ok() {
                    counters.executed_tasks.fetch_add(1, Ordering::Relaxed);
                    debug!(worker_id = worker_id, seq = seq, "Worker completed task");
                    continue;
                }

                counters.failed_tasks.fetch_add(1, Ordering::Relaxed);
                warn!(worker_id = worker_id, seq = seq, "Executor panicked; task failed");
                // The runtime may be mid-poll after unwinding; start fresh.
                rt = match build_runtime() {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!(worker_id = worker_id, error = %e, "Failed to rebuild worker runtime");
                        break;
                    }
                };
            }

            debug!(worker_id = worker_id, "Worker thread exiting");
        })?;
    Ok(handle)
}

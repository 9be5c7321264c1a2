//! Task execution trait and the simulated-work executor.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::task::Task;
use crate::util::clock::SharedClock;

/// Identity of the worker running a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerContext {
    /// Zero-based worker index within the pool.
    pub worker_id: usize,
}

/// Runs a dispatched task.
///
/// Execution is opaque to the scheduler: failures are the executor's to
/// handle. A panic is caught by the worker and counted as a failed task.
///
/// # Threading
///
/// Called from a dedicated worker thread driving its own current-thread
/// tokio runtime, so long or blocking work here only occupies that worker.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use prometheus_aging_scheduler::core::{Task, TaskExecutor, WorkerContext};
///
/// #[derive(Clone)]
/// struct PrintExecutor;
///
/// #[async_trait]
/// impl TaskExecutor for PrintExecutor {
///     async fn execute(&self, task: Task, ctx: WorkerContext) {
///         println!("#{} executing {}", ctx.worker_id, task.name());
///     }
/// }
/// ```
#[async_trait]
pub trait TaskExecutor: Send + Sync + Clone + 'static {
    /// Execute one task.
    async fn execute(&self, task: Task, ctx: WorkerContext);
}

/// Stand-in for real work: holds the worker for a fixed duration measured on
/// the injected clock.
///
/// [`Clock::sleep`](crate::util::Clock::sleep) is synchronous, so with a
/// system clock this blocks the worker thread and its current-thread runtime
/// for the whole duration, exactly like CPU-bound work would.
#[derive(Debug, Clone)]
pub struct SimulatedWork {
    clock: SharedClock,
    duration: Duration,
}

impl SimulatedWork {
    /// Each task takes `duration` on `clock`.
    #[must_use]
    pub fn new(clock: SharedClock, duration: Duration) -> Self {
        Self { clock, duration }
    }

    /// Time each task takes.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}

#[async_trait]
impl TaskExecutor for SimulatedWork {
    async fn execute(&self, task: Task, ctx: WorkerContext) {
        debug!(
            worker_id = ctx.worker_id,
            name = task.name(),
            duration_ms = u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX),
            "Simulating work"
        );
        self.clock.sleep(self.duration);
    }
}

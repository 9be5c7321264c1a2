//! Scheduler facade: submission and the blocking run entry point.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, info_span, warn};
use uuid::Uuid;

use super::dispatcher::Dispatcher;
use super::error::SchedulerError;
use super::executor::TaskExecutor;
use super::handoff;
use super::shutdown::ShutdownSignal;
use super::store::PriorityStore;
use super::task::{Priority, Task};
use super::worker_pool::WorkerPool;
use crate::config::SchedulerConfig;
use crate::util::clock::SharedClock;

/// Summary of one [`Scheduler::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Identifier recorded on the run's tracing span.
    pub run_id: Uuid,
    /// Dispatch rounds performed.
    pub rounds: u64,
    /// Tasks handed to workers.
    pub dispatched: u64,
    /// Tasks whose executor returned normally.
    pub executed: u64,
    /// Tasks whose executor panicked.
    pub failed: u64,
    /// Tasks still pending when the run ended (submitted after the close).
    pub remaining: usize,
    /// Run duration on the scheduler's clock.
    pub elapsed: Duration,
}

/// Priority-aging scheduler.
///
/// Producers call [`submit`](Self::submit) from any thread; one thread calls
/// [`run`](Self::run), which dispatches on the calling thread and executes on
/// a pool of worker threads until all submitted work is done.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use std::time::Duration;
/// use prometheus_aging_scheduler::config::SchedulerConfig;
/// use prometheus_aging_scheduler::core::{Scheduler, SimulatedWork};
/// use prometheus_aging_scheduler::util::SystemClock;
///
/// let clock = Arc::new(SystemClock);
/// let work = SimulatedWork::new(clock.clone(), Duration::from_millis(50));
/// let scheduler = Scheduler::new(SchedulerConfig::new(), work, clock)?;
/// scheduler.submit(10, "index");
/// scheduler.submit(50, "reply");
/// let report = scheduler.run()?;
/// assert_eq!(report.executed, 2);
/// ```
pub struct Scheduler<E: TaskExecutor> {
    config: SchedulerConfig,
    store: Arc<PriorityStore>,
    clock: SharedClock,
    shutdown: ShutdownSignal,
    executor: E,
}

impl<E: TaskExecutor> Scheduler<E> {
    /// Create a scheduler with an empty store.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: SchedulerConfig, executor: E, clock: SharedClock) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        let store = Arc::new(PriorityStore::new(config.aging_policy()));
        Ok(Self {
            config,
            store,
            clock,
            shutdown: ShutdownSignal::new(),
            executor,
        })
    }

    /// Submit work stamped with the current time. Always accepted.
    pub fn submit(&self, priority: Priority, name: impl Into<String>) {
        self.store.add(Task::new(priority, name, self.clock.now()));
    }

    /// Submit unless the shutdown signal has been triggered.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::ShuttingDown`] after [`ShutdownSignal::trigger`].
    pub fn try_submit(&self, priority: Priority, name: impl Into<String>) -> Result<(), SchedulerError> {
        if self.shutdown.is_triggered() {
            return Err(SchedulerError::ShuttingDown);
        }
        self.submit(priority, name);
        Ok(())
    }

    /// Submit a pre-built task, e.g. one with a backdated submission time.
    pub fn submit_task(&self, task: Task) {
        self.store.add(task);
    }

    /// Tasks waiting for dispatch.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.store.pending_count()
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<PriorityStore> {
        &self.store
    }

    /// Handle producers trigger once they are done submitting.
    #[must_use]
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Start the workers, dispatch until the stop condition holds, and wait
    /// for every worker to finish.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::WorkerSpawn`] if a worker thread cannot start
    /// - [`SchedulerError::WorkersUnavailable`] if all workers died with
    ///   tasks still to deliver
    pub fn run(&self) -> Result<RunReport, SchedulerError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("scheduler_run", run_id = %run_id);
        let _enter = span.enter();
        let started = self.clock.now();
        let worker_count = self.config.resolved_worker_count();

        info!(
            pending = self.store.pending_count(),
            worker_count = worker_count,
            batch_size = self.config.batch_size,
            channel_capacity = self.config.channel_capacity,
            "Scheduler run starting"
        );

        let (tx, rx) = handoff::channel(self.config.channel_capacity);
        let pool = WorkerPool::spawn(
            worker_count,
            self.config.worker_stack_size,
            &rx,
            &self.executor,
        )?;
        // Only workers hold receivers, so losing them all surfaces as a send error.
        drop(rx);

        let dispatcher = Dispatcher::new(
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            self.shutdown.clone(),
            self.config.dispatch_settings(),
        );
        let dispatched = dispatcher.run(tx);
        let stats = pool.join();
        let dispatch = dispatched?;

        let remaining = self.store.pending_count();
        if remaining > 0 {
            warn!(remaining = remaining, "Tasks submitted after the handoff closed");
        }

        let report = RunReport {
            run_id,
            rounds: dispatch.rounds,
            dispatched: dispatch.dispatched,
            executed: stats.executed_tasks,
            failed: stats.failed_tasks,
            remaining,
            elapsed: self.clock.now().saturating_duration_since(started),
        };
        info!(
            rounds = report.rounds,
            dispatched = report.dispatched,
            executed = report.executed,
            failed = report.failed,
            "Scheduler run complete"
        );
        Ok(report)
    }
}

impl<E: TaskExecutor> std::fmt::Debug for Scheduler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("pending", &self.store.pending_count())
            .field("shutdown", &self.shutdown.is_triggered())
            .finish_non_exhaustive()
    }
}

//! Dispatch loop: ranks, extracts and hands off tasks in rounds.
//!
//! Each round extracts the current top-N from the store and writes them to
//! the handoff channel in ranked order before the next extraction. The store
//! lock is never held while writing, so a full channel slows extraction but
//! never blocks producers.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::error::SchedulerError;
use super::handoff::{HandoffSender, Undelivered};
use super::shutdown::ShutdownSignal;
use super::store::PriorityStore;
use crate::util::clock::SharedClock;

/// When the dispatcher closes the handoff channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchMode {
    /// Close as soon as a round finds the store empty.
    #[default]
    DrainOnEmpty,
    /// Keep polling an empty store until the shutdown signal is triggered,
    /// then close once the store is empty.
    UntilShutdown,
}

/// Per-run dispatcher parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Maximum tasks extracted per round.
    pub batch_size: usize,
    /// Pause between rounds.
    pub round_interval: Duration,
    /// Limit each round to the channel's free slots (at least one).
    pub clamp_to_capacity: bool,
    /// Stop condition.
    pub mode: DispatchMode,
}

/// Outcome of a dispatcher run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Extraction rounds performed, including the final empty one.
    pub rounds: u64,
    /// Tasks written to the handoff channel.
    pub dispatched: u64,
}

/// Drives the store into the handoff channel.
pub struct Dispatcher {
    store: Arc<PriorityStore>,
    clock: SharedClock,
    shutdown: ShutdownSignal,
    settings: DispatchSettings,
}

impl Dispatcher {
    /// Create a dispatcher over `store`.
    #[must_use]
    pub fn new(
        store: Arc<PriorityStore>,
        clock: SharedClock,
        shutdown: ShutdownSignal,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            store,
            clock,
            shutdown,
            settings,
        }
    }

    /// Run rounds until the stop condition holds, then close `tx`.
    ///
    /// Taking the sender by value makes this the only writer and guarantees
    /// the channel is closed exactly once, on every return path.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::WorkersUnavailable`] if every receiver is gone while
    /// extracted tasks are still waiting to be written. Those tasks, and any
    /// left in the channel buffer, are restored to the store first.
    pub fn run(&self, tx: HandoffSender) -> Result<DispatchReport, SchedulerError> {
        let mut report = DispatchReport::default();
        let policy = self.store.policy();

        loop {
            let limit = self.batch_limit(&tx);
            let now = self.clock.now();
            debug!(
                pending = self.store.pending_count(),
                limit = limit,
                "Dispatch round"
            );
            let batch = self.store.extract_top(limit, now);
            report.rounds += 1;

            if batch.is_empty() {
                if self.should_stop() {
                    break;
                }
            } else {
                let mut batch = batch.into_iter();
                while let Some(task) = batch.next() {
                    debug!(
                        seq = task.seq(),
                        name = task.name(),
                        effective_priority = task.effective_priority(now, policy),
                        "Dispatching task"
                    );
                    if let Err(Undelivered(task)) = tx.send(task) {
                        // Unsent and still-buffered tasks go back to the store.
                        let returned = std::iter::once(task)
                            .chain(batch)
                            .chain(tx.reclaim_stranded());
                        let undelivered = self.store.restore(returned);
                        error!(
                            undelivered = undelivered,
                            pending = self.store.pending_count(),
                            "No workers left to receive tasks"
                        );
                        return Err(SchedulerError::WorkersUnavailable { undelivered });
                    }
                    report.dispatched += 1;
                }
                debug!(left = self.store.pending_count(), "Round complete");
            }

            self.clock.sleep(self.settings.round_interval);
        }

        tx.close();
        info!(
            rounds = report.rounds,
            dispatched = report.dispatched,
            "Dispatcher finished, handoff closed"
        );
        Ok(report)
    }

    fn batch_limit(&self, tx: &HandoffSender) -> usize {
        // One task minimum: a zero batch would never drain the store, and a
        // full channel should block the send instead of spinning empty rounds.
        let batch_size = self.settings.batch_size.max(1);
        if self.settings.clamp_to_capacity {
            batch_size.min(tx.free_slots().max(1))
        } else {
            batch_size
        }
    }

    fn should_stop(&self) -> bool {
        match self.settings.mode {
            DispatchMode::DrainOnEmpty => self.store.is_empty(),
            // Signal first: adds that happened before the trigger are then
            // visible in the pending count.
            DispatchMode::UntilShutdown => self.shutdown.is_triggered() && self.store.is_empty(),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("settings", &self.settings)
            .field("pending", &self.store.pending_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aging::AgingPolicy;
    use crate::core::handoff::{self, Handoff};
    use crate::core::Task;
    use crate::util::clock::{Clock, ManualClock};
    use std::thread;

    fn settings(batch_size: usize, clamp: bool, mode: DispatchMode) -> DispatchSettings {
        DispatchSettings {
            batch_size,
            round_interval: Duration::from_millis(100),
            clamp_to_capacity: clamp,
            mode,
        }
    }

    fn drain(rx: &handoff::HandoffReceiver) -> Vec<String> {
        let mut names = Vec::new();
        while let Handoff::Task(task) = rx.recv() {
            names.push(task.name().to_string());
        }
        names
    }

    #[test]
    fn test_rounds_preserve_rank_order() {
        let clock = ManualClock::new();
        let store = Arc::new(PriorityStore::new(AgingPolicy::per_second(5)));
        let now = clock.now();
        for (priority, name) in [(10, "a"), (50, "b"), (10, "c"), (30, "d")] {
            store.add(Task::new(priority, name, now));
        }

        let (tx, rx) = handoff::channel(10);
        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            Arc::new(clock.clone()),
            ShutdownSignal::new(),
            settings(2, false, DispatchMode::DrainOnEmpty),
        );
        let report = dispatcher.run(tx).unwrap();

        assert_eq!(drain(&rx), vec!["b", "d", "a", "c"]);
        assert_eq!(report.dispatched, 4);
        assert_eq!(report.rounds, 3);
        // two non-final rounds slept 100ms each on the manual clock
        assert_eq!(clock.elapsed(), Duration::from_millis(200));
    }

    #[test]
    fn test_empty_store_closes_immediately() {
        let store = Arc::new(PriorityStore::default());
        let (tx, rx) = handoff::channel(1);
        let dispatcher = Dispatcher::new(
            store,
            Arc::new(ManualClock::new()),
            ShutdownSignal::new(),
            settings(3, true, DispatchMode::DrainOnEmpty),
        );
        let report = dispatcher.run(tx).unwrap();
        assert_eq!(report, DispatchReport { rounds: 1, dispatched: 0 });
        assert_eq!(rx.recv(), Handoff::Closed);
    }

    #[test]
    fn test_clamp_limits_batch_to_free_slots() {
        let store = Arc::new(PriorityStore::default());
        let (tx, _rx) = handoff::channel(4);
        tx.send(Task::new(0, "filler", std::time::Instant::now())).unwrap();
        tx.send(Task::new(0, "filler", std::time::Instant::now())).unwrap();
        tx.send(Task::new(0, "filler", std::time::Instant::now())).unwrap();

        let clamped = Dispatcher::new(
            Arc::clone(&store),
            Arc::new(ManualClock::new()),
            ShutdownSignal::new(),
            settings(3, true, DispatchMode::DrainOnEmpty),
        );
        assert_eq!(clamped.batch_limit(&tx), 1);

        let unclamped = Dispatcher::new(
            store,
            Arc::new(ManualClock::new()),
            ShutdownSignal::new(),
            settings(3, false, DispatchMode::DrainOnEmpty),
        );
        assert_eq!(unclamped.batch_limit(&tx), 3);
    }

    #[test]
    fn test_missing_workers_reported() {
        let store = Arc::new(PriorityStore::default());
        for i in 0..3 {
            store.add(Task::new(i, format!("t{i}"), std::time::Instant::now()));
        }
        let (tx, rx) = handoff::channel(3);
        drop(rx);
        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            Arc::new(ManualClock::new()),
            ShutdownSignal::new(),
            settings(3, false, DispatchMode::DrainOnEmpty),
        );
        let err = dispatcher.run(tx).unwrap_err();
        assert!(matches!(err, SchedulerError::WorkersUnavailable { undelivered: 3 }));
        assert_eq!(store.pending_count(), 3);
    }

    #[test]
    fn test_lost_workers_return_buffered_tasks_to_store() {
        let clock = ManualClock::new();
        let store = Arc::new(PriorityStore::default());
        let (tx, rx) = handoff::channel(4);
        tx.send(Task::new(9, "buffered", clock.now())).unwrap();
        drop(rx);
        for i in 0..3 {
            store.add(Task::new(i, format!("t{i}"), clock.now()));
        }

        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            Arc::new(clock.clone()),
            ShutdownSignal::new(),
            settings(2, true, DispatchMode::DrainOnEmpty),
        );
        let err = dispatcher.run(tx).unwrap_err();

        assert!(matches!(err, SchedulerError::WorkersUnavailable { undelivered: 3 }));
        assert_eq!(store.pending_count(), 4);
        let mut names: Vec<String> = store
            .extract_top(10, clock.now())
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["buffered", "t0", "t1", "t2"]);
    }

    #[test]
    fn test_zero_batch_still_drains() {
        let store = Arc::new(PriorityStore::default());
        store.add(Task::new(1, "only", std::time::Instant::now()));
        let (tx, rx) = handoff::channel(2);
        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            Arc::new(ManualClock::new()),
            ShutdownSignal::new(),
            settings(0, false, DispatchMode::DrainOnEmpty),
        );
        assert_eq!(dispatcher.batch_limit(&tx), 1);

        let report = dispatcher.run(tx).unwrap();
        assert_eq!(report.dispatched, 1);
        assert!(store.is_empty());
        assert_eq!(drain(&rx), vec!["only"]);
    }

    #[test]
    fn test_until_shutdown_waits_for_signal() {
        let store = Arc::new(PriorityStore::default());
        let shutdown = ShutdownSignal::new();
        let (tx, rx) = handoff::channel(4);
        let dispatcher = Dispatcher::new(
            Arc::clone(&store),
            Arc::new(ManualClock::new()),
            shutdown.clone(),
            settings(2, true, DispatchMode::UntilShutdown),
        );
        let runner = thread::spawn(move || dispatcher.run(tx));

        // The store starts empty; the dispatcher must keep polling.
        thread::sleep(Duration::from_millis(20));
        assert!(!runner.is_finished());

        store.add(Task::new(1, "late", std::time::Instant::now()));
        shutdown.trigger();

        let report = runner.join().unwrap().unwrap();
        assert_eq!(report.dispatched, 1);
        assert_eq!(drain(&rx), vec!["late"]);
    }
}

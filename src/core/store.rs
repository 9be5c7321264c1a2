//! Pending-task store with aging-aware batched extraction.
//!
//! Priorities change while tasks wait, so the store keeps an unordered `Vec`
//! and re-ranks the whole set on every extraction instead of maintaining a
//! heap whose keys would go stale. Extraction is O(P log P) in the pending
//! count P.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use tracing::debug;

use super::aging::AgingPolicy;
use super::task::Task;

/// Mutex-guarded collection of pending tasks.
///
/// All mutation happens under one lock. The pending count is mirrored in an
/// atomic so [`PriorityStore::pending_count`] never contends with producers.
#[derive(Debug)]
pub struct PriorityStore {
    policy: AgingPolicy,
    tasks: Mutex<Vec<Task>>,
    pending: AtomicUsize,
    next_seq: AtomicU64,
}

impl PriorityStore {
    /// Create an empty store ranking with `policy`.
    #[must_use]
    pub fn new(policy: AgingPolicy) -> Self {
        Self {
            policy,
            tasks: Mutex::new(Vec::new()),
            pending: AtomicUsize::new(0),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Aging policy used for ranking.
    #[must_use]
    pub const fn policy(&self) -> AgingPolicy {
        self.policy
    }

    /// Add a task. Never fails.
    ///
    /// The task is stamped with the next submission sequence number, which
    /// breaks ties between tasks submitted at the same instant.
    pub fn add(&self, task: Task) {
        let mut tasks = self.tasks.lock();
        // Sequence is taken under the lock so it matches insertion order.
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let task = task.with_seq(seq);
        debug!(
            seq = seq,
            name = task.name(),
            priority = task.priority(),
            "Task added"
        );
        tasks.push(task);
        self.pending.store(tasks.len(), Ordering::Release);
    }

    /// Put back tasks that were extracted but never handed off.
    ///
    /// Sequence numbers and submission times are kept, so restored tasks
    /// rank exactly as they did before extraction.
    pub(crate) fn restore(&self, returned: impl IntoIterator<Item = Task>) -> usize {
        let mut tasks = self.tasks.lock();
        let before = tasks.len();
        tasks.extend(returned);
        let restored = tasks.len() - before;
        self.pending.store(tasks.len(), Ordering::Release);
        debug!(restored = restored, "Tasks returned to store");
        restored
    }

    /// Remove and return up to `n` tasks with the highest effective priority
    /// as of `now`, best first.
    ///
    /// Equal effective priorities are ordered by submission time, then by
    /// submission sequence. An empty store yields an empty `Vec`.
    pub fn extract_top(&self, n: usize, now: Instant) -> Vec<Task> {
        let mut tasks = self.tasks.lock();
        if n == 0 || tasks.is_empty() {
            return Vec::new();
        }

        let policy = self.policy;
        tasks.sort_by_cached_key(|task| task.rank_key(now, policy));

        let take = n.min(tasks.len());
        let rest = tasks.split_off(take);
        let batch = std::mem::replace(&mut *tasks, rest);
        self.pending.store(tasks.len(), Ordering::Release);
        batch
    }

    /// Number of pending tasks. May be stale as soon as it returns.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Whether no tasks are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending_count() == 0
    }

    /// Total tasks ever added.
    #[must_use]
    pub fn total_added(&self) -> u64 {
        self.next_seq.load(Ordering::Relaxed)
    }
}

impl Default for PriorityStore {
    fn default() -> Self {
        Self::new(AgingPolicy::default())
    }
}

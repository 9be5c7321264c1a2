//! The unit of work held by the scheduler.

use std::cmp::{Ordering, Reverse};
use std::time::Instant;

use super::aging::AgingPolicy;

/// Signed base priority. Negative values are legal; aging compensates.
pub type Priority = i64;

/// Immutable work descriptor.
///
/// Tasks are moved into the store and moved back out on extraction; nothing
/// outside the store holds a reference to a pending task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    priority: Priority,
    name: String,
    submitted_at: Instant,
    seq: u64,
}

impl Task {
    /// Create a task stamped with `submitted_at`.
    ///
    /// The submission sequence is assigned when the task enters a
    /// [`PriorityStore`](super::PriorityStore).
    pub fn new(priority: Priority, name: impl Into<String>, submitted_at: Instant) -> Self {
        Self {
            priority,
            name: name.into(),
            submitted_at,
            seq: 0,
        }
    }

    /// Base priority supplied at submission.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Caller-supplied name; not guaranteed unique.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Submission timestamp.
    #[must_use]
    pub const fn submitted_at(&self) -> Instant {
        self.submitted_at
    }

    /// Position in submission order within the owning store.
    #[must_use]
    pub const fn seq(&self) -> u64 {
        self.seq
    }

    pub(crate) fn with_seq(mut self, seq: u64) -> Self {
        self.seq = seq;
        self
    }

    /// Priority adjusted for time spent waiting as of `now`.
    #[must_use]
    pub fn effective_priority(&self, now: Instant, policy: AgingPolicy) -> Priority {
        policy.effective_priority(self.priority, self.submitted_at, now)
    }

    /// Dispatch order between two tasks at the same instant.
    ///
    /// Higher effective priority first, then earlier submission time, then
    /// lower sequence number. `Less` means `self` is dispatched first.
    #[must_use]
    pub fn rank_cmp(&self, other: &Self, now: Instant, policy: AgingPolicy) -> Ordering {
        self.rank_key(now, policy).cmp(&other.rank_key(now, policy))
    }

    /// Sort key whose ascending order is dispatch order.
    pub(crate) fn rank_key(&self, now: Instant, policy: AgingPolicy) -> RankKey {
        (
            Reverse(self.effective_priority(now, policy)),
            self.submitted_at,
            self.seq,
        )
    }
}

pub(crate) type RankKey = (Reverse<Priority>, Instant, u64);

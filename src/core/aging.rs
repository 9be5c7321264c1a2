//! Effective-priority formula.
//!
//! `effective = priority + factor * floor(waited / unit)`, computed with
//! saturating arithmetic. A waiting task never loses rank over time, and any
//! task eventually outranks a fixed competitor when `factor > 0`.

use std::time::{Duration, Instant};

use super::task::Priority;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// How fast waiting tasks gain priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgingPolicy {
    factor: u32,
    unit: Duration,
}

impl AgingPolicy {
    /// `factor` priority units gained per full `unit` of waiting.
    ///
    /// A zero `unit` is treated as one nanosecond.
    #[must_use]
    pub fn new(factor: u32, unit: Duration) -> Self {
        Self {
            factor,
            unit: unit.max(Duration::from_nanos(1)),
        }
    }

    /// `factor` priority units gained per second of waiting.
    #[must_use]
    pub fn per_second(factor: u32) -> Self {
        Self::new(factor, Duration::from_secs(1))
    }

    /// Priority units gained per unit.
    #[must_use]
    pub const fn factor(&self) -> u32 {
        self.factor
    }

    /// Length of one aging unit.
    #[must_use]
    pub const fn unit(&self) -> Duration {
        self.unit
    }

    /// Whole aging units elapsed between `submitted_at` and `now`.
    ///
    /// Zero when `now` precedes `submitted_at`.
    #[must_use]
    pub fn waited_units(&self, submitted_at: Instant, now: Instant) -> i64 {
        let waited = now.saturating_duration_since(submitted_at).as_nanos();
        i64::try_from(waited / self.unit.as_nanos()).unwrap_or(i64::MAX)
    }

    /// Base priority plus the aging bonus accrued by `now`.
    #[must_use]
    pub fn effective_priority(&self, priority: Priority, submitted_at: Instant, now: Instant) -> Priority {
        let bonus = i64::from(self.factor).saturating_mul(self.waited_units(submitted_at, now));
        priority.saturating_add(bonus)
    }

    /// Waiting time after which a task with base `priority` reaches `ceiling`.
    ///
    /// `None` when the task can never get there (zero factor) or the wait does
    /// not fit in a [`Duration`].
    #[must_use]
    pub fn time_to_reach(&self, priority: Priority, ceiling: Priority) -> Option<Duration> {
        if priority >= ceiling {
            return Some(Duration::ZERO);
        }
        if self.factor == 0 {
            return None;
        }
        let gap = u128::try_from(i128::from(ceiling) - i128::from(priority)).ok()?;
        let units = gap.div_ceil(u128::from(self.factor));
        let nanos = units.checked_mul(self.unit.as_nanos())?;
        let secs = u64::try_from(nanos / NANOS_PER_SEC).ok()?;
        let subsec = u32::try_from(nanos % NANOS_PER_SEC).ok()?;
        Some(Duration::new(secs, subsec))
    }
}

impl Default for AgingPolicy {
    fn default() -> Self {
        Self::per_second(5)
    }
}

//! Builder to construct a scheduler from configuration.

use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::core::{Scheduler, SchedulerError, TaskExecutor};
use crate::util::clock::{SharedClock, SystemClock};

/// Assembles a [`Scheduler`] from an executor, configuration and clock.
///
/// Unset pieces fall back to [`SchedulerConfig::default`] and [`SystemClock`].
#[derive(Debug)]
pub struct SchedulerBuilder<E> {
    executor: E,
    config: SchedulerConfig,
    clock: Option<SharedClock>,
}

impl<E: TaskExecutor> SchedulerBuilder<E> {
    /// Start a builder around `executor`.
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            config: SchedulerConfig::default(),
            clock: None,
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Adjust the configuration in place.
    #[must_use]
    pub fn configure(mut self, f: impl FnOnce(SchedulerConfig) -> SchedulerConfig) -> Self {
        self.config = f(self.config);
        self
    }

    /// Use `clock` for timestamps and round cadence.
    #[must_use]
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Configuration the scheduler will be built with.
    #[must_use]
    pub const fn config_ref(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Validate and build.
    ///
    /// # Errors
    ///
    /// [`SchedulerError::InvalidConfig`] if the configuration is invalid.
    pub fn build(self) -> Result<Scheduler<E>, SchedulerError> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        Scheduler::new(self.config, self.executor, clock)
    }
}

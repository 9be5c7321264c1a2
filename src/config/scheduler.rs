//! Scheduler configuration.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::aging::AgingPolicy;
use crate::core::dispatcher::{DispatchMode, DispatchSettings};

/// Prefix of environment variables read by [`SchedulerConfig::from_env`].
pub const ENV_PREFIX: &str = "AGING_SCHEDULER_";

/// Scheduler configuration.
///
/// Defaults: aging factor 5 per second, batches of 3, a 10-slot handoff
/// channel, 4 workers and 100 ms between rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Priority units gained per aging unit waited.
    pub aging_factor: u32,
    /// Length of one aging unit in milliseconds.
    pub aging_unit_ms: u64,
    /// Maximum tasks extracted per round (N).
    pub batch_size: usize,
    /// Handoff channel capacity.
    pub channel_capacity: usize,
    /// Worker threads; 0 means one per CPU.
    pub worker_count: usize,
    /// Pause between dispatch rounds in milliseconds.
    pub round_interval_ms: u64,
    /// Limit each round to the channel's free slots.
    pub clamp_to_capacity: bool,
    /// When the dispatcher stops.
    pub dispatch_mode: DispatchMode,
    /// Stack size for worker threads in bytes.
    pub worker_stack_size: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            aging_factor: 5,
            aging_unit_ms: 1_000,
            batch_size: 3,
            channel_capacity: 10,
            worker_count: 4,
            round_interval_ms: 100,
            clamp_to_capacity: true,
            dispatch_mode: DispatchMode::DrainOnEmpty,
            worker_stack_size: 2 * 1024 * 1024,
        }
    }
}

impl SchedulerConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the aging factor.
    #[must_use]
    pub const fn with_aging_factor(mut self, factor: u32) -> Self {
        self.aging_factor = factor;
        self
    }

    /// Set the aging unit.
    #[must_use]
    pub fn with_aging_unit(mut self, unit: Duration) -> Self {
        self.aging_unit_ms = duration_ms(unit);
        self
    }

    /// Set the batch size.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the handoff channel capacity.
    #[must_use]
    pub const fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Set the worker count (0 = one per CPU).
    #[must_use]
    pub const fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    /// Set the pause between rounds.
    #[must_use]
    pub fn with_round_interval(mut self, interval: Duration) -> Self {
        self.round_interval_ms = duration_ms(interval);
        self
    }

    /// Enable or disable clamping batches to free channel slots.
    #[must_use]
    pub const fn with_clamp_to_capacity(mut self, clamp: bool) -> Self {
        self.clamp_to_capacity = clamp;
        self
    }

    /// Set the dispatch mode.
    #[must_use]
    pub const fn with_dispatch_mode(mut self, mode: DispatchMode) -> Self {
        self.dispatch_mode = mode;
        self
    }

    /// Set the worker thread stack size.
    #[must_use]
    pub const fn with_worker_stack_size(mut self, bytes: usize) -> Self {
        self.worker_stack_size = bytes;
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.aging_factor == 0 {
            return Err("aging_factor must be greater than 0".into());
        }
        if self.aging_unit_ms == 0 {
            return Err("aging_unit_ms must be greater than 0".into());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be greater than 0".into());
        }
        if self.channel_capacity == 0 {
            return Err("channel_capacity must be greater than 0".into());
        }
        if self.batch_size > self.channel_capacity {
            return Err(format!(
                "batch_size ({}) must not exceed channel_capacity ({})",
                self.batch_size, self.channel_capacity
            ));
        }
        if self.dispatch_mode == DispatchMode::UntilShutdown && self.round_interval_ms == 0 {
            return Err("round_interval_ms must be greater than 0 in until_shutdown mode".into());
        }
        if self.worker_stack_size < 64 * 1024 {
            return Err("worker_stack_size must be at least 64 KiB".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `AGING_SCHEDULER_*` environment variables,
    /// loading a `.env` file first if one exists.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from a variable lookup; unset variables keep
    /// their defaults. Keys are `ENV_PREFIX` followed by the upper-cased
    /// field name.
    ///
    /// # Errors
    ///
    /// Returns a parse or validation message.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn read<T, F>(lookup: &F, field: &str, slot: &mut T) -> Result<(), String>
        where
            T: FromStr,
            T::Err: std::fmt::Display,
            F: Fn(&str) -> Option<String>,
        {
            let key = format!("{ENV_PREFIX}{}", field.to_ascii_uppercase());
            if let Some(raw) = lookup(&key) {
                *slot = raw.trim().parse().map_err(|e| format!("{key}: {e}"))?;
            }
            Ok(())
        }

        let mut cfg = Self::default();
        read(&lookup, "aging_factor", &mut cfg.aging_factor)?;
        read(&lookup, "aging_unit_ms", &mut cfg.aging_unit_ms)?;
        read(&lookup, "batch_size", &mut cfg.batch_size)?;
        read(&lookup, "channel_capacity", &mut cfg.channel_capacity)?;
        read(&lookup, "worker_count", &mut cfg.worker_count)?;
        read(&lookup, "round_interval_ms", &mut cfg.round_interval_ms)?;
        read(&lookup, "clamp_to_capacity", &mut cfg.clamp_to_capacity)?;
        read(&lookup, "dispatch_mode", &mut cfg.dispatch_mode)?;
        read(&lookup, "worker_stack_size", &mut cfg.worker_stack_size)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Aging policy described by this configuration.
    #[must_use]
    pub fn aging_policy(&self) -> AgingPolicy {
        AgingPolicy::new(self.aging_factor, Duration::from_millis(self.aging_unit_ms))
    }

    /// Dispatcher settings described by this configuration.
    #[must_use]
    pub const fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            batch_size: self.batch_size,
            round_interval: Duration::from_millis(self.round_interval_ms),
            clamp_to_capacity: self.clamp_to_capacity,
            mode: self.dispatch_mode,
        }
    }

    /// Worker count with 0 resolved to the number of CPUs.
    #[must_use]
    pub fn resolved_worker_count(&self) -> usize {
        if self.worker_count == 0 {
            num_cpus::get().max(1)
        } else {
            self.worker_count
        }
    }
}

impl FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drain_on_empty" => Ok(Self::DrainOnEmpty),
            "until_shutdown" => Ok(Self::UntilShutdown),
            other => Err(format!("unknown dispatch mode `{other}`")),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

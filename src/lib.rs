//! # Prometheus Aging Scheduler
//!
//! A priority-aging task scheduler that feeds a fixed pool of worker threads.
//!
//! Pending tasks sit in a [`PriorityStore`](core::PriorityStore). A dispatcher
//! repeatedly re-ranks them by *effective priority* (base priority plus a bonus
//! that grows with waiting time), extracts the top N, and pushes them through
//! a bounded handoff channel to the workers. Aging means a low-priority task
//! cannot be starved forever by a stream of higher-priority arrivals.
//!
//! ## Core Problem Solved
//!
//! Strict priority queues starve low-priority work under sustained load.
//! Aging bounds that wait: with factor `F`, a task of priority `P` reaches any
//! competing priority `C` after `(C - P) / F` aging units.
//!
//! ## Key Features
//!
//! - **Aging-aware ranking**: full re-rank on every extraction round, with a
//!   deterministic tie-break (earlier submission first)
//! - **Batched dispatch**: top-N per round, clamped to free channel slots
//! - **Backpressure**: a full handoff channel slows extraction, never
//!   submission
//! - **Dedicated worker threads**: each with its own current-thread tokio
//!   runtime for async executors
//! - **Injected clock**: timestamps, round cadence and simulated work run on a
//!   [`Clock`](util::Clock), so tests can drive time by hand
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use prometheus_aging_scheduler::builders::SchedulerBuilder;
//! use prometheus_aging_scheduler::core::SimulatedWork;
//! use prometheus_aging_scheduler::util::{init_tracing, SystemClock};
//!
//! init_tracing();
//! let clock = Arc::new(SystemClock);
//! let scheduler = SchedulerBuilder::new(SimulatedWork::new(clock.clone(), Duration::from_secs(1)))
//!     .configure(|cfg| cfg.with_worker_count(4).with_batch_size(3))
//!     .clock(clock)
//!     .build()?;
//!
//! for priority in [10, 50, 10] {
//!     scheduler.submit(priority, format!("task-{priority}"));
//! }
//! let report = scheduler.run()?;
//! assert_eq!(report.executed, 3);
//! ```
//!
//! For complete examples, see:
//! - `tests/scheduler_test.rs` - End-to-end runs with concurrent producers
//! - `tests/aging_properties.rs` - Ranking and aging properties

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling: tasks, aging, store, dispatcher and worker pool.
pub mod core;
/// Configuration models for the scheduler.
pub mod config;
/// Builders to construct a scheduler from configuration.
pub mod builders;
/// Shared utilities: clocks and telemetry.
pub mod util;

//! Tests for builder modules

use std::sync::Arc;
use std::time::Duration;

use prometheus_aging_scheduler::builders::SchedulerBuilder;
use prometheus_aging_scheduler::config::SchedulerConfig;
use prometheus_aging_scheduler::core::{SchedulerError, SimulatedWork};
use prometheus_aging_scheduler::util::ManualClock;

fn work(clock: &ManualClock) -> SimulatedWork {
    SimulatedWork::new(Arc::new(clock.clone()), Duration::from_millis(10))
}

#[test]
fn test_builder_defaults() {
    let clock = ManualClock::new();
    let builder = SchedulerBuilder::new(work(&clock));
    assert_eq!(builder.config_ref(), &SchedulerConfig::default());
    let scheduler = builder.build().unwrap();
    assert_eq!(scheduler.pending_count(), 0);
}

#[test]
fn test_builder_configure_and_clock() {
    let clock = ManualClock::new();
    let scheduler = SchedulerBuilder::new(work(&clock))
        .configure(|cfg| cfg.with_worker_count(1).with_batch_size(2))
        .clock(Arc::new(clock.clone()))
        .build()
        .unwrap();
    assert_eq!(scheduler.config().worker_count, 1);
    assert_eq!(scheduler.config().batch_size, 2);

    scheduler.submit(1, "one");
    clock.advance(Duration::from_secs(3));
    scheduler.submit(1, "two");
    let report = scheduler.run().unwrap();
    assert_eq!(report.executed, 2);
}

#[test]
fn test_builder_rejects_invalid_config() {
    let clock = ManualClock::new();
    let err = SchedulerBuilder::new(work(&clock))
        .config(SchedulerConfig::new().with_channel_capacity(0))
        .build()
        .unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidConfig(_)));
}

//! Tests for configuration validation

use std::collections::HashMap;
use std::time::Duration;

use prometheus_aging_scheduler::config::SchedulerConfig;
use prometheus_aging_scheduler::core::DispatchMode;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn test_defaults_are_valid() {
    let cfg = SchedulerConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.aging_factor, 5);
    assert_eq!(cfg.batch_size, 3);
    assert_eq!(cfg.channel_capacity, 10);
    assert_eq!(cfg.worker_count, 4);
    assert_eq!(cfg.round_interval_ms, 100);
    assert_eq!(cfg.dispatch_mode, DispatchMode::DrainOnEmpty);
}

#[test]
fn test_invalid_aging_factor() {
    assert!(SchedulerConfig::new().with_aging_factor(0).validate().is_err());
}

#[test]
fn test_invalid_aging_unit() {
    assert!(SchedulerConfig::new()
        .with_aging_unit(Duration::ZERO)
        .validate()
        .is_err());
}

#[test]
fn test_invalid_batch_size() {
    assert!(SchedulerConfig::new().with_batch_size(0).validate().is_err());
}

#[test]
fn test_batch_size_bounded_by_capacity() {
    let cfg = SchedulerConfig::new().with_batch_size(8).with_channel_capacity(4);
    let err = cfg.validate().unwrap_err();
    assert!(err.contains("channel_capacity"));

    let cfg = SchedulerConfig::new().with_batch_size(4).with_channel_capacity(4);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_until_shutdown_needs_interval() {
    let cfg = SchedulerConfig::new()
        .with_dispatch_mode(DispatchMode::UntilShutdown)
        .with_round_interval(Duration::ZERO);
    assert!(cfg.validate().is_err());

    // Zero interval is fine when draining to empty.
    let cfg = SchedulerConfig::new().with_round_interval(Duration::ZERO);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_worker_count_zero_resolves_to_cpus() {
    let cfg = SchedulerConfig::new().with_worker_count(0);
    assert!(cfg.validate().is_ok());
    assert!(cfg.resolved_worker_count() >= 1);
    assert_eq!(SchedulerConfig::new().with_worker_count(3).resolved_worker_count(), 3);
}

#[test]
fn test_from_json_with_defaults() {
    let json = r#"{
        "aging_factor": 2,
        "batch_size": 5,
        "dispatch_mode": "until_shutdown"
    }"#;

    let cfg = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.aging_factor, 2);
    assert_eq!(cfg.batch_size, 5);
    assert_eq!(cfg.channel_capacity, 10);
    assert_eq!(cfg.dispatch_mode, DispatchMode::UntilShutdown);
}

#[test]
fn test_from_json_rejects_invalid() {
    assert!(SchedulerConfig::from_json_str(r#"{ "batch_size": 0 }"#).is_err());
    assert!(SchedulerConfig::from_json_str("not json").is_err());
}

#[test]
fn test_from_lookup_overrides() {
    let cfg = SchedulerConfig::from_lookup(lookup(&[
        ("AGING_SCHEDULER_AGING_FACTOR", "7"),
        ("AGING_SCHEDULER_WORKER_COUNT", " 2 "),
        ("AGING_SCHEDULER_CLAMP_TO_CAPACITY", "false"),
        ("AGING_SCHEDULER_DISPATCH_MODE", "until_shutdown"),
    ]))
    .unwrap();
    assert_eq!(cfg.aging_factor, 7);
    assert_eq!(cfg.worker_count, 2);
    assert!(!cfg.clamp_to_capacity);
    assert_eq!(cfg.dispatch_mode, DispatchMode::UntilShutdown);
    assert_eq!(cfg.batch_size, 3);
}

#[test]
fn test_from_lookup_reports_bad_values() {
    let err = SchedulerConfig::from_lookup(lookup(&[("AGING_SCHEDULER_BATCH_SIZE", "many")]))
        .unwrap_err();
    assert!(err.starts_with("AGING_SCHEDULER_BATCH_SIZE"));

    let err = SchedulerConfig::from_lookup(lookup(&[("AGING_SCHEDULER_DISPATCH_MODE", "never")]))
        .unwrap_err();
    assert!(err.contains("unknown dispatch mode"));
}

#[test]
fn test_derived_settings() {
    let cfg = SchedulerConfig::new()
        .with_aging_factor(3)
        .with_aging_unit(Duration::from_millis(250))
        .with_round_interval(Duration::from_millis(20));
    let policy = cfg.aging_policy();
    assert_eq!(policy.factor(), 3);
    assert_eq!(policy.unit(), Duration::from_millis(250));

    let settings = cfg.dispatch_settings();
    assert_eq!(settings.batch_size, 3);
    assert_eq!(settings.round_interval, Duration::from_millis(20));
    assert!(settings.clamp_to_capacity);
}

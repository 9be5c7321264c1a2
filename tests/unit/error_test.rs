//! Tests for error types

use prometheus_aging_scheduler::core::SchedulerError;

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("batch_size must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: batch_size must be greater than 0"
    );
}

#[test]
fn test_workers_unavailable_error() {
    let err = SchedulerError::WorkersUnavailable { undelivered: 3 };
    assert_eq!(format!("{}", err), "all workers exited; 3 undelivered task(s) returned to the store");
}

#[test]
fn test_shutting_down_error() {
    let err = SchedulerError::ShuttingDown;
    assert_eq!(format!("{}", err), "scheduler is shutting down");
}

#[test]
fn test_worker_spawn_from_io() {
    let io = std::io::Error::new(std::io::ErrorKind::OutOfMemory, "no threads left");
    let err: SchedulerError = io.into();
    assert_eq!(format!("{}", err), "failed to spawn worker thread: no threads left");
}

#[test]
fn test_converts_into_anyhow() {
    fn fails() -> prometheus_aging_scheduler::core::AppResult<()> {
        let outcome: Result<(), SchedulerError> = Err(SchedulerError::ShuttingDown);
        outcome?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert!(err.downcast_ref::<SchedulerError>().is_some());
}

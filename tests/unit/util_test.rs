//! Tests for utility functions

use std::sync::Arc;
use std::time::Duration;

use prometheus_aging_scheduler::util::{init_tracing, Clock, ManualClock, SharedClock};

#[test]
fn test_manual_clock_through_shared_handle() {
    let manual = ManualClock::new();
    let shared: SharedClock = Arc::new(manual.clone());
    let start = shared.now();
    shared.sleep(Duration::from_secs(2));
    assert_eq!(shared.now() - start, Duration::from_secs(2));
    assert_eq!(manual.elapsed(), Duration::from_secs(2));
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    tracing::info!("tracing initialized twice without panicking");
}

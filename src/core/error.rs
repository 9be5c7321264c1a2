//! Error types for scheduler operations.

use thiserror::Error;

/// Errors produced by scheduler components.
///
/// Submission and extraction never fail; these cover setup and the run loop.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),
    /// Every worker exited while the dispatcher still held tasks.
    #[error("all workers exited; {undelivered} undelivered task(s) returned to the store")]
    WorkersUnavailable {
        /// Tasks that no worker received, now pending in the store again.
        undelivered: usize,
    },
    /// The shutdown signal has been triggered.
    #[error("scheduler is shutting down")]
    ShuttingDown,
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;

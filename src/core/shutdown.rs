//! Cooperative shutdown flag shared by producers and the dispatcher.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Clonable one-way flag. Once triggered it stays triggered.
///
/// Producers trigger it after their last submission; everything they added
/// before triggering is visible to a dispatcher that observes the flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// New, untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger the signal. Returns `true` if this call triggered it.
    pub fn trigger(&self) -> bool {
        !self.flag.swap(true, Ordering::AcqRel)
    }

    /// Whether the signal has been triggered.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

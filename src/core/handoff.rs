//! Bounded handoff between the dispatcher and the worker pool.
//!
//! There is exactly one [`HandoffSender`]; it is not `Clone` and closing
//! consumes it, so the channel cannot be written after close or closed twice.
//! Receivers are cloned freely, one per worker.
//!
//! The sender keeps its own read handle and a count of live receivers, so
//! tasks still buffered when the last worker goes away can be reclaimed
//! instead of dropped with the channel.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender};

use super::task::Task;

/// How often a blocked send re-checks that some receiver is still alive.
const RECEIVER_POLL: Duration = Duration::from_millis(10);

/// What a worker observes when it asks for work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handoff {
    /// A task to execute.
    Task(Task),
    /// The sender closed and every buffered task has been taken.
    Closed,
}

/// Create a handoff channel buffering up to `capacity` tasks.
#[must_use]
pub fn channel(capacity: usize) -> (HandoffSender, HandoffReceiver) {
    let (tx, rx) = bounded(capacity);
    let receivers = Arc::new(AtomicUsize::new(1));
    (
        HandoffSender {
            tx,
            reclaim: rx.clone(),
            receivers: Arc::clone(&receivers),
        },
        HandoffReceiver { rx, receivers },
    )
}

/// Write half, owned by the dispatcher.
#[derive(Debug)]
pub struct HandoffSender {
    tx: Sender<Task>,
    reclaim: Receiver<Task>,
    receivers: Arc<AtomicUsize>,
}

/// A task that could not be handed off because every receiver is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Undelivered(pub Task);

impl HandoffSender {
    /// Push a task, blocking while the buffer is full.
    ///
    /// # Errors
    ///
    /// Returns the task back if all receivers have been dropped, including
    /// while this call is blocked on a full buffer.
    pub fn send(&self, mut task: Task) -> Result<(), Undelivered> {
        loop {
            if !self.has_receivers() {
                return Err(Undelivered(task));
            }
            match self.tx.send_timeout(task, RECEIVER_POLL) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(back) | SendTimeoutError::Disconnected(back)) => {
                    task = back;
                }
            }
        }
    }

    /// Whether any [`HandoffReceiver`] is still alive.
    #[must_use]
    pub fn has_receivers(&self) -> bool {
        self.receivers.load(Ordering::Acquire) > 0
    }

    /// Take back every buffered task once no receiver is left to run them.
    ///
    /// Returns nothing while receivers are alive, so it never competes with
    /// workers.
    #[must_use]
    pub fn reclaim_stranded(&self) -> Vec<Task> {
        if self.has_receivers() {
            return Vec::new();
        }
        self.reclaim.try_iter().collect()
    }

    /// Buffer capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tx.capacity().unwrap_or(usize::MAX)
    }

    /// Tasks currently buffered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }

    /// Slots that can be filled without blocking right now.
    #[must_use]
    pub fn free_slots(&self) -> usize {
        self.capacity().saturating_sub(self.len())
    }

    /// Close the channel. Workers drain what is buffered, then see
    /// [`Handoff::Closed`].
    pub fn close(self) {
        drop(self);
    }
}

/// Read half, cloned into each worker.
#[derive(Debug)]
pub struct HandoffReceiver {
    rx: Receiver<Task>,
    receivers: Arc<AtomicUsize>,
}

impl Clone for HandoffReceiver {
    fn clone(&self) -> Self {
        self.receivers.fetch_add(1, Ordering::AcqRel);
        Self {
            rx: self.rx.clone(),
            receivers: Arc::clone(&self.receivers),
        }
    }
}

impl Drop for HandoffReceiver {
    fn drop(&mut self) {
        self.receivers.fetch_sub(1, Ordering::AcqRel);
    }
}

impl HandoffReceiver {
    /// Block until a task arrives or the channel is closed and drained.
    #[must_use]
    pub fn recv(&self) -> Handoff {
        self.rx.recv().map_or(Handoff::Closed, Handoff::Task)
    }

    /// Tasks currently buffered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

//! Core scheduling: tasks, aging, the pending store, dispatch and workers.

pub mod aging;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod handoff;
pub mod scheduler;
pub mod shutdown;
pub mod store;
pub mod task;
pub mod worker_pool;

pub use aging::AgingPolicy;
pub use dispatcher::{DispatchMode, DispatchReport, DispatchSettings, Dispatcher};
pub use error::{AppResult, SchedulerError};
pub use executor::{SimulatedWork, TaskExecutor, WorkerContext};
pub use handoff::{Handoff, HandoffReceiver, HandoffSender, Undelivered};
pub use scheduler::{RunReport, Scheduler};
pub use shutdown::ShutdownSignal;
pub use store::PriorityStore;
pub use task::{Priority, Task};
pub use worker_pool::{PoolStats, WorkerPool};

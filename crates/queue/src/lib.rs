//! The offline calculation queue.
//!
//! Callers enqueue typed calculation requests; a single-worker scheduler
//! drains them in priority order through the calculation engine (via the
//! memoizing result cache), persisting every state transition so a
//! process restart loses no work. Scheduling is gated on connectivity:
//! tasks accumulate while offline and start draining the moment the
//! network monitor reports online again.

pub mod error;
pub mod network;
pub mod queue;
pub mod scheduler;
pub mod signal;
pub mod stats;
pub mod sync;

pub use error::QueueError;
pub use network::NetworkMonitor;
pub use queue::OfflineQueue;
pub use scheduler::Step;
pub use signal::TaskOutcome;
pub use stats::QueueStats;
pub use sync::{RemoteSync, SyncError};

//! Best-effort remote synchronization collaborator.
//!
//! The queue invokes this opportunistically when connectivity returns.
//! Failures are logged and not retried here; the next reconnect gets a
//! fresh attempt. No ordering or conflict-resolution guarantee is made.

use async_trait::async_trait;
use thiserror::Error;

use zins_core::task::Task;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("remote sync error: {0}")]
    Remote(String),
}

/// Uploads locally completed calculations to a history service.
#[async_trait]
pub trait RemoteSync: Send + Sync {
    async fn push_completed(&self, tasks: &[Task]) -> Result<(), SyncError>;
}

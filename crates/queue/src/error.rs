//! Queue error types.

use thiserror::Error;

use zins_core::calc::ValidationError;
use zins_core::task::TaskId;
use zins_store::StoreError;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("task {id} is {status}; only pending tasks can be cancelled")]
    NotCancellable { id: TaskId, status: &'static str },

    #[error("calculation failed: {0}")]
    TaskFailed(String),

    #[error("completion signal closed for task {0}")]
    SignalClosed(TaskId),
}

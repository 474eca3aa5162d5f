//! Task model and status state machine.
//!
//! A task moves `Pending -> Processing -> Completed | Failed`, or loops
//! back to `Pending` on a retryable failure, bounded by `max_retries`.
//! Result and error payloads live inside the status variants, so a task
//! can never carry both (or either while still pending).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calc::{CalcInput, CalcResult, CalcType};

/// Process-unique task identifier.
pub type TaskId = Uuid;

/// Selection priority. Lower numeric value = more urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High = 0,
    Medium = 1,
    Low = 2,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Task lifecycle state, with terminal payloads attached to the state
/// that owns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed {
        result: CalcResult,
        completed_at: DateTime<Utc>,
    },
    Failed {
        error: String,
    },
}

impl TaskStatus {
    /// Whether this state is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    /// Short label for logs and statistics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A unit of requested computation tracked through the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    /// Monotonic enqueue counter, breaks FIFO ties within a priority band.
    pub seq: u64,
    pub input: CalcInput,
    pub priority: Priority,
    pub status: TaskStatus,
    pub retry_count: u32,
    pub max_retries: u32,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Create a fresh pending task.
    pub fn new(seq: u64, input: CalcInput, priority: Priority, max_retries: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            seq,
            input,
            priority,
            status: TaskStatus::Pending,
            retry_count: 0,
            max_retries,
            created_at: Utc::now(),
        }
    }

    pub fn calc_type(&self) -> CalcType {
        self.input.calc_type()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// The result, if the task completed.
    pub fn result(&self) -> Option<&CalcResult> {
        match &self.status {
            TaskStatus::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    /// The error message, if the task failed.
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            TaskStatus::Failed { error } => Some(error.as_str()),
            _ => None,
        }
    }
}

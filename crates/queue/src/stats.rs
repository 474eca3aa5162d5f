//! Derived queue statistics. No independent state; recomputed on demand
//! from the task store and result cache.

use chrono::{DateTime, Utc};
use serde::Serialize;

use zins_cache::ResultCache;
use zins_core::task::TaskStatus;
use zins_store::TaskStore;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
    pub cache_entries: usize,
    pub last_completed_at: Option<DateTime<Utc>>,
}

impl QueueStats {
    pub fn total(&self) -> usize {
        self.pending + self.processing + self.completed + self.failed
    }
}

/// Count tasks per status and pick up the most recent completion time.
pub fn collect(tasks: &TaskStore, cache: &ResultCache) -> QueueStats {
    let mut stats = QueueStats {
        cache_entries: cache.len(),
        ..QueueStats::default()
    };

    for task in tasks.list(|_| true) {
        match task.status {
            TaskStatus::Pending => stats.pending += 1,
            TaskStatus::Processing => stats.processing += 1,
            TaskStatus::Completed { completed_at, .. } => {
                stats.completed += 1;
                if stats.last_completed_at.map_or(true, |t| completed_at > t) {
                    stats.last_completed_at = Some(completed_at);
                }
            }
            TaskStatus::Failed { .. } => stats.failed += 1,
        }
    }

    stats
}

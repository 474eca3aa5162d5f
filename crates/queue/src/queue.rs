//! The queue facade: enqueue, await, cancel, cleanup, stats.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Notify;
use tracing::info;

use zins_cache::ResultCache;
use zins_core::calc::{CalcInput, CalcResult};
use zins_core::config::QueueConfig;
use zins_core::task::{Priority, Task, TaskId, TaskStatus};
use zins_engine::CalculationEngine;
use zins_store::{DurableStore, TaskStore};

use crate::error::QueueError;
use crate::network::NetworkMonitor;
use crate::signal::CompletionSignals;
use crate::stats::{self, QueueStats};
use crate::sync::RemoteSync;

/// The offline calculation queue. One instance per process/session;
/// constructed once and shared by handle (no hidden global state).
pub struct OfflineQueue {
    pub(crate) config: QueueConfig,
    pub(crate) tasks: TaskStore,
    pub(crate) cache: ResultCache,
    pub(crate) engine: Arc<dyn CalculationEngine>,
    pub(crate) network: NetworkMonitor,
    pub(crate) signals: CompletionSignals,
    pub(crate) remote: Option<Arc<dyn RemoteSync>>,
    /// Single-slot guard: at most one task in flight per worker.
    pub(crate) in_flight: AtomicBool,
    /// Wakes the scheduler when a task is enqueued while it idles.
    pub(crate) kick: Notify,
    pub(crate) stopped: AtomicBool,
}

impl OfflineQueue {
    /// Open the queue over a durable store: reload persisted tasks
    /// (mid-processing ones restart as pending) and rehydrate the result
    /// cache. The queue starts online; flip via [`OfflineQueue::set_online`].
    pub async fn open(
        config: QueueConfig,
        store: Arc<dyn DurableStore>,
        engine: Arc<dyn CalculationEngine>,
    ) -> Result<Self, QueueError> {
        let tasks = TaskStore::new(Arc::clone(&store));
        tasks.load().await?;
        let cache = ResultCache::new(store, config.cache_max_entries);
        cache.load().await;

        Ok(Self {
            config,
            tasks,
            cache,
            engine,
            network: NetworkMonitor::new(true),
            signals: CompletionSignals::new(),
            remote: None,
            in_flight: AtomicBool::new(false),
            kick: Notify::new(),
            stopped: AtomicBool::new(false),
        })
    }

    /// Attach the best-effort remote sync collaborator.
    pub fn with_remote_sync(mut self, remote: Arc<dyn RemoteSync>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Validate and enqueue a calculation. The task id is returned once
    /// the record is persisted; on a persistence failure the error is
    /// surfaced while the in-memory task remains for best-effort
    /// processing.
    pub async fn enqueue(
        &self,
        input: CalcInput,
        priority: Priority,
    ) -> Result<TaskId, QueueError> {
        input.validate()?;

        let task = Task::new(
            self.tasks.next_seq(),
            input,
            priority,
            self.config.default_max_retries,
        );
        let id = task.id;
        info!(
            task_id = %id,
            calc_type = %task.calc_type(),
            priority = %task.priority,
            "Task enqueued"
        );

        let persisted = self.tasks.insert(task).await;
        self.kick.notify_one();
        persisted?;
        Ok(id)
    }

    /// Current snapshot of a task.
    pub fn task(&self, id: TaskId) -> Option<Task> {
        self.tasks.get(id)
    }

    /// Await a task's terminal outcome without polling. Returns the
    /// result, or [`QueueError::TaskFailed`] with the recorded message.
    pub async fn await_result(&self, id: TaskId) -> Result<CalcResult, QueueError> {
        if self.tasks.get(id).is_none() {
            return Err(QueueError::TaskNotFound(id));
        }

        let mut rx = self.signals.subscribe(id);

        // Re-check after subscribing: a terminal transition between the
        // two steps is observed here instead of being missed.
        if let Some(task) = self.tasks.get(id) {
            match task.status {
                TaskStatus::Completed { result, .. } => return Ok(result),
                TaskStatus::Failed { error } => return Err(QueueError::TaskFailed(error)),
                _ => {}
            }
        }

        loop {
            rx.changed()
                .await
                .map_err(|_| QueueError::SignalClosed(id))?;
            let outcome = rx.borrow_and_update().clone();
            if let Some(outcome) = outcome {
                return outcome.map_err(QueueError::TaskFailed);
            }
        }
    }

    /// Remove a task that has not started yet. Tasks already processing
    /// or finished cannot be cancelled. The pending check and the removal
    /// are a single atomic store operation, so the scheduler can never
    /// start a task this call reported as cancelled.
    pub async fn cancel(&self, id: TaskId) -> Result<(), QueueError> {
        match self.tasks.remove_if_pending(id).await? {
            None => Err(QueueError::TaskNotFound(id)),
            Some(task) if task.status == TaskStatus::Pending => {
                self.signals.forget(id);
                info!(task_id = %id, "Task cancelled");
                Ok(())
            }
            Some(task) => Err(QueueError::NotCancellable {
                id,
                status: task.status.label(),
            }),
        }
    }

    /// Remove terminal tasks older than the configured retention window.
    pub async fn cleanup(&self) -> Result<usize, QueueError> {
        self.cleanup_older_than(self.config.retention_days).await
    }

    /// Remove terminal tasks created more than `days` days ago, from
    /// memory and the durable store. Returns the number removed.
    pub async fn cleanup_older_than(&self, days: i64) -> Result<usize, QueueError> {
        let cutoff = Utc::now() - chrono::Duration::days(days);
        let stale = self
            .tasks
            .list(|t| t.is_terminal() && t.created_at < cutoff);

        for task in &stale {
            self.tasks.remove(task.id).await?;
            self.signals.forget(task.id);
        }
        if !stale.is_empty() {
            info!(removed = stale.len(), "Cleaned up old tasks");
        }
        Ok(stale.len())
    }

    /// Derived counters over the task store and cache.
    pub fn stats(&self) -> QueueStats {
        stats::collect(&self.tasks, &self.cache)
    }

    pub fn is_online(&self) -> bool {
        self.network.is_online()
    }

    /// Feed the connectivity signal. Coming online wakes the scheduler
    /// immediately instead of waiting for the next tick.
    pub fn set_online(&self, online: bool) {
        self.network.set_online(online);
        if online {
            self.kick.notify_one();
        }
    }
}

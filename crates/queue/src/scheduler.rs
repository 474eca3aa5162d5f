//! Task selection and execution.
//!
//! One task runs at a time. Selection is strict priority order with FIFO
//! tie-break inside a band, re-evaluated per step so a high-priority task
//! enqueued mid-stream overtakes waiting lower-priority work.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use zins_core::task::{Task, TaskId, TaskStatus};

use crate::queue::OfflineQueue;

/// Outcome of a single scheduling step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The queue is offline; nothing was attempted.
    Offline,
    /// Another task is already in flight.
    Busy,
    /// No pending task was available.
    Idle,
    /// The named task reached a state transition (completed, failed, or
    /// requeued for retry).
    Processed(TaskId),
}

impl OfflineQueue {
    /// Attempt one scheduling step: pick the highest-priority pending
    /// task and run it to its next transition.
    pub async fn process_next(&self) -> Step {
        if !self.network.is_online() {
            return Step::Offline;
        }
        if self.in_flight.swap(true, Ordering::AcqRel) {
            return Step::Busy;
        }

        let next = self
            .tasks
            .list(|t| t.status == TaskStatus::Pending)
            .into_iter()
            .min_by_key(|t| (t.priority, t.seq));

        let Some(task) = next else {
            self.in_flight.store(false, Ordering::Release);
            return Step::Idle;
        };

        let id = task.id;
        self.execute(task).await;
        self.in_flight.store(false, Ordering::Release);
        Step::Processed(id)
    }

    /// Process pending tasks until the queue is idle, offline, or busy.
    /// Returns the number of tasks processed.
    pub async fn drain(&self) -> usize {
        let mut processed = 0;
        while let Step::Processed(_) = self.process_next().await {
            processed += 1;
        }
        processed
    }

    /// Scheduler loop: wakes on the configured tick, on enqueue, and on
    /// connectivity transitions; drains pending work while online and
    /// pushes completed tasks to the remote on reconnect. Runs until
    /// [`OfflineQueue::shutdown`].
    pub async fn run(self: Arc<Self>) {
        let mut online_rx = self.network.subscribe();
        online_rx.borrow_and_update();

        let tick = Duration::from_millis(self.config.tick_interval_ms.max(1));
        let mut interval = tokio::time::interval(tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(tick_ms = tick.as_millis() as u64, "Scheduler started");

        while !self.stopped.load(Ordering::Acquire) {
            tokio::select! {
                _ = interval.tick() => {}
                _ = self.kick.notified() => {}
                changed = online_rx.changed() => {
                    if changed.is_ok() && *online_rx.borrow_and_update() {
                        self.try_remote_sync().await;
                    }
                }
            }
            if self.stopped.load(Ordering::Acquire) {
                break;
            }
            self.drain().await;
        }

        info!("Scheduler stopped");
    }

    /// Ask a running scheduler loop to exit after its current step.
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::Release);
        self.kick.notify_one();
    }

    async fn execute(&self, mut task: Task) {
        let id = task.id;
        task.status = TaskStatus::Processing;
        match self.tasks.update(task.clone()).await {
            Ok(true) => {}
            Ok(false) => {
                // Cancelled between selection and start.
                debug!(task_id = %id, "Task removed before start, skipping");
                return;
            }
            Err(e) => warn!(task_id = %id, error = %e, "Failed to persist processing state"),
        }
        debug!(task_id = %id, calc_type = %task.calc_type(), "Task started");

        let engine = Arc::clone(&self.engine);
        let input = task.input.clone();
        let timeout = Duration::from_millis(self.config.compute_timeout_ms.max(1));
        let computed = tokio::time::timeout(
            timeout,
            self.cache
                .get_or_compute(&task.input, move || async move {
                    engine.invoke(&input).await
                }),
        )
        .await;

        match computed {
            Ok(Ok(result)) => {
                task.status = TaskStatus::Completed {
                    result: result.clone(),
                    completed_at: Utc::now(),
                };
                match self.tasks.update(task).await {
                    Ok(true) => {}
                    Ok(false) => {
                        debug!(task_id = %id, "Task removed mid-flight, dropping result");
                        return;
                    }
                    Err(e) => warn!(task_id = %id, error = %e, "Failed to persist completed task"),
                }
                info!(task_id = %id, "Task completed");
                // The terminal state is in the store before waiters wake.
                self.signals.resolve(id, Ok(result));
            }
            Ok(Err(e)) => self.handle_failure(task, e.to_string()).await,
            Err(_) => {
                let timeout_ms = self.config.compute_timeout_ms;
                self.handle_failure(task, format!("computation timed out after {timeout_ms}ms"))
                    .await;
            }
        }
    }

    /// Failed attempt: requeue while retries remain, otherwise record the
    /// terminal failure and wake waiters.
    async fn handle_failure(&self, mut task: Task, error: String) {
        let id = task.id;
        task.retry_count += 1;

        if task.retry_count > task.max_retries {
            warn!(
                task_id = %id,
                attempts = task.retry_count,
                error = %error,
                "Task failed permanently"
            );
            task.status = TaskStatus::Failed {
                error: error.clone(),
            };
            match self.tasks.update(task).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(task_id = %id, "Task removed mid-flight, dropping failure");
                    return;
                }
                Err(e) => warn!(task_id = %id, error = %e, "Failed to persist failed task"),
            }
            self.signals.resolve(id, Err(error));
        } else {
            debug!(
                task_id = %id,
                attempt = task.retry_count,
                max_retries = task.max_retries,
                error = %error,
                "Task attempt failed, requeued"
            );
            task.status = TaskStatus::Pending;
            match self.tasks.update(task).await {
                Ok(_) => {}
                Err(e) => warn!(task_id = %id, error = %e, "Failed to persist retry state"),
            }
        }
    }

    /// Push locally completed tasks to the remote, if one is attached.
    /// Failures are logged and left for the next reconnect.
    async fn try_remote_sync(&self) {
        let Some(remote) = &self.remote else {
            return;
        };
        let completed = self
            .tasks
            .list(|t| matches!(t.status, TaskStatus::Completed { .. }));
        if completed.is_empty() {
            return;
        }

        match remote.push_completed(&completed).await {
            Ok(()) => info!(count = completed.len(), "Synced completed tasks"),
            Err(e) => warn!(error = %e, "Remote sync failed, will retry on next reconnect"),
        }
    }
}

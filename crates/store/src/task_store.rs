//! The task store: single source of truth for tasks, mirrored into the
//! durable store after every mutation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use zins_core::task::{Task, TaskId, TaskStatus};

use crate::durable::DurableStore;
use crate::error::StoreError;

/// Durable key for a task record.
fn task_key(id: TaskId) -> String {
    format!("tasks/{id}")
}

pub struct TaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
    store: Arc<dyn DurableStore>,
    /// Next enqueue sequence number; restored from the durable store on load.
    next_seq: AtomicU64,
}

impl TaskStore {
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            store,
            next_seq: AtomicU64::new(0),
        }
    }

    /// Reload every persisted task. Corrupt records are dropped with a
    /// warning; a task found mid-`Processing` is rewritten to `Pending`
    /// since no partial computation survives a restart.
    ///
    /// Returns the number of tasks loaded.
    pub async fn load(&self) -> Result<usize, StoreError> {
        let keys = self.store.list_keys("tasks/").await?;
        let mut loaded = HashMap::with_capacity(keys.len());
        let mut max_seq = 0u64;
        let mut resumed = 0usize;

        for key in keys {
            let Some(bytes) = self.store.get(&key).await? else {
                continue;
            };
            let mut task: Task = match serde_json::from_slice(&bytes) {
                Ok(task) => task,
                Err(e) => {
                    warn!(key = %key, error = %e, "Dropping corrupt task record");
                    continue;
                }
            };
            if task.status == TaskStatus::Processing {
                task.status = TaskStatus::Pending;
                resumed += 1;
                // Best effort: the rewritten state also goes back to disk.
                if let Err(e) = self.persist(&task).await {
                    warn!(task_id = %task.id, error = %e, "Failed to persist resumed task");
                }
            }
            max_seq = max_seq.max(task.seq);
            loaded.insert(task.id, task);
        }

        let count = loaded.len();
        self.next_seq.store(max_seq + 1, Ordering::SeqCst);
        *self.tasks.write().unwrap() = loaded;

        if count > 0 {
            info!(tasks = count, resumed, "Task store loaded");
        }
        Ok(count)
    }

    /// Claim the next enqueue sequence number.
    pub fn next_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Add a new task and persist it. On a persistence failure the task
    /// stays in memory for best-effort processing, but the error is
    /// surfaced so the caller never assumes durability it did not get.
    pub async fn insert(&self, task: Task) -> Result<(), StoreError> {
        self.tasks.write().unwrap().insert(task.id, task.clone());
        self.persist(&task).await
    }

    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.tasks.read().unwrap().get(&id).cloned()
    }

    /// Replace a task's full state and re-persist the whole record.
    /// Returns `Ok(false)` without writing anything when the task is no
    /// longer tracked (removed or cancelled in the meantime), so a stale
    /// snapshot can never resurrect it.
    pub async fn update(&self, task: Task) -> Result<bool, StoreError> {
        {
            let mut tasks = self.tasks.write().unwrap();
            let Some(slot) = tasks.get_mut(&task.id) else {
                return Ok(false);
            };
            *slot = task.clone();
        }
        self.persist(&task).await?;
        Ok(true)
    }

    /// Remove a task from memory and the durable store.
    pub async fn remove(&self, id: TaskId) -> Result<(), StoreError> {
        self.tasks.write().unwrap().remove(&id);
        self.store.delete(&task_key(id)).await
    }

    /// Remove the task only while it is still `Pending`. The status check
    /// and the removal happen under one write lock, so a scheduler running
    /// on another thread can never pick up a task this call removed.
    ///
    /// `Ok(None)` when the task is untracked; otherwise the pre-removal
    /// snapshot — the task was removed exactly when that snapshot is
    /// pending.
    pub async fn remove_if_pending(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let snapshot = {
            let mut tasks = self.tasks.write().unwrap();
            let Some(task) = tasks.get(&id).cloned() else {
                return Ok(None);
            };
            if task.status == TaskStatus::Pending {
                tasks.remove(&id);
            }
            task
        };
        if snapshot.status == TaskStatus::Pending {
            self.store.delete(&task_key(id)).await?;
        }
        Ok(Some(snapshot))
    }

    /// Snapshot of all tasks matching `predicate`.
    pub fn list<F>(&self, predicate: F) -> Vec<Task>
    where
        F: Fn(&Task) -> bool,
    {
        self.tasks
            .read()
            .unwrap()
            .values()
            .filter(|t| predicate(t))
            .cloned()
            .collect()
    }

    /// Total number of tracked tasks.
    pub fn len(&self) -> usize {
        self.tasks.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn persist(&self, task: &Task) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(task)?;
        self.store.put(&task_key(task.id), &bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::durable::MemoryStore;
    use zins_core::calc::{CalcInput, Frequency};
    use zins_core::task::Priority;

    fn sample_task(seq: u64) -> Task {
        Task::new(
            seq,
            CalcInput::CompoundInterest {
                principal: 10_000.0,
                monthly_payment: 0.0,
                annual_rate: 4.0,
                years: 10,
                compound_frequency: Frequency::Monthly,
            },
            Priority::Medium,
            3,
        )
    }

    #[tokio::test]
    async fn insert_get_update_remove() {
        let store = TaskStore::new(Arc::new(MemoryStore::new()));
        let mut task = sample_task(0);
        let id = task.id;

        store.insert(task.clone()).await.unwrap();
        assert_eq!(store.get(id).unwrap().id, id);

        task.status = TaskStatus::Processing;
        assert!(store.update(task).await.unwrap());
        assert_eq!(store.get(id).unwrap().status, TaskStatus::Processing);

        store.remove(id).await.unwrap();
        assert!(store.get(id).is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn durability_roundtrip_preserves_task() {
        let durable = Arc::new(MemoryStore::new());
        let task = sample_task(5);
        let id = task.id;

        let store = TaskStore::new(durable.clone());
        store.insert(task.clone()).await.unwrap();
        drop(store);

        // Simulated restart: fresh TaskStore over the same durable store.
        let reopened = TaskStore::new(durable);
        assert_eq!(reopened.load().await.unwrap(), 1);

        let restored = reopened.get(id).unwrap();
        assert_eq!(restored.id, id);
        assert_eq!(restored.input, task.input);
        assert_eq!(restored.priority, task.priority);
        assert_eq!(restored.seq, 5);
    }

    #[tokio::test]
    async fn processing_task_resumes_as_pending() {
        let durable = Arc::new(MemoryStore::new());
        let mut task = sample_task(0);
        task.status = TaskStatus::Processing;
        let id = task.id;

        let store = TaskStore::new(durable.clone());
        store.insert(task).await.unwrap();

        let reopened = TaskStore::new(durable.clone());
        reopened.load().await.unwrap();
        assert_eq!(reopened.get(id).unwrap().status, TaskStatus::Pending);

        // The rewrite is also persisted, so a second restart agrees.
        let again = TaskStore::new(durable);
        again.load().await.unwrap();
        assert_eq!(again.get(id).unwrap().status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn update_does_not_resurrect_removed_task() {
        let durable = Arc::new(MemoryStore::new());
        let store = TaskStore::new(durable.clone());
        let task = sample_task(0);
        let id = task.id;
        store.insert(task.clone()).await.unwrap();

        // A scheduler holding a stale pending snapshot races a cancel:
        // the cancel wins, the stale write must bounce off.
        let mut stale = task;
        store.remove_if_pending(id).await.unwrap();
        stale.status = TaskStatus::Processing;
        assert!(!store.update(stale).await.unwrap());

        assert!(store.get(id).is_none());
        assert!(store.is_empty());
        assert!(durable.is_empty());
    }

    #[tokio::test]
    async fn remove_if_pending_spares_non_pending_tasks() {
        let store = TaskStore::new(Arc::new(MemoryStore::new()));
        let mut task = sample_task(0);
        task.status = TaskStatus::Processing;
        let id = task.id;
        store.insert(task).await.unwrap();

        let snapshot = store.remove_if_pending(id).await.unwrap().unwrap();
        assert_eq!(snapshot.status, TaskStatus::Processing);
        assert!(store.get(id).is_some());

        let missing = TaskId::new_v4();
        assert!(store.remove_if_pending(missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_record_is_dropped() {
        let durable = Arc::new(MemoryStore::new());
        durable.put("tasks/garbage", b"not json").await.unwrap();

        let store = TaskStore::new(durable.clone());
        let task = sample_task(0);
        store.insert(task).await.unwrap();

        let reopened = TaskStore::new(durable);
        assert_eq!(reopened.load().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn seq_counter_restored_past_loaded_tasks() {
        let durable = Arc::new(MemoryStore::new());
        let store = TaskStore::new(durable.clone());
        store.insert(sample_task(7)).await.unwrap();

        let reopened = TaskStore::new(durable);
        reopened.load().await.unwrap();
        assert_eq!(reopened.next_seq(), 8);
        assert_eq!(reopened.next_seq(), 9);
    }

    #[tokio::test]
    async fn list_filters() {
        let store = TaskStore::new(Arc::new(MemoryStore::new()));
        let mut done = sample_task(0);
        done.status = TaskStatus::Failed { error: "x".into() };
        store.insert(done).await.unwrap();
        store.insert(sample_task(1)).await.unwrap();

        assert_eq!(store.list(|t| t.status == TaskStatus::Pending).len(), 1);
        assert_eq!(store.list(|t| t.is_terminal()).len(), 1);
        assert_eq!(store.list(|_| true).len(), 2);
    }
}

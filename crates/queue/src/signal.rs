//! Per-task completion signals.
//!
//! Each task gets a watch channel fulfilled exactly once on its terminal
//! transition, so callers can await a result without polling. The sender
//! is dropped after resolution; late callers read the terminal state
//! from the task store instead.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::watch;

use zins_core::calc::CalcResult;
use zins_core::task::TaskId;

/// Terminal outcome delivered to waiters: the result, or the failure
/// message recorded on the task.
pub type TaskOutcome = Result<CalcResult, String>;

#[derive(Default)]
pub struct CompletionSignals {
    channels: Mutex<HashMap<TaskId, watch::Sender<Option<TaskOutcome>>>>,
}

impl CompletionSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a receiver for the task's terminal transition, creating the
    /// channel on first use.
    pub fn subscribe(&self, id: TaskId) -> watch::Receiver<Option<TaskOutcome>> {
        self.channels
            .lock()
            .unwrap()
            .entry(id)
            .or_insert_with(|| watch::channel(None).0)
            .subscribe()
    }

    /// Fulfill the task's signal and drop the channel. Callers must have
    /// made the terminal state visible in the task store first, so that
    /// subscribers arriving after this call still observe the outcome.
    pub fn resolve(&self, id: TaskId, outcome: TaskOutcome) {
        if let Some(sender) = self.channels.lock().unwrap().remove(&id) {
            sender.send_replace(Some(outcome));
        }
    }

    /// Drop a task's channel without fulfilling it (cancellation, cleanup).
    pub fn forget(&self, id: TaskId) {
        self.channels.lock().unwrap().remove(&id);
    }
}

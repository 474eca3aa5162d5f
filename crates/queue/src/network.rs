//! Connectivity state, as reported by the embedding application.
//!
//! This component performs no network I/O itself; it holds the abstract
//! online/offline signal and fans out transitions to subscribers through
//! a watch channel.

use tokio::sync::watch;
use tracing::info;

pub struct NetworkMonitor {
    state: watch::Sender<bool>,
}

impl NetworkMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (state, _) = watch::channel(initially_online);
        Self { state }
    }

    pub fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    /// Record a connectivity change. No-op (and no event) when the state
    /// is unchanged.
    pub fn set_online(&self, online: bool) {
        let changed = self.state.send_if_modified(|state| {
            if *state == online {
                false
            } else {
                *state = online;
                true
            }
        });
        if changed {
            info!(online, "Connectivity changed");
        }
    }

    /// Subscribe to transition events. The receiver observes the current
    /// state immediately and every change afterwards.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

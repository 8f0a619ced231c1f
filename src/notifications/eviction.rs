//! Cancellable one-shot timers keyed by notification id.
//!
//! Each scheduled eviction is a Tokio task sleeping for the notification's
//! lifetime. Its [`AbortHandle`] is kept here so an early removal cancels
//! the pending task as a plain data operation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use super::notification::NotificationId;

#[derive(Debug, Default)]
pub struct EvictionTimers {
    handles: Arc<Mutex<HashMap<NotificationId, AbortHandle>>>,
}

impl EvictionTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `on_expire` once `after` has elapsed, unless cancelled first.
    ///
    /// Returns `false` when no Tokio runtime is available; nothing is
    /// scheduled in that case.
    pub fn schedule<F>(&self, id: NotificationId, after: Duration, on_expire: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(%id, "no async runtime, notification will not auto-evict");
            return false;
        };

        // Held across spawn: the task must not deregister before it is registered.
        let registry = Arc::clone(&self.handles);
        let mut handles = self.handles.lock();
        let task = runtime.spawn(async move {
            tokio::time::sleep(after).await;
            registry.lock().remove(&id);
            on_expire();
        });
        if let Some(previous) = handles.insert(id, task.abort_handle()) {
            previous.abort();
        }
        tracing::debug!(%id, ?after, "eviction scheduled");
        true
    }

    /// Cancel the timer for `id`. Returns whether one was pending.
    pub fn cancel(&self, id: NotificationId) -> bool {
        match self.handles.lock().remove(&id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        let drained: Vec<AbortHandle> = self.handles.lock().drain().map(|(_, h)| h).collect();
        for handle in drained {
            handle.abort();
        }
    }

    pub fn is_pending(&self, id: NotificationId) -> bool {
        self.handles.lock().contains_key(&id)
    }

    pub fn pending(&self) -> usize {
        self.handles.lock().len()
    }
}

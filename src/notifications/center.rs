//! Notification center: renders the store's `notifications` slice.
//!
//! On every snapshot the center diffs the ids it has rendered against the
//! ids in the snapshot. New notifications are mounted and shown on the next
//! tick; vanished ones are hidden and unmounted after [`EXIT_GRACE`] so the
//! exit transition can play. The center never changes the slice itself:
//! the convenience constructors and dismissals all go through the store.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;

use super::notification::{Notification, NotificationId, NotificationKind};
use super::surface::{DismissHandle, RenderSurface};
use crate::state::{Snapshot, StateStore, Subscription, WeakStateStore};

/// Delay before a freshly mounted notification starts its entrance.
pub const ENTRANCE_DELAY: Duration = Duration::from_millis(10);

/// Time a hidden notification stays mounted before removal.
pub const EXIT_GRACE: Duration = Duration::from_millis(300);

pub struct NotificationCenter {
    store: StateStore,
    subscription: Subscription,
    rendered: Arc<Mutex<Vec<NotificationId>>>,
}

impl NotificationCenter {
    /// Attach a center drawing on `surface` to `store`. Notifications
    /// already in the store are rendered right away.
    pub fn new(store: StateStore, surface: Arc<dyn RenderSurface>) -> Self {
        let rendered: Arc<Mutex<Vec<NotificationId>>> = Arc::default();
        let reconciler = Reconciler {
            surface,
            rendered: Arc::clone(&rendered),
            store: store.downgrade(),
        };

        reconciler.sync(&store.snapshot());
        let subscription = store.subscribe(move |snapshot| reconciler.sync(snapshot));

        Self {
            store,
            subscription,
            rendered,
        }
    }

    /// Raise a notification; `None` picks the kind's default lifetime.
    pub fn notify(
        &self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        duration: Option<Duration>,
    ) -> NotificationId {
        let duration = duration.unwrap_or_else(|| kind.default_duration());
        self.store.add_notification(kind, title, message, duration)
    }

    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) -> NotificationId {
        self.notify(NotificationKind::Success, title, message, None)
    }

    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) -> NotificationId {
        self.notify(NotificationKind::Error, title, message, None)
    }

    pub fn warning(&self, title: impl Into<String>, message: impl Into<String>) -> NotificationId {
        self.notify(NotificationKind::Warning, title, message, None)
    }

    pub fn info(&self, title: impl Into<String>, message: impl Into<String>) -> NotificationId {
        self.notify(NotificationKind::Info, title, message, None)
    }

    /// Close a notification, as its close button would.
    pub fn dismiss(&self, id: NotificationId) {
        self.store.remove_notification(id);
    }

    /// Ids currently rendered, in display order.
    pub fn rendered_ids(&self) -> Vec<NotificationId> {
        self.rendered.lock().clone()
    }

    /// Stop following the store. Elements already drawn stay as they are.
    pub fn detach(&self) {
        self.subscription.unsubscribe();
    }
}

struct Reconciler {
    surface: Arc<dyn RenderSurface>,
    rendered: Arc<Mutex<Vec<NotificationId>>>,
    store: WeakStateStore,
}

impl Reconciler {
    fn sync(&self, snapshot: &Snapshot) {
        let (added, removed) = {
            let mut rendered = self.rendered.lock();
            let previous: HashSet<NotificationId> = rendered.iter().copied().collect();
            let current: HashSet<NotificationId> =
                snapshot.notifications.iter().map(|n| n.id).collect();

            let added: Vec<Notification> = snapshot
                .notifications
                .iter()
                .filter(|n| !previous.contains(&n.id))
                .cloned()
                .collect();
            let removed: Vec<NotificationId> = rendered
                .iter()
                .copied()
                .filter(|id| !current.contains(id))
                .collect();

            *rendered = snapshot.notifications.iter().map(|n| n.id).collect();
            (added, removed)
        };

        for notification in added {
            let id = notification.id;
            self.surface
                .mount(&notification, DismissHandle::new(id, self.store.clone()));

            let surface = Arc::clone(&self.surface);
            let rendered = Arc::clone(&self.rendered);
            defer(ENTRANCE_DELAY, move || {
                // Removed before its entrance: leave it hidden.
                if rendered.lock().contains(&id) {
                    surface.show(id);
                }
            });
        }

        for id in removed {
            self.surface.hide(id);
            let surface = Arc::clone(&self.surface);
            defer(EXIT_GRACE, move || surface.unmount(id));
        }
    }
}

/// Run `f` after `delay` on the current runtime, or right away without one.
fn defer<F>(delay: Duration, f: F)
where
    F: FnOnce() + Send + 'static,
{
    match Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                f();
            });
        }
        Err(_) => f(),
    }
}

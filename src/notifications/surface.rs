//! Render surfaces notifications are drawn on.
//!
//! A surface only draws. Dismissal goes back through the store via the
//! [`DismissHandle`] handed over at mount time, so what is drawn never
//! drifts from what the store holds.

use parking_lot::Mutex;

use super::notification::{Notification, NotificationId, NotificationKind};
use crate::state::WeakStateStore;

/// Close affordance for one rendered notification.
#[derive(Debug, Clone)]
pub struct DismissHandle {
    id: NotificationId,
    store: WeakStateStore,
}

impl DismissHandle {
    pub(crate) fn new(id: NotificationId, store: WeakStateStore) -> Self {
        Self { id, store }
    }

    pub fn id(&self) -> NotificationId {
        self.id
    }

    /// Ask the store to remove the notification. A no-op once the store is
    /// gone or the notification already left.
    pub fn dismiss(&self) {
        if let Some(store) = self.store.upgrade() {
            store.remove_notification(self.id);
        }
    }
}

/// Visual target the notification center drives.
///
/// Per notification the calls always arrive as `mount`, then at most one
/// `show`, then `hide`, then `unmount`.
pub trait RenderSurface: Send + Sync {
    /// Add the element for `notification`, not yet visible.
    fn mount(&self, notification: &Notification, dismiss: DismissHandle);

    /// Start the entrance transition.
    fn show(&self, id: NotificationId);

    /// Start the exit transition.
    fn hide(&self, id: NotificationId);

    /// Drop the element once the exit transition had time to play.
    fn unmount(&self, id: NotificationId);
}

// ---------------------------------------------------------------------------
// Tracing surface
// ---------------------------------------------------------------------------

/// Surface that writes every alert to the log, for headless runs.
#[derive(Debug, Default)]
pub struct TracingSurface;

impl RenderSurface for TracingSurface {
    fn mount(&self, notification: &Notification, _dismiss: DismissHandle) {
        let Notification {
            id,
            kind,
            title,
            message,
        } = notification;
        match kind {
            NotificationKind::Error => {
                tracing::error!(%id, icon = kind.icon(), "{title}: {message}")
            }
            NotificationKind::Warning => {
                tracing::warn!(%id, icon = kind.icon(), "{title}: {message}")
            }
            NotificationKind::Success | NotificationKind::Info => {
                tracing::info!(%id, icon = kind.icon(), "{title}: {message}")
            }
        }
    }

    fn show(&self, _id: NotificationId) {}

    fn hide(&self, id: NotificationId) {
        tracing::debug!(%id, "notification dismissed");
    }

    fn unmount(&self, _id: NotificationId) {}
}

// ---------------------------------------------------------------------------
// In-memory surface
// ---------------------------------------------------------------------------

/// Visibility of a rendered element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Mounted,
    Visible,
    Leaving,
}

/// One element on a [`MemorySurface`].
#[derive(Debug, Clone)]
pub struct RenderedElement {
    pub notification: Notification,
    pub css_class: String,
    pub icon: &'static str,
    pub phase: Phase,
    pub dismiss: DismissHandle,
}

/// Call recorded by a [`MemorySurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEvent {
    Mounted(NotificationId),
    Shown(NotificationId),
    Hidden(NotificationId),
    Unmounted(NotificationId),
}

#[derive(Debug, Default)]
struct MemoryInner {
    elements: Vec<RenderedElement>,
    events: Vec<SurfaceEvent>,
}

/// Surface that keeps elements in memory, in mount order.
#[derive(Debug, Default)]
pub struct MemorySurface {
    inner: Mutex<MemoryInner>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> Vec<NotificationId> {
        self.inner
            .lock()
            .elements
            .iter()
            .map(|e| e.notification.id)
            .collect()
    }

    pub fn element(&self, id: NotificationId) -> Option<RenderedElement> {
        self.inner
            .lock()
            .elements
            .iter()
            .find(|e| e.notification.id == id)
            .cloned()
    }

    pub fn phase(&self, id: NotificationId) -> Option<Phase> {
        self.element(id).map(|e| e.phase)
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.inner.lock().events.clone()
    }

    /// Simulate a click on the element's close button.
    pub fn click_close(&self, id: NotificationId) -> bool {
        let handle = self.element(id).map(|e| e.dismiss);
        match handle {
            Some(handle) => {
                handle.dismiss();
                true
            }
            None => false,
        }
    }

    fn set_phase(&self, id: NotificationId, phase: Phase, event: SurfaceEvent) {
        let mut inner = self.inner.lock();
        if let Some(element) = inner.elements.iter_mut().find(|e| e.notification.id == id) {
            element.phase = phase;
        }
        inner.events.push(event);
    }
}

impl RenderSurface for MemorySurface {
    fn mount(&self, notification: &Notification, dismiss: DismissHandle) {
        let mut inner = self.inner.lock();
        inner.elements.push(RenderedElement {
            notification: notification.clone(),
            css_class: notification.kind.css_class(),
            icon: notification.kind.icon(),
            phase: Phase::Mounted,
            dismiss,
        });
        inner.events.push(SurfaceEvent::Mounted(notification.id));
    }

    fn show(&self, id: NotificationId) {
        self.set_phase(id, Phase::Visible, SurfaceEvent::Shown(id));
    }

    fn hide(&self, id: NotificationId) {
        self.set_phase(id, Phase::Leaving, SurfaceEvent::Hidden(id));
    }

    fn unmount(&self, id: NotificationId) {
        let mut inner = self.inner.lock();
        inner.elements.retain(|e| e.notification.id != id);
        inner.events.push(SurfaceEvent::Unmounted(id));
    }
}

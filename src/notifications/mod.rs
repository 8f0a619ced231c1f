//! Transient user-facing alerts.
//!
//! Records live in the store's `notifications` slice; this module defines
//! them, the timers that evict them, and the [`NotificationCenter`] that
//! draws them on a [`RenderSurface`].

pub mod center;
pub mod eviction;
pub mod notification;
pub mod surface;

pub use center::{NotificationCenter, ENTRANCE_DELAY, EXIT_GRACE};
pub use eviction::EvictionTimers;
pub use notification::{IdAllocator, Notification, NotificationId, NotificationKind};
pub use surface::{
    DismissHandle, MemorySurface, Phase, RenderSurface, RenderedElement, SurfaceEvent,
    TracingSurface,
};

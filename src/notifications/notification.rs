//! Notification records held in the application state.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Identifier of a notification: its creation time in milliseconds, bumped
/// when needed so that ids handed out by one allocator strictly increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub i64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity of a notification, which picks its styling and default lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    /// How long a notification of this kind stays up unless told otherwise.
    pub fn default_duration(self) -> Duration {
        match self {
            Self::Success | Self::Info => Duration::from_millis(5000),
            Self::Error => Duration::from_millis(8000),
            Self::Warning => Duration::from_millis(6000),
        }
    }

    /// Bootstrap icon class.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Success => "bi-check-circle",
            Self::Error => "bi-exclamation-circle",
            Self::Warning => "bi-exclamation-triangle",
            Self::Info => "bi-info-circle",
        }
    }

    /// Styling class applied to the rendered element.
    pub fn css_class(self) -> String {
        format!("notification-{}", self.as_str())
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transient, user-visible alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

/// Hands out strictly increasing [`NotificationId`]s.
#[derive(Debug, Default)]
pub struct IdAllocator {
    last: AtomicI64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id based on the wall clock.
    pub fn next(&self) -> NotificationId {
        self.next_at(Utc::now().timestamp_millis())
    }

    /// Next id for a clock reading of `now_ms`. Two calls within the same
    /// millisecond still yield distinct ids.
    pub fn next_at(&self, now_ms: i64) -> NotificationId {
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now_ms.max(current + 1);
            match self.last.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return NotificationId(candidate),
                Err(actual) => current = actual,
            }
        }
    }
}

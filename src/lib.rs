//! # RFM Insights client core
//!
//! State synchronization and notifications for the RFM Insights dashboard.
//!
//! A single [`StateStore`] holds the application state and fans every change
//! out to its subscribers with one shared snapshot. The
//! [`NotificationCenter`] follows the store's `notifications` slice and
//! draws it on a render surface, while notification lifetimes are enforced
//! by cancellable timers owned by the store. Page controllers talk to the
//! backend through an [`ApiClient`] and report results back through store
//! mutations only.

pub mod api;
pub mod config;
pub mod context;
pub mod errors;
pub mod notifications;
pub mod pages;
pub mod state;
pub mod storage;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ApiClient, HttpApiClient, UserProfile};
pub use config::DashboardConfig;
pub use context::AppContext;
pub use errors::{ApiError, ConfigError, StorageError};
pub use notifications::{Notification, NotificationCenter, NotificationId, NotificationKind};
pub use state::{ApplicationState, StatePatch, StateStore, Subscription};
pub use storage::{CredentialStorage, FileCredentialStorage, MemoryCredentialStorage};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

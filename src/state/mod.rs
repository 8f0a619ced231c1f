//! Application state: the state tree, its partial updates and the store
//! that owns it.

pub mod app_state;
pub mod page;
pub mod store;

pub use app_state::{
    ApplicationState, DashboardStats, StatePatch, CUSTOMER_COUNT, INSIGHT_COUNT, MESSAGE_COUNT,
    RFM_COUNT,
};
pub use page::{page_name_from_path, DEFAULT_PAGE};
pub use store::{
    Listener, Snapshot, StateStore, Subscription, WeakStateStore, ERROR_NOTIFICATION_TITLE,
};

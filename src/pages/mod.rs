//! Page controllers: read state, call the backend, write results back
//! through the store.

pub mod dashboard;
pub mod session;

pub use dashboard::DashboardController;
pub use session::{check_authentication, AuthRedirect, SessionController};

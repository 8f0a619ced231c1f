//! Backend API client and wire types.

pub mod client;
pub mod types;

pub use client::{ApiClient, HttpApiClient};
pub use types::{AnalysisSummary, MessagePage, TokenResponse, UserProfile};

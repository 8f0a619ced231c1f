//! Shared fixtures for unit tests.

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::api::{AnalysisSummary, ApiClient, MessagePage, TokenResponse, UserProfile};
use crate::errors::ApiError;

pub(crate) fn sample_profile() -> UserProfile {
    UserProfile {
        id: 1,
        email: "ana@loja.com".into(),
        name: "Ana".into(),
        company: Some("Loja da Ana".into()),
        is_admin: false,
    }
}

fn stub_failure() -> ApiError {
    ApiError::Status {
        status: 503,
        detail: "stub backend unavailable".into(),
    }
}

/// Canned [`ApiClient`]: every `None` answer fails.
#[derive(Default)]
pub(crate) struct StubApi {
    pub profile: Option<UserProfile>,
    pub token: Option<String>,
    pub history: Option<Vec<AnalysisSummary>>,
    pub message_total: Option<u64>,
    pub calls: Mutex<Vec<String>>,
}

impl StubApi {
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: UserProfile) -> Self {
        Self {
            profile: Some(profile),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ApiClient for StubApi {
    async fn get_user_profile(&self) -> Result<UserProfile, ApiError> {
        self.calls.lock().push("get_user_profile".into());
        self.profile.clone().ok_or(ApiError::Unauthorized)
    }

    async fn login(&self, email: &str, _password: &str) -> Result<TokenResponse, ApiError> {
        self.calls.lock().push(format!("login:{email}"));
        match &self.token {
            Some(token) => Ok(TokenResponse {
                access_token: token.clone(),
                token_type: "bearer".into(),
                expires_in: 1800,
            }),
            None => Err(ApiError::Status {
                status: 401,
                detail: "Credenciais inválidas".into(),
            }),
        }
    }

    async fn get_analysis_history(&self, limit: u32) -> Result<Vec<AnalysisSummary>, ApiError> {
        self.calls.lock().push(format!("get_analysis_history:{limit}"));
        self.history.clone().ok_or_else(stub_failure)
    }

    async fn get_user_messages(&self, limit: u32, offset: u32) -> Result<MessagePage, ApiError> {
        self.calls
            .lock()
            .push(format!("get_user_messages:{limit}:{offset}"));
        self.message_total
            .map(|total| MessagePage {
                messages: Vec::new(),
                total,
            })
            .ok_or_else(stub_failure)
    }
}

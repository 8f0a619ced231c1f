//! HTTP client for the RFM Insights backend.
//!
//! Every call sends the stored session token as a bearer credential and
//! decodes JSON bodies. Non-2xx answers become [`ApiError::Status`] carrying
//! the backend's `detail` message; a 401 additionally forgets the stored
//! token so the next boot starts unauthenticated.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

use super::types::{
    decode, decode_history, AnalysisSummary, LoginRequest, MessagePage, TokenResponse,
    UserProfile,
};
use crate::errors::ApiError;
use crate::storage::CredentialStorage;

/// Fallback message when an error body carries no `detail`.
pub const GENERIC_REQUEST_ERROR: &str = "Erro na requisição";

/// Backend operations the client core depends on.
///
/// The store only ever calls [`get_user_profile`](ApiClient::get_user_profile);
/// page controllers use the rest.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// `GET /auth/me`
    async fn get_user_profile(&self) -> Result<UserProfile, ApiError>;

    /// `POST /auth/token`
    async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError>;

    /// `GET /rfm/analysis-history?limit=`
    async fn get_analysis_history(&self, limit: u32) -> Result<Vec<AnalysisSummary>, ApiError>;

    /// `GET /marketplace/messages?limit=&offset=`
    async fn get_user_messages(&self, limit: u32, offset: u32) -> Result<MessagePage, ApiError>;
}

/// [`ApiClient`] over HTTP with `reqwest`.
pub struct HttpApiClient {
    http: reqwest::Client,
    base_url: String,
    storage: Arc<dyn CredentialStorage>,
}

impl HttpApiClient {
    pub fn new(
        base_url: impl Into<String>,
        storage: Arc<dyn CredentialStorage>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            storage,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut builder = self.http.request(method.clone(), &url);
        if let Some(token) = self.storage.token()? {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        tracing::debug!(%method, %url, "api request");
        let response = builder.send().await?;
        self.handle_response(response).await
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();
        let raw = response.text().await?;
        let body: Value = if raw.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&raw).map_err(|e| {
                if status.is_success() {
                    ApiError::Decode(e.to_string())
                } else {
                    ApiError::Status {
                        status: status.as_u16(),
                        detail: GENERIC_REQUEST_ERROR.to_string(),
                    }
                }
            })?
        };

        if status.is_success() {
            return Ok(body);
        }

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("backend rejected session token, clearing it");
            self.storage.clear_token()?;
            return Err(ApiError::Unauthorized);
        }

        let detail = body
            .get("detail")
            .and_then(Value::as_str)
            .unwrap_or(GENERIC_REQUEST_ERROR)
            .to_string();
        Err(ApiError::Status {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn get_user_profile(&self) -> Result<UserProfile, ApiError> {
        let body = self.request::<()>(Method::GET, "/auth/me", None).await?;
        decode(body)
    }

    async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let credentials = LoginRequest { email, password };
        let body = self
            .request(Method::POST, "/auth/token", Some(&credentials))
            .await?;
        decode(body)
    }

    async fn get_analysis_history(&self, limit: u32) -> Result<Vec<AnalysisSummary>, ApiError> {
        let endpoint = format!("/rfm/analysis-history?limit={limit}");
        let body = self.request::<()>(Method::GET, &endpoint, None).await?;
        decode_history(body)
    }

    async fn get_user_messages(&self, limit: u32, offset: u32) -> Result<MessagePage, ApiError> {
        let endpoint = format!("/marketplace/messages?limit={limit}&offset={offset}");
        let body = self.request::<()>(Method::GET, &endpoint, None).await?;
        decode(body)
    }
}

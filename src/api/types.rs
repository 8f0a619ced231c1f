//! Wire types exchanged with the RFM Insights backend.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ApiError;

/// Authenticated user's profile as returned by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    /// Display name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

/// Response of `POST /auth/token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: u64,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Credentials posted to `POST /auth/token`. The backend reads the email
/// from the OAuth2 `username` field.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    #[serde(rename = "username")]
    pub email: &'a str,
    pub password: &'a str,
}

/// One entry of the RFM analysis history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub segment_type: Option<String>,
    /// Number of customer rows in the uploaded file.
    #[serde(default)]
    pub record_count: u64,
    #[serde(default)]
    pub column_mapping: HashMap<String, String>,
    #[serde(default)]
    pub summary: Option<Value>,
}

/// A page of generated marketing messages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagePage {
    #[serde(default)]
    pub messages: Vec<Value>,
    /// Total number of messages the user owns, across all pages.
    #[serde(default)]
    pub total: u64,
}

/// Strip the backend's `{ status, message, data }` success envelope when
/// present; bare payloads pass through unchanged.
pub(crate) fn unwrap_envelope(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") && map.contains_key("status") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Decode the analysis history, which arrives either as a bare array or
/// as `{ "history": [...] }`.
pub(crate) fn decode_history(body: Value) -> Result<Vec<AnalysisSummary>, ApiError> {
    let items = match unwrap_envelope(body) {
        Value::Array(items) => Value::Array(items),
        Value::Object(mut map) => map
            .remove("history")
            .ok_or_else(|| ApiError::Decode("missing `history` field".to_string()))?,
        other => {
            return Err(ApiError::Decode(format!(
                "expected analysis history, got {other}"
            )))
        }
    };
    serde_json::from_value(items).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Decode any JSON payload after removing the success envelope.
pub(crate) fn decode<T: for<'de> Deserialize<'de>>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(unwrap_envelope(body)).map_err(|e| ApiError::Decode(e.to_string()))
}

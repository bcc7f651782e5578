//! The uniform response envelope every admin API endpoint returns.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The wrapper around every API response body.
///
/// ```text
/// { "success": true,  "message": "Users fetched", "data": { ... } }
/// { "success": false, "message": "Email already exists", "error": "..." }
/// ```
///
/// Application-level failures (validation errors, "user not found") travel
/// inside the envelope with `success: false`. They are NOT transport
/// errors: the client returns them to the caller as normal values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the server considers the operation successful.
    pub success: bool,

    /// Human-readable message, shown to the user verbatim.
    #[serde(default)]
    pub message: String,

    /// The payload. Absent on most failures and on bodiless successes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Optional machine-oriented error detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A successful envelope carrying `data`.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }

    /// A failed envelope with a message and no data.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: None,
        }
    }

    /// `true` when `success` is set AND a payload is present.
    pub fn has_data(&self) -> bool {
        self.success && self.data.is_some()
    }

    /// The best message to show for a failed envelope: `message` if
    /// non-empty, else `error`, else `fallback`.
    pub fn failure_message(&self, fallback: &str) -> String {
        if !self.message.is_empty() {
            self.message.clone()
        } else if let Some(error) = self.error.as_deref().filter(|e| !e.is_empty()) {
            error.to_string()
        } else {
            fallback.to_string()
        }
    }

    /// Returns the payload only if the envelope reports success.
    pub fn into_data(self) -> Option<T> {
        if self.success { self.data } else { None }
    }
}

impl ApiResponse<Value> {
    /// Types the payload as `T`, but only for a successful envelope.
    ///
    /// A failed envelope keeps `success`, `message` and `error` and drops
    /// its `data`, whatever shape it has (validation details, partial
    /// records), so an application-level failure never turns into a decode
    /// error.
    ///
    /// # Errors
    /// Returns the serde error when a successful envelope's payload does
    /// not match `T`.
    pub fn into_typed<T: DeserializeOwned>(self) -> Result<ApiResponse<T>, serde_json::Error> {
        let data = match self.data {
            Some(value) if self.success => Some(serde_json::from_value(value)?),
            _ => None,
        };
        Ok(ApiResponse {
            success: self.success,
            message: self.message,
            data,
            error: self.error,
        })
    }
}

/// Page metadata attached to listings (`/users`, audit trails).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

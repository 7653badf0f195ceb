//! API client errors

use reqwest::StatusCode;
use serde_json::Value;

/// Error returned by every backend call
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend rejected the credential. The session has already been
    /// expired and navigation to the login screen requested.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Any other non-2xx response
    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// Connection, timeout or protocol failure
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not match the expected shape
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Build an error from a non-2xx status and the raw response body.
    ///
    /// The backend reports failures as `{ "message": "..." }`; when that is
    /// missing the canonical reason phrase is used.
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });

        if status == StatusCode::UNAUTHORIZED {
            ApiError::Unauthorized { message }
        } else {
            ApiError::Status {
                status: status.as_u16(),
                message,
            }
        }
    }

    /// HTTP status, when the backend answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { .. } => Some(401),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether this error already triggered the global logout
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Message suitable for an error banner
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized { message } | ApiError::Status { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

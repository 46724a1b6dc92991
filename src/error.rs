//! Error types shared by the API client and controllers.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the products backend.
///
/// Every variant is recoverable: controllers log it, notify the user and keep
/// their previous state.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server responded {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("unexpected response: {0}")]
    MalformedResponse(String),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("not authenticated")]
    Unauthenticated,
}

impl ApiError {
    /// Short detail used in user-facing notifications.
    pub fn detail(&self) -> String {
        match self {
            ApiError::Status { message, .. } if !message.is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

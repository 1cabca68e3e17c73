// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for SecondLook

use axum::http::StatusCode;
use thiserror::Error;

/// Result type alias for SecondLook operations
pub type Result<T> = std::result::Result<T, SecondLookError>;

/// SecondLook error types
#[derive(Error, Debug)]
pub enum SecondLookError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0} not configured")]
    MissingApiKey(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("{0}")]
    Upstream(String),

    #[error("No response from model")]
    EmptyResponse,

    #[error("Invalid response format")]
    InvalidResponse,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session error: {0}")]
    Session(String),
}

impl SecondLookError {
    /// HTTP status this error is reported with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingApiKey(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Api(_)
            | Self::Upstream(_)
            | Self::EmptyResponse
            | Self::InvalidResponse
            | Self::Json(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_) | Self::FileSystem(_) | Self::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_categories() {
        assert_eq!(
            SecondLookError::MissingApiKey("OPENAI_API_KEY".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            SecondLookError::InvalidRequest("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(SecondLookError::InvalidResponse.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(SecondLookError::EmptyResponse.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_missing_key_message() {
        let err = SecondLookError::MissingApiKey("OPENAI_API_KEY".into());
        assert_eq!(err.to_string(), "OPENAI_API_KEY not configured");
    }
}

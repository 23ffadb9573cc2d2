//! API error handling
//!
//! Author: hephaex@gmail.com

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use spotlink_core::SpotlinkError;

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    /// Upstream dependency answered, but not usefully
    BadGateway(String),
    /// Upstream dependency could not be reached in time
    Unavailable(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::bad_request(msg)),
            AppError::BadGateway(msg) => (
                StatusCode::BAD_GATEWAY,
                ApiError::new("UPSTREAM_ERROR", "Upstream resource failed").with_details(msg),
            ),
            AppError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::new("SERVICE_UNAVAILABLE", "Entity linker unavailable").with_details(msg),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::internal_error().with_details(msg),
            ),
        };

        (status, Json(error)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<SpotlinkError> for AppError {
    fn from(err: SpotlinkError) -> Self {
        let msg = err.to_string();
        match err {
            SpotlinkError::InvalidDocument(_) => AppError::BadRequest(msg),
            SpotlinkError::ResourceUnavailable { .. }
            | SpotlinkError::LinkerRejected(_)
            | SpotlinkError::MalformedLinkerOutput(_) => AppError::BadGateway(msg),
            SpotlinkError::RetriesExhausted { .. } | SpotlinkError::Cancelled => {
                AppError::Unavailable(msg)
            }
            SpotlinkError::ConfigError(_)
            | SpotlinkError::Serialization(_)
            | SpotlinkError::Other(_) => AppError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: SpotlinkError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(SpotlinkError::InvalidDocument("no views".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(SpotlinkError::ResourceUnavailable {
                location: "/tmp/x.txt".into(),
                reason: "not found".into(),
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(SpotlinkError::LinkerRejected("400".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(SpotlinkError::RetriesExhausted {
                attempts: 5,
                last_error: "timeout".into(),
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status_of(SpotlinkError::Cancelled), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_of(SpotlinkError::ConfigError("bad".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

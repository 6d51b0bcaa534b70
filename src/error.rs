//! Error types for the GitHub MCP Server
//!
//! This module defines the error hierarchy for all operations in the server.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the GitHub MCP Server
#[derive(Error, Debug)]
pub enum GithubMcpError {
    /// GitHub API errors
    #[error("GitHub API error: {0}")]
    Github(#[from] GithubApiError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tool registry errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Tool invocation errors
    #[error("Invocation error: {0}")]
    Invocation(#[from] InvocationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// GitHub API errors
#[derive(Error, Debug)]
pub enum GithubApiError {
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("API request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },

    #[error("Invalid path segment '{segment}' in {field}")]
    InvalidSegment { field: &'static str, segment: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Tool registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Duplicate tool id: {id}")]
    DuplicateTool { id: String },
}

/// Caller-visible invocation failures.
///
/// Every failure produced at or below the dispatcher ends up as one of these,
/// and each variant maps to a stable [`ErrorKind`] and HTTP status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    #[error("Missing GITHUB_TOKEN")]
    MissingCredential,

    #[error("Invalid request body: {message}")]
    InvalidRequestBody { message: String },

    #[error("Unknown tool: {tool}")]
    UnknownTool { tool: String },

    #[error("{message}")]
    UpstreamFailure { message: String },
}

/// Machine-readable failure classification carried in every error envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingCredential,
    InvalidRequestBody,
    UnknownTool,
    UpstreamFailure,
}

impl ErrorKind {
    /// Transport-level status for the kind. Upstream failures are reported
    /// as 502 on every binding.
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::MissingCredential => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::InvalidRequestBody | ErrorKind::UnknownTool => StatusCode::BAD_REQUEST,
            ErrorKind::UpstreamFailure => StatusCode::BAD_GATEWAY,
        }
    }
}

impl InvocationError {
    pub fn invalid_body(message: impl Into<String>) -> Self {
        InvocationError::InvalidRequestBody {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            InvocationError::MissingCredential => ErrorKind::MissingCredential,
            InvocationError::InvalidRequestBody { .. } => ErrorKind::InvalidRequestBody,
            InvocationError::UnknownTool { .. } => ErrorKind::UnknownTool,
            InvocationError::UpstreamFailure { .. } => ErrorKind::UpstreamFailure,
        }
    }
}

/// Result type alias for GitHub MCP operations
pub type Result<T> = std::result::Result<T, GithubMcpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GithubApiError::RequestFailed {
            status: 403,
            message: "rate limited".to_string(),
        };
        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_error_conversion() {
        let err: GithubMcpError = InvocationError::MissingCredential.into();
        assert!(matches!(err, GithubMcpError::Invocation(_)));
    }

    #[test]
    fn test_upstream_failure_message_is_verbatim() {
        let err = InvocationError::UpstreamFailure {
            message: "connection reset".to_string(),
        };
        assert_eq!(err.to_string(), "connection reset");
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(
            InvocationError::MissingCredential.kind().status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            InvocationError::invalid_body("x").kind().status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ErrorKind::UnknownTool.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert!(ErrorKind::UpstreamFailure.status_code().is_server_error());
    }

    #[test]
    fn test_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::UnknownTool).unwrap();
        assert_eq!(json, "\"unknown_tool\"");
    }
}

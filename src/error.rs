//! Error types for rag-mcp
//!
//! Centralized error handling using thiserror. Every failure a tool can
//! produce maps to one `ErrorKind`, which is what the host runtime sees.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All error types that can occur in rag-mcp
#[derive(Debug, Error)]
pub enum RagError {
    /// Bad or missing input parameters
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Query attempted before `configure_rag`
    #[error("RAG tools not configured. Call 'configure_rag' with your API token first")]
    NotConfigured,

    /// Backend rejected the credentials
    #[error("Authentication rejected by RAG backend (status {status})")]
    Authentication { status: u16 },

    /// Network failure, timeout or 5xx
    #[error("RAG backend unavailable: {0}")]
    BackendUnavailable(String),

    /// 2xx with a body we could not use
    #[error("Bad response from RAG backend: {0}")]
    BadResponse(String),

    /// Any other non-2xx status
    #[error("RAG backend returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Dispatcher got a name no tool answers to
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Invalid local configuration
    #[error("Config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RagError {
    /// Classification reported to the host
    pub fn kind(&self) -> ErrorKind {
        match self {
            RagError::Validation(_) => ErrorKind::Validation,
            RagError::NotConfigured => ErrorKind::NotConfigured,
            RagError::Authentication { .. } => ErrorKind::Authentication,
            RagError::BackendUnavailable(_) => ErrorKind::BackendUnavailable,
            RagError::BadResponse(_) => ErrorKind::BadResponse,
            RagError::Upstream { .. } => ErrorKind::Upstream,
            RagError::UnknownTool(_) => ErrorKind::UnknownTool,
            RagError::Config(_) | RagError::Io(_) | RagError::Json(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status carried by the error, if the backend produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            RagError::Authentication { status } | RagError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure classification on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "ValidationError")]
    Validation,
    #[serde(rename = "NotConfiguredError")]
    NotConfigured,
    #[serde(rename = "AuthenticationError")]
    Authentication,
    #[serde(rename = "BackendUnavailableError")]
    BackendUnavailable,
    #[serde(rename = "BadResponseError")]
    BadResponse,
    #[serde(rename = "UpstreamError")]
    Upstream,
    #[serde(rename = "UnknownToolError")]
    UnknownTool,
    #[serde(rename = "InternalError")]
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "ValidationError",
            ErrorKind::NotConfigured => "NotConfiguredError",
            ErrorKind::Authentication => "AuthenticationError",
            ErrorKind::BackendUnavailable => "BackendUnavailableError",
            ErrorKind::BadResponse => "BadResponseError",
            ErrorKind::Upstream => "UpstreamError",
            ErrorKind::UnknownTool => "UnknownToolError",
            ErrorKind::Internal => "InternalError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result type alias for rag-mcp operations
pub type Result<T> = std::result::Result<T, RagError>;

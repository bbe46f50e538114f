//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for CellarSync
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum CellarSyncError {
    /// Store read/write failure. Aborts a sync run.
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or HTTP failure while talking to the upstream platform.
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream response did not carry a record array.
    #[error("Unexpected upstream response: {0}")]
    UpstreamShape(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Rejected at the entry boundary before any work begins.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CellarSyncError {
    /// Whether the failure is expected to clear up on its own (timeouts,
    /// refused connections, throttling, upstream 5xx).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }

    /// Stable label suitable for logs and API payloads.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::UpstreamShape(_) => "upstream_shape",
            Self::Auth(_) => "auth",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Cancelled(_) => "cancelled",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for CellarSync operations
pub type Result<T> = std::result::Result<T, CellarSyncError>;

use thiserror::Error;
use tracing::{error, warn};

pub type Result<T> = std::result::Result<T, BranchViewError>;

/// Error taxonomy for the BranchView client.
///
/// Only the external boundaries fail: the backend API, serialization, and the
/// stale-response guard. The layout pipeline itself never errors — malformed
/// commit data degrades into fewer edges and placeholder dates instead.
#[derive(Error, Debug)]
pub enum BranchViewError {
    #[error("API request failed: {operation} - {status}: {reason}")]
    Api {
        operation: String,
        status: u16,
        reason: String,
    },

    #[error("Branch not found: {0}")]
    BranchNotFound(String),

    #[error("Stale response: generation {got} superseded by {current}")]
    StaleResponse { got: u64, current: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BranchViewError {
    /// Create an API error from a non-success backend response.
    pub fn api(operation: impl Into<String>, status: u16, reason: impl Into<String>) -> Self {
        let operation = operation.into();
        let reason = reason.into();
        error!("API request '{}' failed with {}: {}", operation, status, reason);
        BranchViewError::Api {
            operation,
            status,
            reason,
        }
    }

    /// Create a stale-response error for an out-of-order fetch result.
    pub fn stale(got: u64, current: u64) -> Self {
        warn!("Dropping stale fetch response {} (current {})", got, current);
        BranchViewError::StaleResponse { got, current }
    }

    /// Whether a retry by the caller could plausibly succeed. Staleness is
    /// not recoverable: the superseding fetch already owns the state.
    pub fn is_recoverable(&self) -> bool {
        match self {
            BranchViewError::Api { status, .. } => *status >= 500,
            BranchViewError::Http(_) => true,
            BranchViewError::Io(_) => true,
            BranchViewError::BranchNotFound(_) => false,
            BranchViewError::StaleResponse { .. } => false,
            BranchViewError::Serialization(_) => false,
        }
    }
}

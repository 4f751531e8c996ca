//! Error types for dashboard store access

use thiserror::Error;

/// Failures reported by a [`crate::DashboardStore`].
///
/// "Not found" is not an error: lookups return `None` and deletes succeed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store rejected the request body
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The object already exists or changed concurrently
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other non-success response
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Transport failure, including timeouts
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A success response we could not interpret
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures importing a single dashboard.
#[derive(Debug, Error)]
pub enum ImportError {
    /// This dashboard cannot be imported; its siblings can
    #[error("Bad dashboard {uid}: {reason}")]
    BadDashboard { uid: String, reason: String },

    /// The store failed; the whole package sync is aborted
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ImportError {
    /// Whether the caller should drop this dashboard and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ImportError::BadDashboard { .. })
    }
}

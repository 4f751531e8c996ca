//! Error types for monsync-daemon

use monsync_grafana::StoreError;
use monsync_types::ManifestMismatch;
use thiserror::Error;

/// Daemon-level errors
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// State storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Dashboard store error
    #[error("Dashboard store error: {0}")]
    Store(#[from] StoreError),

    /// Inventory source error
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Target file error
    #[error("Target error: {0}")]
    Targets(#[from] TargetError),

    /// Synchronization cycle error
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// JSON output error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Scheduler task error
    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

/// Persisted state store errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The state file is not valid JSON of the expected shape
    #[error("Invalid data: {0}")]
    InvalidData(#[from] serde_json::Error),
}

/// Inventory source errors
#[derive(Debug, Error)]
pub enum InventoryError {
    /// Transport failure, including timeouts
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The returned manifest is not the one requested
    #[error(transparent)]
    ManifestMismatch(#[from] ManifestMismatch),
}

/// Scrape-target persistence errors
#[derive(Debug, Error)]
pub enum TargetError {
    /// Package name cannot be used as a file name
    #[error("Invalid package name for a target file: {0:?}")]
    InvalidName(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why synchronizing one package failed this cycle.
///
/// Every variant is retried on the next cycle; the stored record of the
/// package is left untouched.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Manifest does not match the listed package
    #[error(transparent)]
    ManifestMismatch(#[from] ManifestMismatch),

    /// Listing or fetching from the inventory failed
    #[error("Inventory: {0}")]
    Inventory(InventoryError),

    /// The dashboard store failed
    #[error("Dashboards: {0}")]
    Dashboards(#[from] StoreError),

    /// Writing or deleting the target file failed
    #[error("Targets: {0}")]
    Targets(#[from] TargetError),

    /// Reading or writing the state store failed
    #[error("State: {0}")]
    State(#[from] StorageError),
}

impl From<InventoryError> for SyncError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::ManifestMismatch(mismatch) => SyncError::ManifestMismatch(mismatch),
            other => SyncError::Inventory(other),
        }
    }
}

/// Result type alias for daemon operations
pub type DaemonResult<T> = Result<T, DaemonError>;

/// Result type alias for state storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for inventory operations
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Result type alias for target file operations
pub type TargetResult<T> = Result<T, TargetError>;

//! Storage traits

use crate::error::StorageResult;
use async_trait::async_trait;
use monsync_types::StoredPackageRecord;

/// Durable map from package name to its last synchronized record.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the record of a package
    async fn get(&self, dnp_name: &str) -> StorageResult<Option<StoredPackageRecord>>;

    /// Insert or replace the record of `record.dnp_name`
    async fn set(&self, record: StoredPackageRecord) -> StorageResult<()>;

    /// Delete the record of a package, returning whether it existed
    async fn delete(&self, dnp_name: &str) -> StorageResult<bool>;

    /// All records, ordered by package name
    async fn list(&self) -> StorageResult<Vec<StoredPackageRecord>>;

    /// Forget every package
    async fn clear(&self) -> StorageResult<()>;
}

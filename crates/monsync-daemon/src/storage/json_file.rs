//! State store backed by a single JSON file
//!
//! The file holds one object keyed by package name. Every change rewrites
//! the whole file through a temporary sibling and a rename, so a crash
//! leaves either the old or the new content.

use super::traits::StateStore;
use crate::error::StorageResult;
use async_trait::async_trait;
use monsync_types::StoredPackageRecord;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

type Records = BTreeMap<String, StoredPackageRecord>;

/// JSON file state store
#[derive(Debug)]
pub struct JsonFileStateStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl JsonFileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> StorageResult<Records> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Records::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Records::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, records: &Records) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, serde_json::to_vec_pretty(records)?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl StateStore for JsonFileStateStore {
    async fn get(&self, dnp_name: &str) -> StorageResult<Option<StoredPackageRecord>> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.remove(dnp_name))
    }

    async fn set(&self, record: StoredPackageRecord) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        let mut records = self.read().await?;
        records.insert(record.dnp_name.clone(), record);
        self.write(&records).await
    }

    async fn delete(&self, dnp_name: &str) -> StorageResult<bool> {
        let _guard = self.lock.lock().await;
        let mut records = self.read().await?;
        if records.remove(dnp_name).is_none() {
            return Ok(false);
        }
        self.write(&records).await?;
        Ok(true)
    }

    async fn list(&self) -> StorageResult<Vec<StoredPackageRecord>> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.into_values().collect())
    }

    async fn clear(&self) -> StorageResult<()> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

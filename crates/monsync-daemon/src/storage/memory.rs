//! In-memory state store

use super::traits::StateStore;
use crate::error::StorageResult;
use async_trait::async_trait;
use monsync_types::StoredPackageRecord;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// In-memory state for development and testing
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    records: RwLock<BTreeMap<String, StoredPackageRecord>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, dnp_name: &str) -> StorageResult<Option<StoredPackageRecord>> {
        Ok(self.records.read().await.get(dnp_name).cloned())
    }

    async fn set(&self, record: StoredPackageRecord) -> StorageResult<()> {
        let mut records = self.records.write().await;
        records.insert(record.dnp_name.clone(), record);
        Ok(())
    }

    async fn delete(&self, dnp_name: &str) -> StorageResult<bool> {
        Ok(self.records.write().await.remove(dnp_name).is_some())
    }

    async fn list(&self) -> StorageResult<Vec<StoredPackageRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn clear(&self) -> StorageResult<()> {
        self.records.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monsync_types::{AppliedDashboard, Package};

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = InMemoryStateStore::new();
        let pkg = Package::new("prysm.dnp.dappnode.eth", "0.1.0");
        let record = StoredPackageRecord::new(&pkg, vec![AppliedDashboard::new("prysm-0", 1)]);

        store.set(record.clone()).await.unwrap();
        assert_eq!(store.get(&pkg.name).await.unwrap(), Some(record));

        assert!(store.delete(&pkg.name).await.unwrap());
        assert!(!store.delete(&pkg.name).await.unwrap());
        assert!(store.get(&pkg.name).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_clear_empties() {
        let store = InMemoryStateStore::new();
        for name in ["lighthouse.dnp.dappnode.eth", "geth.dnp.dappnode.eth"] {
            store
                .set(StoredPackageRecord::new(&Package::new(name, "1.0.0"), vec![]))
                .await
                .unwrap();
        }

        let names: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.dnp_name)
            .collect();
        assert_eq!(names, ["geth.dnp.dappnode.eth", "lighthouse.dnp.dappnode.eth"]);

        store.clear().await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }
}

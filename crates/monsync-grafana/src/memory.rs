//! In-memory dashboard store
//!
//! Behaves like Grafana for the operations monsync uses: uids are unique
//! across folders and dashboards, titles are unique within a folder, every
//! write bumps the version, deleting a folder deletes its dashboards.

use crate::error::{StoreError, StoreResult};
use crate::store::{DashboardStore, DashboardWrite, Folder, NewFolder, RemoteDashboard};
use async_trait::async_trait;
use monsync_types::AppliedDashboard;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredDashboard {
    id: u64,
    version: u64,
    folder_id: u64,
    model: Map<String, Value>,
}

#[derive(Debug, Default)]
struct Inner {
    folders: HashMap<String, Folder>,
    dashboards: HashMap<String, StoredDashboard>,
    next_id: u64,
    writes: usize,
    failing: HashSet<String>,
}

impl Inner {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory store for development and testing
#[derive(Debug, Default)]
pub struct InMemoryDashboardStore {
    inner: RwLock<Inner>,
}

impl InMemoryDashboardStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of dashboard writes accepted so far
    pub async fn write_count(&self) -> usize {
        self.inner.read().await.writes
    }

    /// Current state of a dashboard
    pub async fn dashboard(&self, uid: &str) -> Option<RemoteDashboard> {
        let inner = self.inner.read().await;
        inner.dashboards.get(uid).map(|d| to_remote(uid, d))
    }

    /// Uids of all dashboards, sorted
    pub async fn dashboard_uids(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        let mut uids: Vec<String> = inner.dashboards.keys().cloned().collect();
        uids.sort();
        uids
    }

    /// Current state of a folder
    pub async fn folder(&self, uid: &str) -> Option<Folder> {
        self.inner.read().await.folders.get(uid).cloned()
    }

    /// Simulate a user editing a dashboard in the UI: sets `key` and bumps
    /// the version. Returns the new version.
    pub async fn edit_dashboard(&self, uid: &str, key: &str, value: Value) -> Option<u64> {
        let mut inner = self.inner.write().await;
        let dashboard = inner.dashboards.get_mut(uid)?;
        dashboard.model.insert(key.to_string(), value);
        dashboard.version += 1;
        Some(dashboard.version)
    }

    /// Make every write to `uid` fail with a 503
    pub async fn fail_writes_for(&self, uid: &str) {
        self.inner.write().await.failing.insert(uid.to_string());
    }
}

fn to_remote(uid: &str, stored: &StoredDashboard) -> RemoteDashboard {
    let mut model = stored.model.clone();
    model.insert("id".to_string(), Value::from(stored.id));
    model.insert("version".to_string(), Value::from(stored.version));
    RemoteDashboard {
        id: stored.id,
        uid: uid.to_string(),
        version: stored.version,
        is_folder: false,
        folder_id: Some(stored.folder_id),
        model,
    }
}

fn required_str<'a>(model: &'a Map<String, Value>, key: &str) -> StoreResult<&'a str> {
    model
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| StoreError::BadRequest(format!("Dashboard {key} cannot be empty")))
}

#[async_trait]
impl DashboardStore for InMemoryDashboardStore {
    async fn get_folder(&self, uid: &str) -> StoreResult<Option<Folder>> {
        Ok(self.inner.read().await.folders.get(uid).cloned())
    }

    async fn create_folder(&self, folder: &NewFolder) -> StoreResult<Folder> {
        let mut inner = self.inner.write().await;
        if inner.folders.contains_key(&folder.uid) || inner.dashboards.contains_key(&folder.uid) {
            return Err(StoreError::Conflict(format!(
                "a folder or dashboard with uid {} already exists",
                folder.uid
            )));
        }

        let created = Folder {
            id: inner.allocate_id(),
            uid: folder.uid.clone(),
            title: folder.title.clone(),
        };
        inner.folders.insert(folder.uid.clone(), created.clone());
        Ok(created)
    }

    async fn delete_folder(&self, uid: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(folder) = inner.folders.remove(uid) {
            inner.dashboards.retain(|_, d| d.folder_id != folder.id);
        }
        Ok(())
    }

    async fn get_dashboard(&self, uid: &str) -> StoreResult<Option<RemoteDashboard>> {
        let inner = self.inner.read().await;
        if let Some(folder) = inner.folders.get(uid) {
            let mut model = Map::new();
            model.insert("id".to_string(), Value::from(folder.id));
            model.insert("uid".to_string(), Value::from(folder.uid.clone()));
            model.insert("title".to_string(), Value::from(folder.title.clone()));
            return Ok(Some(RemoteDashboard {
                id: folder.id,
                uid: folder.uid.clone(),
                version: 1,
                is_folder: true,
                folder_id: None,
                model,
            }));
        }
        Ok(inner.dashboards.get(uid).map(|d| to_remote(uid, d)))
    }

    async fn create_or_update_dashboard(
        &self,
        write: &DashboardWrite,
    ) -> StoreResult<AppliedDashboard> {
        let mut inner = self.inner.write().await;
        let uid = required_str(&write.dashboard, "uid")?.to_string();
        let title = required_str(&write.dashboard, "title")?;

        if inner.failing.contains(&uid) {
            return Err(StoreError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        if inner.folders.contains_key(&uid) {
            return Err(StoreError::BadRequest(format!("uid {uid} belongs to a folder")));
        }
        if write.folder_id != 0 && !inner.folders.values().any(|f| f.id == write.folder_id) {
            return Err(StoreError::BadRequest("Folder not found".to_string()));
        }

        let title_taken = inner.dashboards.iter().any(|(other_uid, d)| {
            *other_uid != uid
                && d.folder_id == write.folder_id
                && d.model.get("title").and_then(Value::as_str) == Some(title)
        });
        if title_taken {
            return Err(StoreError::Conflict(
                "A dashboard with the same name in the folder already exists".to_string(),
            ));
        }

        let mut model = write.dashboard.clone();
        let claimed_id = model.remove("id").and_then(|v| v.as_u64());
        model.remove("version");

        let existing = inner.dashboards.get(&uid).map(|d| (d.id, d.version));
        let (id, version) = match existing {
            Some(_) if !write.overwrite => {
                return Err(StoreError::Conflict(format!("dashboard {uid} already exists")));
            }
            Some((id, version)) => (id, version + 1),
            None if claimed_id.is_some() => {
                return Err(StoreError::Api {
                    status: 404,
                    message: "Dashboard not found".to_string(),
                });
            }
            None => (inner.allocate_id(), 1),
        };

        inner.dashboards.insert(
            uid.clone(),
            StoredDashboard {
                id,
                version,
                folder_id: write.folder_id,
                model,
            },
        );
        inner.writes += 1;

        Ok(AppliedDashboard::new(uid, version))
    }

    async fn delete_dashboard(&self, uid: &str) -> StoreResult<()> {
        self.inner.write().await.dashboards.remove(uid);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(uid: &str, folder_id: u64) -> DashboardWrite {
        let Value::Object(dashboard) = json!({ "uid": uid, "title": uid }) else {
            unreachable!()
        };
        DashboardWrite {
            dashboard,
            folder_id,
            overwrite: true,
            message: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_writes_bump_version() {
        let store = InMemoryDashboardStore::new();
        let first = store.create_or_update_dashboard(&write("a", 0)).await.unwrap();
        let second = store.create_or_update_dashboard(&write("a", 0)).await.unwrap();

        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        assert_eq!(store.write_count().await, 2);
    }

    #[tokio::test]
    async fn test_folder_delete_cascades() {
        let store = InMemoryDashboardStore::new();
        let folder = store
            .create_folder(&NewFolder {
                uid: "prysm".to_string(),
                title: "prysm".to_string(),
            })
            .await
            .unwrap();
        store.create_or_update_dashboard(&write("prysm-0", folder.id)).await.unwrap();
        store.create_or_update_dashboard(&write("other", 0)).await.unwrap();

        store.delete_folder("prysm").await.unwrap();
        store.delete_folder("prysm").await.unwrap();

        assert_eq!(store.dashboard_uids().await, vec!["other".to_string()]);
    }

    #[tokio::test]
    async fn test_folder_uid_reads_as_folder() {
        let store = InMemoryDashboardStore::new();
        store
            .create_folder(&NewFolder {
                uid: "prysm".to_string(),
                title: "prysm".to_string(),
            })
            .await
            .unwrap();

        let remote = store.get_dashboard("prysm").await.unwrap().unwrap();
        assert!(remote.is_folder);
        assert!(matches!(
            store.create_or_update_dashboard(&write("prysm", 0)).await,
            Err(StoreError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_title_is_bad_request() {
        let store = InMemoryDashboardStore::new();
        let mut bad = write("a", 0);
        bad.dashboard.remove("title");
        assert!(matches!(
            store.create_or_update_dashboard(&bad).await,
            Err(StoreError::BadRequest(_))
        ));
    }
}

//! Dashboard store trait definitions

use crate::error::StoreResult;
use async_trait::async_trait;
use monsync_types::AppliedDashboard;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A dashboard folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: u64,
    pub uid: String,
    pub title: String,
}

/// Request to create a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewFolder {
    pub uid: String,
    pub title: String,
}

/// A dashboard as currently held by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDashboard {
    pub id: u64,
    pub uid: String,
    pub version: u64,
    /// The uid resolves to a folder, not a dashboard
    pub is_folder: bool,
    pub folder_id: Option<u64>,
    /// Full dashboard model, including `id` and `version`
    pub model: Map<String, Value>,
}

impl RemoteDashboard {
    pub fn applied(&self) -> AppliedDashboard {
        AppliedDashboard::new(self.uid.clone(), self.version)
    }
}

/// Create-or-update request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardWrite {
    pub dashboard: Map<String, Value>,
    pub folder_id: u64,
    pub overwrite: bool,
    pub message: String,
}

/// Remote store of folders and dashboards, addressed by uid.
#[async_trait]
pub trait DashboardStore: Send + Sync {
    /// Get a folder by uid
    async fn get_folder(&self, uid: &str) -> StoreResult<Option<Folder>>;

    /// Create a folder
    async fn create_folder(&self, folder: &NewFolder) -> StoreResult<Folder>;

    /// Delete a folder and the dashboards inside it; no-op if absent
    async fn delete_folder(&self, uid: &str) -> StoreResult<()>;

    /// Get a dashboard by uid
    async fn get_dashboard(&self, uid: &str) -> StoreResult<Option<RemoteDashboard>>;

    /// Create or update a dashboard
    async fn create_or_update_dashboard(
        &self,
        write: &DashboardWrite,
    ) -> StoreResult<AppliedDashboard>;

    /// Delete a dashboard by uid; no-op if absent
    async fn delete_dashboard(&self, uid: &str) -> StoreResult<()>;
}

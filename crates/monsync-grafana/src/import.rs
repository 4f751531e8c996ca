//! Dashboard upsert protocol
//!
//! monsync only remembers the version it last wrote for each dashboard. If
//! the store holds a newer version, someone edited the dashboard in the UI and
//! monsync leaves it alone. No locking is involved: the comparison between the
//! remembered and the remote version is the only coordination.

use crate::error::{ImportError, StoreError, StoreResult};
use crate::store::{DashboardStore, DashboardWrite, Folder, NewFolder};
use monsync_types::{
    dashboard_title, dashboard_uid, folder_title, folder_uid, AppliedDashboard, Dashboard,
};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::Arc;

/// How the remote version relates to the version monsync last applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionDrift {
    /// Nothing recorded for this uid
    Untracked,
    /// Remote is exactly what monsync wrote
    Equal,
    /// Remote is older than what monsync wrote (store restored or recreated)
    Behind,
    /// Remote moved on since monsync wrote it: a user edit
    Ahead,
}

impl VersionDrift {
    pub fn classify(prev_applied: Option<u64>, remote: u64) -> Self {
        match prev_applied {
            None => VersionDrift::Untracked,
            Some(prev) => match remote.cmp(&prev) {
                Ordering::Less => VersionDrift::Behind,
                Ordering::Equal => VersionDrift::Equal,
                Ordering::Greater => VersionDrift::Ahead,
            },
        }
    }

    /// Whether writing now would clobber somebody else's change.
    pub fn has_user_edits(self) -> bool {
        matches!(self, VersionDrift::Ahead)
    }
}

/// One dashboard to import for a package.
#[derive(Debug, Clone, Copy)]
pub struct ImportRequest<'a> {
    pub dashboard: &'a Dashboard,
    pub package_name: &'a str,
    pub package_version: &'a str,
    /// Position of the dashboard in the package manifest
    pub index: usize,
    /// Version returned by the previous import of this uid
    pub prev_version: Option<u64>,
}

/// Imports package dashboards into a [`DashboardStore`].
#[derive(Clone)]
pub struct DashboardImporter {
    store: Arc<dyn DashboardStore>,
}

impl DashboardImporter {
    pub fn new(store: Arc<dyn DashboardStore>) -> Self {
        Self { store }
    }

    /// Create, update or skip one dashboard.
    ///
    /// Returns the `{uid, version}` now in the store. When the write is
    /// skipped (user edit, or nothing to change) that is the remote version.
    pub async fn import_dashboard(
        &self,
        request: ImportRequest<'_>,
    ) -> Result<AppliedDashboard, ImportError> {
        let ImportRequest {
            dashboard,
            package_name,
            package_version,
            index,
            prev_version,
        } = request;

        let uid = dashboard_uid(package_name, dashboard.uid.as_deref(), index);
        let title = dashboard_title(package_name, dashboard.title.as_deref(), index);
        let mut model = dashboard.to_model(&uid, &title);

        let folder = self.ensure_folder(package_name).await?;

        if let Some(current) = self.store.get_dashboard(&uid).await? {
            if current.is_folder {
                return Err(ImportError::BadDashboard {
                    uid,
                    reason: "uid belongs to a folder".to_string(),
                });
            }

            let drift = VersionDrift::classify(prev_version, current.version);
            if drift.has_user_edits() {
                tracing::info!(
                    package = %package_name,
                    uid = %uid,
                    applied = ?prev_version,
                    remote = current.version,
                    "Dashboard edited since last sync, leaving it untouched"
                );
                return Ok(current.applied());
            }

            if current.folder_id == Some(folder.id) && same_content(&current.model, &model) {
                tracing::debug!(
                    package = %package_name,
                    uid = %uid,
                    version = current.version,
                    ?drift,
                    "Dashboard already up to date"
                );
                return Ok(current.applied());
            }

            model.insert("id".to_string(), Value::from(current.id));
        }

        let write = DashboardWrite {
            dashboard: model,
            folder_id: folder.id,
            overwrite: true,
            message: format!("Automatic update to version {}", package_version),
        };

        match self.store.create_or_update_dashboard(&write).await {
            Ok(applied) => {
                tracing::info!(
                    package = %package_name,
                    uid = %applied.uid,
                    version = applied.version,
                    "Imported dashboard"
                );
                Ok(applied)
            }
            Err(StoreError::BadRequest(reason)) | Err(StoreError::Conflict(reason)) => {
                Err(ImportError::BadDashboard { uid, reason })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove everything a package owns in the store.
    ///
    /// Deleting the folder deletes the dashboards inside it; the recorded uids
    /// are deleted afterwards in case a user moved one out of the folder.
    pub async fn remove_package(
        &self,
        package_name: &str,
        recorded: &[AppliedDashboard],
    ) -> StoreResult<()> {
        let folder = folder_uid(package_name);
        self.store.delete_folder(&folder).await?;
        for dashboard in recorded {
            self.store.delete_dashboard(&dashboard.uid).await?;
        }
        tracing::info!(package = %package_name, folder = %folder, "Removed package dashboards");
        Ok(())
    }

    /// Read or create the package folder.
    ///
    /// Losing a creation race to another writer is fine: the folder exists.
    async fn ensure_folder(&self, package_name: &str) -> StoreResult<Folder> {
        let uid = folder_uid(package_name);
        if let Some(folder) = self.store.get_folder(&uid).await? {
            return Ok(folder);
        }

        let new_folder = NewFolder {
            uid: uid.clone(),
            title: folder_title(package_name),
        };
        match self.store.create_folder(&new_folder).await {
            Ok(folder) => {
                tracing::debug!(package = %package_name, folder = %uid, "Created folder");
                Ok(folder)
            }
            Err(StoreError::Conflict(reason)) => {
                tracing::debug!(folder = %uid, "Folder created concurrently");
                self.store
                    .get_folder(&uid)
                    .await?
                    .ok_or(StoreError::Conflict(reason))
            }
            Err(e) => Err(e),
        }
    }
}

/// Remote model equals the model about to be written, ignoring the
/// store-assigned keys.
fn same_content(remote: &Map<String, Value>, model: &Map<String, Value>) -> bool {
    remote.len() == model.len() + 2
        && remote
            .iter()
            .filter(|(key, _)| key.as_str() != "id" && key.as_str() != "version")
            .all(|(key, value)| model.get(key) == Some(value))
}

//! Durable fingerprint of what was last applied for a package

use crate::package::Package;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dashboard as last written (or observed) in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppliedDashboard {
    pub uid: String,
    pub version: u64,
}

impl AppliedDashboard {
    pub fn new(uid: impl Into<String>, version: u64) -> Self {
        Self {
            uid: uid.into(),
            version,
        }
    }
}

/// What monsync last synchronized for one package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredPackageRecord {
    pub dnp_name: String,
    pub version: String,
    #[serde(default)]
    pub dashboards: Vec<AppliedDashboard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
}

impl StoredPackageRecord {
    pub fn new(package: &Package, dashboards: Vec<AppliedDashboard>) -> Self {
        Self {
            dnp_name: package.name.clone(),
            version: package.version.clone(),
            dashboards,
            synced_at: Some(Utc::now()),
        }
    }

    /// Version last applied for the dashboard `uid`, if any.
    pub fn applied_version(&self, uid: &str) -> Option<u64> {
        self.dashboards
            .iter()
            .find(|d| d.uid == uid)
            .map(|d| d.version)
    }

    /// Whether this record already reflects `package`.
    pub fn is_current(&self, package: &Package) -> bool {
        self.dnp_name == package.name && self.version == package.version
    }
}

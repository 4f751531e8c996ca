//! Package manifests as fetched from the inventory source

use crate::package::Package;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The monitoring-relevant part of a package manifest.
///
/// Dashboards and targets stay untyped here, down to the shape of each
/// section; they are parsed entry by entry in [`crate::validate_manifest`] so
/// one malformed entry or section cannot poison the whole manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: String,
    pub version: String,
    /// Normally a list of dashboard models.
    #[serde(default, alias = "dashboards", skip_serializing_if = "Option::is_none")]
    pub grafana_dashboards: Option<Value>,
    /// Normally a list of target groups, possibly nested one level deep.
    #[serde(default, alias = "targets", skip_serializing_if = "Option::is_none")]
    pub prometheus_targets: Option<Value>,
}

/// The fetched manifest does not describe the listed package.
///
/// Usually a race between listing the inventory and fetching the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestMismatch {
    #[error("manifest name mismatch: expected {expected}, got {actual}")]
    Name { expected: String, actual: String },

    #[error("manifest version mismatch for {name}: expected {expected}, got {actual}")]
    Version {
        name: String,
        expected: String,
        actual: String,
    },
}

impl Manifest {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            grafana_dashboards: None,
            prometheus_targets: None,
        }
    }

    /// Check that this manifest belongs to exactly `package`.
    pub fn ensure_matches(&self, package: &Package) -> Result<(), ManifestMismatch> {
        if self.name != package.name {
            return Err(ManifestMismatch::Name {
                expected: package.name.clone(),
                actual: self.name.clone(),
            });
        }
        if self.version != package.version {
            return Err(ManifestMismatch::Version {
                name: package.name.clone(),
                expected: package.version.clone(),
                actual: self.version.clone(),
            });
        }
        Ok(())
    }
}

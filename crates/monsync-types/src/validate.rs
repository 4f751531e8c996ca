//! Manifest validation
//!
//! Untyped manifest entries are parsed here and nowhere else. Invalid entries
//! are logged and dropped; validation itself never fails, so a single bad
//! entry cannot keep a package from being recorded as synchronized.

use crate::dashboard::{json_kind, Dashboard};
use crate::manifest::Manifest;
use crate::package::short_name;
use crate::target::Target;
use crate::uid::{dashboard_uid, in_namespace};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Why a manifest entry was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("bad target: {0}")]
    BadTarget(String),

    #[error("bad dashboard: {0}")]
    BadDashboard(String),
}

/// A dashboard accepted for import, with its manifest position and the uid it
/// will be stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestDashboard {
    pub index: usize,
    pub uid: String,
    pub dashboard: Dashboard,
}

/// The entries of a manifest that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedManifest {
    pub name: String,
    pub version: String,
    /// Ordered by manifest position.
    pub dashboards: Vec<ManifestDashboard>,
    pub targets: Vec<Target>,
    pub rejected: Vec<ValidationError>,
}

/// Validate the dashboards and targets `package_name` declares.
///
/// - A section holding a lone object is read as a one-entry list; any other
///   non-list section is rejected as a whole, leaving the other section intact.
/// - Target groups nested one level deep are flattened first.
/// - A target whose `job` label does not end with the package short name is
///   dropped: a wrong job label would misattribute metrics.
/// - Dashboards are never rejected for their uid; it is re-derived into the
///   package namespace. Only non-object entries and uid duplicates are dropped.
pub fn validate_manifest(package_name: &str, manifest: Manifest) -> ValidatedManifest {
    let mut rejected = Vec::new();

    let target_entries = section_entries(manifest.prometheus_targets, "targets")
        .unwrap_or_else(|reason| {
            reject(package_name, ValidationError::BadTarget(reason), &mut rejected);
            Vec::new()
        });
    let dashboard_entries = section_entries(manifest.grafana_dashboards, "dashboards")
        .unwrap_or_else(|reason| {
            reject(package_name, ValidationError::BadDashboard(reason), &mut rejected);
            Vec::new()
        });

    let mut targets = Vec::new();
    for entry in flatten_one_level(target_entries) {
        match parse_target(package_name, entry) {
            Ok(target) => targets.push(target),
            Err(e) => {
                tracing::warn!(package = %package_name, error = %e, "Dropping invalid target");
                rejected.push(e);
            }
        }
    }

    let mut dashboards = Vec::new();
    let mut seen = HashSet::new();
    for (index, entry) in dashboard_entries.into_iter().enumerate() {
        match parse_dashboard(package_name, index, entry, &mut seen) {
            Ok(dashboard) => dashboards.push(dashboard),
            Err(e) => {
                tracing::warn!(package = %package_name, index, error = %e, "Dropping invalid dashboard");
                rejected.push(e);
            }
        }
    }

    ValidatedManifest {
        name: manifest.name,
        version: manifest.version,
        dashboards,
        targets,
        rejected,
    }
}

/// Entries of a manifest section: a list, a lone object, or nothing.
fn section_entries(section: Option<Value>, what: &str) -> Result<Vec<Value>, String> {
    match section {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(entries)) => Ok(entries),
        Some(entry @ Value::Object(_)) => Ok(vec![entry]),
        Some(other) => Err(format!("{what} section must be a list, got {}", json_kind(&other))),
    }
}

fn reject(package_name: &str, error: ValidationError, rejected: &mut Vec<ValidationError>) {
    tracing::warn!(package = %package_name, error = %error, "Dropping invalid manifest section");
    rejected.push(error);
}

fn flatten_one_level(entries: Vec<Value>) -> Vec<Value> {
    entries
        .into_iter()
        .flat_map(|entry| match entry {
            Value::Array(group) => group,
            single => vec![single],
        })
        .collect()
}

fn parse_target(package_name: &str, entry: Value) -> Result<Target, ValidationError> {
    let kind = json_kind(&entry);
    let target: Target = serde_json::from_value(entry)
        .map_err(|e| ValidationError::BadTarget(format!("cannot parse {kind}: {e}")))?;

    let short = short_name(package_name);
    if let Some(job) = target.job() {
        if !job.ends_with(short) {
            return Err(ValidationError::BadTarget(format!(
                "job label '{job}' must end with '{short}'"
            )));
        }
    }
    Ok(target)
}

fn parse_dashboard(
    package_name: &str,
    index: usize,
    entry: Value,
    seen: &mut HashSet<String>,
) -> Result<ManifestDashboard, ValidationError> {
    let dashboard = Dashboard::from_value(entry)?;
    let uid = dashboard_uid(package_name, dashboard.uid.as_deref(), index);

    if dashboard.uid.as_deref() != Some(uid.as_str()) {
        tracing::debug!(
            package = %package_name,
            declared = ?dashboard.uid,
            derived = %uid,
            "Dashboard uid re-derived into package namespace"
        );
    }
    if !seen.insert(uid.clone()) {
        return Err(ValidationError::BadDashboard(format!(
            "uid '{uid}' is already used by another dashboard of this package"
        )));
    }
    if !in_namespace(package_name, &uid) {
        tracing::debug!(package = %package_name, uid = %uid, "Dashboard uid truncated out of namespace");
    }

    Ok(ManifestDashboard {
        index,
        uid,
        dashboard,
    })
}

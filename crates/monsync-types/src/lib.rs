//! monsync Types - Core types for monitoring synchronization
//!
//! monsync keeps a Grafana dashboard store and a directory of Prometheus
//! file_sd target files in step with the packages installed on a node.
//! This crate holds the pure parts of that engine: no I/O happens here.
//!
//! ## Key Concepts
//!
//! - **Package**: name + opaque version reported by the inventory source
//! - **Short name**: package name without its known domain suffix
//! - **Manifest**: the monitoring artifacts a package ships
//! - **Dashboard uid**: a namespaced, sanitized identifier derived per package
//! - **StoredPackageRecord**: what was last applied for a package

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod dashboard;
pub mod manifest;
pub mod package;
pub mod record;
pub mod target;
pub mod uid;
pub mod validate;

pub use dashboard::Dashboard;
pub use manifest::{Manifest, ManifestMismatch};
pub use package::{short_name, Package, KNOWN_SUFFIXES};
pub use record::{AppliedDashboard, StoredPackageRecord};
pub use target::{Target, TargetLabels};
pub use uid::{
    dashboard_title, dashboard_uid, folder_title, folder_uid, in_namespace, sanitize_uid,
    MAX_UID_LEN,
};
pub use validate::{validate_manifest, ManifestDashboard, ValidatedManifest, ValidationError};

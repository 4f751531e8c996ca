//! # monsync Grafana
//!
//! Everything monsync does against the dashboard store.
//!
//! - [`DashboardStore`]: the store seam (folders + dashboards by uid)
//! - [`GrafanaApiClient`]: HTTP implementation against the Grafana API
//! - [`InMemoryDashboardStore`]: Grafana-like store for tests
//! - [`DashboardImporter`]: the upsert protocol that refuses to overwrite
//!   dashboards a user edited after monsync last wrote them

#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod import;
pub mod memory;
pub mod store;

pub use client::GrafanaApiClient;
pub use error::{ImportError, StoreError, StoreResult};
pub use import::{DashboardImporter, ImportRequest, VersionDrift};
pub use memory::InMemoryDashboardStore;
pub use store::{DashboardStore, DashboardWrite, Folder, NewFolder, RemoteDashboard};

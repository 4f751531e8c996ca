//! monsync daemon library
//!
//! This module provides the core components for the monsync daemon:
//! - Configuration loading
//! - Inventory source and scrape-target writer
//! - Persisted state storage backends
//! - Scheduler and reconciliation
//! - Daemon lifecycle management

pub mod config;
pub mod daemon;
pub mod error;
pub mod inventory;
pub mod scheduler;
pub mod storage;
pub mod targets;

pub use config::DaemonConfig;
pub use daemon::Daemon;
pub use error::{DaemonError, DaemonResult, StorageError, SyncError};
pub use inventory::{DappmanagerClient, InventorySource};
pub use scheduler::{CycleReport, Scheduler};
pub use storage::{InMemoryStateStore, JsonFileStateStore, StateStore};
pub use targets::{FileTargetWriter, TargetWriter};

//! Storage layer for monsync-daemon
//!
//! Persists the [`StoredPackageRecord`](monsync_types::StoredPackageRecord)
//! of every synchronized package between cycles and restarts.

mod json_file;
mod memory;
mod traits;

pub use json_file::JsonFileStateStore;
pub use memory::InMemoryStateStore;
pub use traits::StateStore;

use crate::config::StateConfig;
use std::sync::Arc;

/// Open the state store selected by `config`.
pub fn open_state_store(config: &StateConfig) -> Arc<dyn StateStore> {
    match config {
        StateConfig::Memory => Arc::new(InMemoryStateStore::new()),
        StateConfig::Json { path } => Arc::new(JsonFileStateStore::new(path.clone())),
    }
}

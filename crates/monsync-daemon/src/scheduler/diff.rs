//! Inventory vs. stored state

use monsync_types::{Package, StoredPackageRecord};
use std::collections::{HashMap, HashSet};

/// A package whose stored record is missing or for another version
#[derive(Debug, Clone, PartialEq)]
pub struct ChangedPackage {
    pub package: Package,
    /// Record of the last successful sync, if any
    pub previous: Option<StoredPackageRecord>,
}

/// Work for one cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncDiff {
    /// In inventory order
    pub changed: Vec<ChangedPackage>,
    /// Records whose package left the inventory, ordered by name
    pub removed: Vec<StoredPackageRecord>,
}

impl SyncDiff {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

/// Compare the inventory against the stored records.
///
/// A package is changed when it has no record or its record holds another
/// version. A record is removed when no inventory package has its name.
/// Should the inventory list a name twice, the first entry wins.
pub fn diff_inventory(inventory: &[Package], stored: Vec<StoredPackageRecord>) -> SyncDiff {
    let mut stored: HashMap<String, StoredPackageRecord> = stored
        .into_iter()
        .map(|record| (record.dnp_name.clone(), record))
        .collect();

    let mut seen = HashSet::new();
    let mut changed = Vec::new();
    for package in inventory {
        if !seen.insert(package.name.as_str()) {
            tracing::warn!(package = %package.name, "Package listed twice by the inventory");
            continue;
        }

        match stored.remove(&package.name) {
            Some(record) if record.is_current(package) => {}
            previous => changed.push(ChangedPackage {
                package: package.clone(),
                previous,
            }),
        }
    }

    let mut removed: Vec<_> = stored.into_values().collect();
    removed.sort_by(|a, b| a.dnp_name.cmp(&b.dnp_name));

    SyncDiff { changed, removed }
}

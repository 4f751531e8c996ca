//! Periodic synchronization of the node's packages

mod diff;
mod reconciler;

pub use diff::{diff_inventory, ChangedPackage, SyncDiff};
pub use reconciler::{CycleReport, PackageFailure, Scheduler};

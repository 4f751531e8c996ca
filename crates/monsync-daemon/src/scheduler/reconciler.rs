//! Reconciliation loop and scheduler

use super::diff::{diff_inventory, ChangedPackage};
use crate::config::SchedulerConfig;
use crate::error::SyncError;
use crate::inventory::InventorySource;
use crate::storage::StateStore;
use crate::targets::TargetWriter;
use futures::stream::{self, StreamExt};
use monsync_grafana::{DashboardImporter, DashboardStore, ImportError, ImportRequest};
use monsync_types::{validate_manifest, StoredPackageRecord};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

/// Outcome of one synchronization cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleReport {
    /// Packages synchronized and committed
    pub updated: Vec<String>,
    /// Packages whose dashboards, targets and record were removed
    pub removed: Vec<String>,
    /// Packages left for the next cycle
    pub failed: Vec<PackageFailure>,
}

/// A package that could not be synchronized this cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageFailure {
    pub package: String,
    pub error: String,
}

impl CycleReport {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.removed.is_empty() && self.failed.is_empty()
    }

    fn record(&mut self, package: String, result: Result<(), SyncError>, removal: bool) {
        match result {
            Ok(()) if removal => self.removed.push(package),
            Ok(()) => self.updated.push(package),
            Err(e) => self.failed.push(PackageFailure {
                package,
                error: e.to_string(),
            }),
        }
    }
}

/// Drives synchronization cycles
pub struct Scheduler {
    config: SchedulerConfig,
    inventory: Arc<dyn InventorySource>,
    importer: DashboardImporter,
    targets: Arc<dyn TargetWriter>,
    state: Arc<dyn StateStore>,
    shutdown: watch::Sender<bool>,
}

impl Scheduler {
    /// Create a new scheduler
    pub fn new(
        config: SchedulerConfig,
        inventory: Arc<dyn InventorySource>,
        dashboards: Arc<dyn DashboardStore>,
        targets: Arc<dyn TargetWriter>,
        state: Arc<dyn StateStore>,
    ) -> Arc<Self> {
        let (shutdown, _) = watch::channel(false);

        Arc::new(Self {
            config,
            inventory,
            importer: DashboardImporter::new(dashboards),
            targets,
            state,
            shutdown,
        })
    }

    /// Run a cycle now and then on every interval until [`Scheduler::stop`].
    ///
    /// A cycle always completes before the next one starts; a tick that falls
    /// due during a long cycle is delayed, not queued.
    pub async fn start(self: Arc<Self>) {
        let mut shutdown = self.shutdown.subscribe();
        let mut ticker = interval(self.config.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.config.interval().as_secs(),
            max_concurrent = self.config.max_concurrent_packages,
            "Scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = ticker.tick() => {
                    match self.reconcile().await {
                        Ok(report) => log_report(&report),
                        Err(e) => tracing::error!(error = %e, "Synchronization cycle failed"),
                    }
                }
            }
        }

        tracing::info!("Scheduler stopped");
    }

    /// Stop the scheduler. A cycle in progress runs to completion.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    /// Run a single synchronization cycle.
    ///
    /// Fails only when the inventory or the stored state cannot be read;
    /// per-package failures are reported in the [`CycleReport`].
    pub async fn reconcile(&self) -> Result<CycleReport, SyncError> {
        let inventory = self.inventory.list_packages().await?;
        let stored = self.state.list().await?;
        let diff = diff_inventory(&inventory, stored);

        let mut report = CycleReport::default();
        if diff.is_empty() {
            return Ok(report);
        }

        tracing::debug!(
            changed = diff.changed.len(),
            removed = diff.removed.len(),
            "Computed inventory diff"
        );

        let limit = self.config.max_concurrent_packages.max(1);

        let synced: Vec<_> = stream::iter(diff.changed)
            .map(|changed| async move {
                let name = changed.package.name.clone();
                let result = self.sync_package(&changed).await;
                if let Err(e) = &result {
                    tracing::error!(
                        package = %changed.package.name,
                        version = %changed.package.version,
                        error = %e,
                        "Package sync failed, retrying next cycle"
                    );
                }
                (name, result.map(|_| ()))
            })
            .buffer_unordered(limit)
            .collect()
            .await;

        for (name, result) in synced {
            report.record(name, result, false);
        }

        let removed: Vec<_> = stream::iter(diff.removed)
            .map(|record| async move {
                let result = self.remove_package(&record).await;
                if let Err(e) = &result {
                    tracing::error!(
                        package = %record.dnp_name,
                        error = %e,
                        "Package removal failed, retrying next cycle"
                    );
                }
                (record.dnp_name, result)
            })
            .buffer_unordered(limit)
            .collect()
            .await;

        for (name, result) in removed {
            report.record(name, result, true);
        }

        Ok(report)
    }

    /// Converge one new or updated package and commit its record.
    async fn sync_package(&self, changed: &ChangedPackage) -> Result<StoredPackageRecord, SyncError> {
        let package = &changed.package;

        let manifest = self.inventory.fetch_manifest(package).await?;
        manifest.ensure_matches(package)?;

        let validated = validate_manifest(&package.name, manifest);

        if validated.targets.is_empty() {
            self.targets.delete_targets(&package.name).await?;
        } else {
            self.targets
                .write_targets(&package.name, &validated.targets)
                .await?;
        }

        let mut applied = Vec::with_capacity(validated.dashboards.len());
        for entry in &validated.dashboards {
            let prev_version = changed
                .previous
                .as_ref()
                .and_then(|record| record.applied_version(&entry.uid));

            let request = ImportRequest {
                dashboard: &entry.dashboard,
                package_name: &package.name,
                package_version: &package.version,
                index: entry.index,
                prev_version,
            };

            match self.importer.import_dashboard(request).await {
                Ok(dashboard) => applied.push(dashboard),
                Err(ImportError::BadDashboard { uid, reason }) => {
                    tracing::warn!(
                        package = %package.name,
                        uid = %uid,
                        reason = %reason,
                        "Dashboard rejected by the store, skipping"
                    );
                }
                Err(ImportError::Store(e)) => return Err(e.into()),
            }
        }

        let record = StoredPackageRecord::new(package, applied);
        self.state.set(record.clone()).await?;

        tracing::info!(
            package = %package.name,
            version = %package.version,
            dashboards = record.dashboards.len(),
            targets = validated.targets.len(),
            "Package synchronized"
        );
        Ok(record)
    }

    /// Remove everything a package that left the inventory owns.
    async fn remove_package(&self, record: &StoredPackageRecord) -> Result<(), SyncError> {
        self.importer
            .remove_package(&record.dnp_name, &record.dashboards)
            .await?;
        self.targets.delete_targets(&record.dnp_name).await?;
        self.state.delete(&record.dnp_name).await?;

        tracing::info!(package = %record.dnp_name, version = %record.version, "Package removed");
        Ok(())
    }
}

fn log_report(report: &CycleReport) {
    if report.is_empty() {
        tracing::debug!("Everything up to date");
        return;
    }
    tracing::info!(
        updated = report.updated.len(),
        removed = report.removed.len(),
        failed = report.failed.len(),
        "Synchronization cycle finished"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_accounting() {
        let mut report = CycleReport::default();
        assert!(report.is_empty());

        report.record("a".to_string(), Ok(()), false);
        report.record("b".to_string(), Ok(()), true);
        report.record(
            "c".to_string(),
            Err(SyncError::from(crate::error::TargetError::InvalidName("c".to_string()))),
            false,
        );

        assert_eq!(report.updated, ["a"]);
        assert_eq!(report.removed, ["b"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].package, "c");

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["failed"][0]["package"], "c");
    }
}

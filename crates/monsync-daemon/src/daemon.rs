//! Daemon setup and lifecycle management

use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::inventory::{DappmanagerClient, InventorySource};
use crate::scheduler::{CycleReport, Scheduler};
use crate::storage::{open_state_store, StateStore};
use crate::targets::{FileTargetWriter, TargetWriter};
use monsync_grafana::{DashboardStore, GrafanaApiClient};
use std::sync::Arc;

/// The monsync daemon with its collaborators wired from configuration
pub struct Daemon {
    config: DaemonConfig,
    scheduler: Arc<Scheduler>,
    state: Arc<dyn StateStore>,
    targets: Arc<dyn TargetWriter>,
}

impl Daemon {
    /// Build the Grafana client, inventory client, target writer and state
    /// store described by `config`.
    pub fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let dashboards: Arc<dyn DashboardStore> = Arc::new(GrafanaApiClient::new(
            &config.grafana.url,
            config.grafana.token.clone(),
            config.grafana.timeout(),
        )?);
        let inventory: Arc<dyn InventorySource> = Arc::new(DappmanagerClient::new(
            &config.inventory.url,
            config.inventory.timeout(),
        )?);
        let targets: Arc<dyn TargetWriter> = Arc::new(FileTargetWriter::new(&config.targets.dir));
        let state = open_state_store(&config.state);

        Ok(Self::with_components(config, inventory, dashboards, targets, state))
    }

    /// Assemble a daemon from already built collaborators
    pub fn with_components(
        config: DaemonConfig,
        inventory: Arc<dyn InventorySource>,
        dashboards: Arc<dyn DashboardStore>,
        targets: Arc<dyn TargetWriter>,
        state: Arc<dyn StateStore>,
    ) -> Self {
        let scheduler = Scheduler::new(
            config.scheduler.clone(),
            inventory,
            dashboards,
            targets.clone(),
            state.clone(),
        );

        Self {
            config,
            scheduler,
            state,
            targets,
        }
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn state(&self) -> &Arc<dyn StateStore> {
        &self.state
    }

    pub fn targets(&self) -> &Arc<dyn TargetWriter> {
        &self.targets
    }

    /// Run a single synchronization cycle
    pub async fn sync_once(&self) -> DaemonResult<CycleReport> {
        Ok(self.scheduler.reconcile().await?)
    }

    /// Synchronize until SIGINT or SIGTERM, then let the current cycle finish.
    pub async fn run(self) -> DaemonResult<()> {
        tracing::info!(
            grafana = %self.config.grafana.url,
            inventory = %self.config.inventory.url,
            targets_dir = ?self.config.targets.dir,
            "monsync daemon starting"
        );

        let scheduler = self.scheduler.clone();
        let handle = tokio::spawn(async move {
            scheduler.start().await;
        });

        shutdown_signal().await;
        tracing::info!("Shutdown signal received, waiting for the current cycle");
        self.scheduler.stop();

        handle
            .await
            .map_err(|e| DaemonError::Scheduler(e.to_string()))?;

        tracing::info!("monsync daemon stopped");
        Ok(())
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

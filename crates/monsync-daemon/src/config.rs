//! Configuration for monsync-daemon

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Dashboard store configuration
    #[serde(default)]
    pub grafana: GrafanaConfig,

    /// Package inventory configuration
    #[serde(default)]
    pub inventory: InventoryConfig,

    /// Scrape-target output configuration
    #[serde(default)]
    pub targets: TargetsConfig,

    /// Persisted state configuration
    #[serde(default)]
    pub state: StateConfig,

    /// Scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Grafana API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrafanaConfig {
    /// Base URL of the Grafana API
    #[serde(default = "default_grafana_url")]
    pub url: String,

    /// API token or service account token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

impl Default for GrafanaConfig {
    fn default() -> Self {
        Self {
            url: default_grafana_url(),
            token: None,
            timeout_secs: default_request_timeout(),
        }
    }
}

impl GrafanaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Package manager API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Base URL of the package manager API
    #[serde(default = "default_inventory_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            url: default_inventory_url(),
            timeout_secs: default_request_timeout(),
        }
    }
}

impl InventoryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where Prometheus file_sd target files are written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetsConfig {
    /// Directory watched by Prometheus
    #[serde(default = "default_targets_dir")]
    pub dir: PathBuf,
}

impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            dir: default_targets_dir(),
        }
    }
}

/// Persisted state configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StateConfig {
    /// In-memory state (lost on restart; every package resyncs)
    Memory,

    /// JSON file on disk
    Json {
        /// Path of the state file
        #[serde(default = "default_state_path")]
        path: PathBuf,
    },
}

impl Default for StateConfig {
    fn default() -> Self {
        StateConfig::Json {
            path: default_state_path(),
        }
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between two synchronization cycles
    #[serde(default = "default_sync_interval")]
    pub interval_secs: u64,

    /// Packages synchronized at the same time within a cycle
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_packages: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_sync_interval(),
            max_concurrent_packages: default_max_concurrent(),
        }
    }
}

impl SchedulerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_grafana_url() -> String {
    "http://grafana:80".to_string()
}

fn default_inventory_url() -> String {
    "http://my.dappnode".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_targets_dir() -> PathBuf {
    PathBuf::from("/prometheus_file_sd")
}

fn default_state_path() -> PathBuf {
    PathBuf::from("/data/db.json")
}

fn default_sync_interval() -> u64 {
    180
}

fn default_max_concurrent() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl DaemonConfig {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// Environment variables use `__` between the prefix and nested keys,
    /// e.g. `MONSYNC__GRAFANA__URL`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&DaemonConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("MONSYNC")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Configuration that keeps all state in memory
    pub fn ephemeral() -> Self {
        Self {
            state: StateConfig::Memory,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.grafana.url, "http://grafana:80");
        assert!(config.grafana.token.is_none());
        assert_eq!(config.inventory.url, "http://my.dappnode");
        assert_eq!(config.targets.dir, PathBuf::from("/prometheus_file_sd"));
        assert!(matches!(
            config.state,
            StateConfig::Json { ref path } if path == &PathBuf::from("/data/db.json")
        ));
    }

    #[test]
    fn test_scheduler_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.interval_secs, 180);
        assert_eq!(config.max_concurrent_packages, 1);
        assert_eq!(config.interval(), Duration::from_secs(180));
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = SchedulerConfig {
            interval_secs: 0,
            max_concurrent_packages: 1,
        };
        assert_eq!(config.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[grafana]
url = "http://localhost:3000"
token = "secret"

[state]
type = "memory"

[scheduler]
interval_secs = 60
"#
        )
        .unwrap();

        let config = DaemonConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.grafana.url, "http://localhost:3000");
        assert_eq!(config.grafana.token.as_deref(), Some("secret"));
        assert_eq!(config.grafana.timeout_secs, 30);
        assert!(matches!(config.state, StateConfig::Memory));
        assert_eq!(config.scheduler.interval_secs, 60);
        assert_eq!(config.scheduler.max_concurrent_packages, 1);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = DaemonConfig::load(None).unwrap();
        assert_eq!(config.grafana.url, "http://grafana:80");
        assert_eq!(config.scheduler.interval_secs, 180);
    }
}

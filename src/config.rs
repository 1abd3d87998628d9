use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, trace};

/// Thresholds a metric must strictly exceed before an alert fires.
///
/// Loaded once at startup and read-only afterwards; the evaluator only
/// ever reads the value it is handed, so a future hot-reload does not
/// change its contract.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_cpu_threshold")]
    pub cpu_usage: f64,

    #[serde(default = "default_memory_threshold")]
    pub memory_usage: f64,

    #[serde(default = "default_disk_threshold")]
    pub disk_usage: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            cpu_usage: default_cpu_threshold(),
            memory_usage: default_memory_threshold(),
            disk_usage: default_disk_threshold(),
        }
    }
}

fn default_cpu_threshold() -> f64 {
    80.0
}

fn default_memory_threshold() -> f64 {
    85.0
}

fn default_disk_threshold() -> f64 {
    90.0
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Seconds between monitoring cycles
    #[serde(default = "default_monitor_interval")]
    pub monitor_interval: u64,

    /// Seconds between live status broadcasts
    #[serde(default = "default_broadcast_interval")]
    pub broadcast_interval: u64,

    #[serde(default)]
    pub alert_thresholds: ThresholdConfig,

    /// Destination for critical alerts; alerts are dropped if unset
    pub webhook_url: Option<String>,

    /// Optional structured log output file (stderr is always on)
    pub log_file: Option<PathBuf>,

    /// Directory for the per-day report history
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    /// Dependent services probed each cycle, name -> health URL
    #[serde(default = "default_services")]
    pub services: BTreeMap<String, String>,

    /// Trading-engine metrics endpoint; zeros are recorded if unset or down
    pub metrics_url: Option<String>,

    /// Base URL of the read-only status provider consumed by the broadcast hub
    pub status_api: Option<String>,

    /// Per-probe timeout in seconds for health checks
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitor_interval: default_monitor_interval(),
            broadcast_interval: default_broadcast_interval(),
            alert_thresholds: ThresholdConfig::default(),
            webhook_url: None,
            log_file: None,
            report_dir: default_report_dir(),
            services: default_services(),
            metrics_url: None,
            status_api: None,
            probe_timeout: default_probe_timeout(),
        }
    }
}

fn default_monitor_interval() -> u64 {
    60
}

fn default_broadcast_interval() -> u64 {
    5
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_services() -> BTreeMap<String, String> {
    BTreeMap::from([(
        "web_app".to_string(),
        "http://localhost:8000/health".to_string(),
    )])
}

fn default_probe_timeout() -> u64 {
    5
}

/// Read the monitor configuration. A missing file is not an error - the
/// defaults apply; a malformed file is.
pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("config file {path} not found, using defaults");
            return Ok(Config::default());
        }
        Err(e) => return Err(e).with_context(|| format!("failed to read config file {path}")),
    };

    serde_json::from_str(&file_content)
        .with_context(|| format!("invalid configuration file {path}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}

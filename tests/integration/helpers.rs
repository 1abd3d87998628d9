//! Helper functions for integration tests

use std::collections::BTreeMap;
use std::path::Path;

use vigil::config::{Config, ThresholdConfig};

/// A config with no external dependencies and thresholds no host will
/// breach, rooted in a temporary report directory.
pub fn quiet_config(report_dir: &Path) -> Config {
    Config {
        report_dir: report_dir.to_path_buf(),
        services: BTreeMap::new(),
        alert_thresholds: unreachable_thresholds(),
        probe_timeout: 2,
        ..Config::default()
    }
}

/// Thresholds that no sampled value will exceed.
pub fn unreachable_thresholds() -> ThresholdConfig {
    ThresholdConfig {
        cpu_usage: 1000.0,
        memory_usage: 1000.0,
        disk_usage: 1000.0,
    }
}

/// Thresholds where disk always breaches, forcing one critical alert per
/// cycle regardless of the host the tests run on.
pub fn disk_always_breaches() -> ThresholdConfig {
    ThresholdConfig {
        cpu_usage: 1000.0,
        memory_usage: 1000.0,
        disk_usage: -1.0,
    }
}

pub mod actors;
pub mod config;
pub mod dispatcher;
pub mod evaluator;
pub mod sampler;
pub mod status;
pub mod store;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time reading of host metrics. Produced once per monitoring
/// cycle and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Global CPU usage in percent
    pub cpu_usage: f64,
    /// Memory usage in percent
    pub memory_usage: f64,
    /// Disk usage of the root filesystem in percent
    pub disk_usage: f64,
    /// Total bytes sent across all interfaces
    pub network_sent: u64,
    /// Total bytes received across all interfaces
    pub network_recv: u64,
    pub load_1: f64,
    pub load_5: f64,
    pub load_15: f64,
    pub process_count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Service name mapped to reachability, captured alongside a snapshot.
///
/// A `BTreeMap` so iteration order (and therefore alert order) is fixed.
pub type HealthStatus = BTreeMap<String, bool>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Warning,
    Critical,
}

/// A single threshold breach or unreachable service, immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub metric: String,
    pub message: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl Alert {
    pub fn new(level: AlertLevel, metric: &str, message: String, value: f64) -> Self {
        Self {
            level,
            metric: metric.to_string(),
            message,
            value,
            timestamp: Utc::now(),
        }
    }
}

/// Figures reported by the trading-engine metrics endpoint.
///
/// All zero when the endpoint is unreachable - the monitor degrades,
/// it does not fail.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineMetrics {
    pub active_strategies: u64,
    pub total_orders: u64,
    pub success_rate: f64,
    pub api_errors: u64,
    pub risk_alerts: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Healthy,
    Warning,
}

/// Outcome of one full monitoring cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub timestamp: DateTime<Utc>,
    pub metrics: MetricsSnapshot,
    pub health: HealthStatus,
    pub trading: EngineMetrics,
    pub alerts: Vec<Alert>,
    pub overall_status: OverallStatus,
}

impl Report {
    /// Build a report; `overall_status` is `Warning` iff any alert fired.
    pub fn new(
        metrics: MetricsSnapshot,
        health: HealthStatus,
        trading: EngineMetrics,
        alerts: Vec<Alert>,
    ) -> Self {
        let overall_status = if alerts.is_empty() {
            OverallStatus::Healthy
        } else {
            OverallStatus::Warning
        };

        Self {
            timestamp: Utc::now(),
            metrics,
            health,
            trading,
            alerts,
            overall_status,
        }
    }
}

//! Threshold evaluation - a pure function from one cycle's readings to alerts
//!
//! The level assignments are a fixed policy table, not configuration:
//! CPU and memory breaches are warnings, disk breaches and unreachable
//! services are critical. A metric must strictly exceed its threshold
//! (`value > threshold`, not `>=`) to fire.

use crate::{Alert, AlertLevel, HealthStatus, MetricsSnapshot, config::ThresholdConfig};

/// Evaluate a snapshot against the configured thresholds.
///
/// The output order is stable: cpu, memory, disk, then one alert per
/// unreachable service in lexicographic name order.
pub fn evaluate(
    snapshot: &MetricsSnapshot,
    health: &HealthStatus,
    thresholds: &ThresholdConfig,
) -> Vec<Alert> {
    let mut alerts = vec![];

    if snapshot.cpu_usage > thresholds.cpu_usage {
        alerts.push(Alert::new(
            AlertLevel::Warning,
            "cpu_usage",
            format!("cpu usage too high: {:.1}%", snapshot.cpu_usage),
            snapshot.cpu_usage,
        ));
    }

    if snapshot.memory_usage > thresholds.memory_usage {
        alerts.push(Alert::new(
            AlertLevel::Warning,
            "memory_usage",
            format!("memory usage too high: {:.1}%", snapshot.memory_usage),
            snapshot.memory_usage,
        ));
    }

    if snapshot.disk_usage > thresholds.disk_usage {
        alerts.push(Alert::new(
            AlertLevel::Critical,
            "disk_usage",
            format!("disk usage too high: {:.1}%", snapshot.disk_usage),
            snapshot.disk_usage,
        ));
    }

    for (service, reachable) in health {
        if !reachable {
            alerts.push(Alert::new(
                AlertLevel::Critical,
                "service_health",
                format!("service unreachable: {service}"),
                0.0,
            ));
        }
    }

    alerts
}

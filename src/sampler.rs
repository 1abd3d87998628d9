//! Host metric sampling and dependent-service health probing
//!
//! Sampling only reads; it never mutates shared state. Every network
//! probe carries a bounded timeout so a single unresponsive dependency
//! cannot stall the monitoring cycle - a timed-out probe is reported as
//! unreachable, not propagated as an error.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use sysinfo::{Disks, Networks, System};
use tracing::{debug, instrument, trace};

use crate::{EngineMetrics, HealthStatus, MetricsSnapshot};

/// Timeout for the trading-engine metrics endpoint
const ENGINE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct MetricSampler {
    sys: System,
    /// Dependent services to probe, name -> health URL
    services: BTreeMap<String, String>,
    /// HTTP client for health probes (reused across requests)
    client: Client,
}

impl MetricSampler {
    pub fn new(services: BTreeMap<String, String>, probe_timeout: Duration) -> Self {
        Self {
            sys: System::new_all(),
            services,
            client: Client::builder()
                .timeout(probe_timeout)
                .build()
                .expect("failed to build HTTP client"),
        }
    }

    /// Capture an instantaneous snapshot of host metrics.
    ///
    /// CPU usage needs two refreshes separated by sysinfo's minimum
    /// update interval to produce a meaningful delta.
    #[instrument(skip(self))]
    pub async fn sample(&mut self) -> MetricsSnapshot {
        self.sys.refresh_all();
        tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
        self.sys.refresh_all();

        let cpu_usage = self.sys.global_cpu_usage() as f64;

        let total_memory = self.sys.total_memory();
        let memory_usage = if total_memory > 0 {
            self.sys.used_memory() as f64 / total_memory as f64 * 100.0
        } else {
            0.0
        };

        let disks = Disks::new_with_refreshed_list();
        let disk_usage = root_disk_usage(&disks);

        let networks = Networks::new_with_refreshed_list();
        let network_sent = networks.values().map(|data| data.total_transmitted()).sum();
        let network_recv = networks.values().map(|data| data.total_received()).sum();

        let load = System::load_average();

        let snapshot = MetricsSnapshot {
            cpu_usage,
            memory_usage,
            disk_usage,
            network_sent,
            network_recv,
            load_1: load.one,
            load_5: load.five,
            load_15: load.fifteen,
            process_count: self.sys.processes().len(),
            timestamp: Utc::now(),
        };

        trace!(
            "sampled cpu {:.1}%, memory {:.1}%, disk {:.1}%",
            snapshot.cpu_usage, snapshot.memory_usage, snapshot.disk_usage
        );

        snapshot
    }

    /// Probe every configured service once. Any error or timeout maps to
    /// `false` for that service.
    #[instrument(skip(self))]
    pub async fn health(&self) -> HealthStatus {
        let mut status = HealthStatus::new();

        for (name, url) in &self.services {
            let reachable = match self.client.get(url).send().await {
                Ok(response) => response.status().is_success(),
                Err(e) => {
                    debug!("health probe for {name} failed: {e}");
                    false
                }
            };

            status.insert(name.clone(), reachable);
        }

        status
    }
}

/// Usage of the root filesystem in percent; falls back to the first
/// listed disk when no "/" mount is present, and 0 when there is none.
fn root_disk_usage(disks: &Disks) -> f64 {
    let disk = disks
        .iter()
        .find(|disk| disk.mount_point() == std::path::Path::new("/"))
        .or_else(|| disks.iter().next());

    let Some(disk) = disk else {
        return 0.0;
    };

    let total = disk.total_space();
    if total == 0 {
        return 0.0;
    }

    (total - disk.available_space()) as f64 / total as f64 * 100.0
}

/// Client for the trading-engine metrics endpoint.
///
/// The endpoint is an external collaborator; when it is absent or down
/// the monitor records zeros and carries on.
#[derive(Debug, Clone)]
pub struct EngineClient {
    client: Client,
    url: Option<String>,
}

impl EngineClient {
    pub fn new(url: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(ENGINE_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            url,
        }
    }

    #[instrument(skip(self))]
    pub async fn fetch(&self) -> EngineMetrics {
        let Some(url) = &self.url else {
            return EngineMetrics::default();
        };

        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                response.json().await.unwrap_or_else(|e| {
                    debug!("failed to parse engine metrics: {e}");
                    EngineMetrics::default()
                })
            }
            Ok(response) => {
                debug!("engine metrics endpoint returned {}", response.status());
                EngineMetrics::default()
            }
            Err(e) => {
                debug!("engine metrics endpoint unreachable: {e}");
                EngineMetrics::default()
            }
        }
    }
}

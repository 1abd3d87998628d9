//! Read-only status provider consumed by the broadcast hub
//!
//! The system/exchange/strategy status figures are owned by the analytics
//! read API, an external collaborator. The hub only ever queries them
//! through [`StatusSource`]; when the provider is absent or failing the
//! documented degradation is a zeroed system status and empty lists.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub status: String,
    pub uptime: String,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub disk_usage: f64,
    pub network_throughput: BTreeMap<String, f64>,
    pub last_check: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeStatus {
    pub exchange: String,
    pub status: String,
    pub latency: f64,
    pub last_trade: String,
    pub api_calls: u64,
    pub error_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyStatus {
    pub strategy_id: String,
    pub name: String,
    pub status: String,
    pub symbol: String,
    pub profit_loss: f64,
    pub trades_today: u64,
    pub last_signal: String,
    pub error_message: String,
}

/// Current system/exchange/strategy status, as exposed by the analytics
/// read API.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn system_status(&self) -> SystemStatus;
    async fn exchange_statuses(&self) -> Vec<ExchangeStatus>;
    async fn strategy_statuses(&self) -> Vec<StrategyStatus>;
}

/// HTTP-backed [`StatusSource`] with bounded-timeout requests.
pub struct HttpStatusSource {
    client: Client,
    base_url: String,
}

impl HttpStatusSource {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let url = format!("{}{path}", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json().await {
                    Ok(value) => Some(value),
                    Err(e) => {
                        debug!("failed to parse status from {url}: {e}");
                        None
                    }
                }
            }
            Ok(response) => {
                debug!("status provider {url} returned {}", response.status());
                None
            }
            Err(e) => {
                debug!("status provider {url} unreachable: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn system_status(&self) -> SystemStatus {
        self.fetch("/system").await.unwrap_or_default()
    }

    async fn exchange_statuses(&self) -> Vec<ExchangeStatus> {
        self.fetch("/exchanges").await.unwrap_or_default()
    }

    async fn strategy_statuses(&self) -> Vec<StrategyStatus> {
        self.fetch("/strategies").await.unwrap_or_default()
    }
}

//! Best-effort webhook delivery for critical alerts
//!
//! Delivery is at-most-once: a timeout, connection error, or non-2xx
//! response is logged and the alert is dropped. The caller must never
//! treat a failed dispatch as cycle-fatal.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, info, instrument};

use crate::Alert;

/// Timeout for a single webhook POST
const DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct AlertDispatcher {
    /// HTTP client (reused across requests for efficiency)
    client: Client,
    webhook_url: Option<String>,
}

impl AlertDispatcher {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(DISPATCH_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            webhook_url,
        }
    }

    /// Deliver one alert to the webhook sink. Returns whether delivery
    /// succeeded; no retry is performed either way.
    #[instrument(skip(self, alert), fields(metric = %alert.metric))]
    pub async fn dispatch(&self, alert: &Alert) -> bool {
        let Some(url) = &self.webhook_url else {
            debug!("no webhook configured, dropping alert");
            return false;
        };

        let payload = json!({
            "timestamp": alert.timestamp.to_rfc3339(),
            "level": alert.level,
            "message": alert.message,
            "metric": alert.metric,
            "value": alert.value,
        });

        match self.client.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!("alert delivered: {}", alert.message);
                true
            }
            Ok(response) => {
                error!("webhook rejected alert with status {}", response.status());
                false
            }
            Err(e) => {
                error!("failed to deliver alert: {e}");
                false
            }
        }
    }
}

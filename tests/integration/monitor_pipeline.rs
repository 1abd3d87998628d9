//! Full-cycle tests: sample, probe, evaluate, dispatch, persist

use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::broadcast;
use vigil::{
    AlertLevel, OverallStatus,
    actors::monitor::MonitorHandle,
    config::Config,
    store::ReportStore,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::{disk_always_breaches, quiet_config, unreachable_thresholds};

#[tokio::test]
async fn healthy_cycle_produces_a_healthy_report() {
    let dir = tempfile::tempdir().unwrap();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "active_strategies": 2,
            "total_orders": 40,
            "success_rate": 0.95,
            "api_errors": 0,
            "risk_alerts": 0
        })))
        .mount(&mock_server)
        .await;

    let config = Config {
        services: BTreeMap::from([(
            "web_app".to_string(),
            format!("{}/health", mock_server.uri()),
        )]),
        metrics_url: Some(format!("{}/api/metrics", mock_server.uri())),
        alert_thresholds: unreachable_thresholds(),
        report_dir: dir.path().to_path_buf(),
        probe_timeout: 2,
        ..Config::default()
    };

    let (report_tx, _) = broadcast::channel(16);
    let handle = MonitorHandle::spawn(&config, report_tx).unwrap();

    handle.cycle_now().await.unwrap();

    let reports = handle.recent(1).await.unwrap();
    assert_eq!(reports.len(), 1);

    let report = &reports[0];
    assert_eq!(report.overall_status, OverallStatus::Healthy);
    assert!(report.alerts.is_empty());
    assert_eq!(report.health.get("web_app"), Some(&true));
    assert_eq!(report.trading.active_strategies, 2);
    assert_eq!(report.trading.total_orders, 40);

    handle.shutdown().await;
}

#[tokio::test]
async fn critical_alert_is_delivered_to_the_webhook() {
    let dir = tempfile::tempdir().unwrap();
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/alerts"))
        .and(body_partial_json(serde_json::json!({
            "level": "critical",
            "metric": "disk_usage",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = Config {
        webhook_url: Some(format!("{}/alerts", mock_server.uri())),
        alert_thresholds: disk_always_breaches(),
        ..quiet_config(dir.path())
    };

    let (report_tx, _) = broadcast::channel(16);
    let handle = MonitorHandle::spawn(&config, report_tx).unwrap();

    handle.cycle_now().await.unwrap();

    let reports = handle.recent(1).await.unwrap();
    assert_eq!(reports[0].overall_status, OverallStatus::Warning);
    assert_eq!(reports[0].alerts.len(), 1);
    assert_eq!(reports[0].alerts[0].level, AlertLevel::Critical);

    handle.shutdown().await;
    // mock expectation (exactly one POST) is verified on drop
}

#[tokio::test]
async fn consecutive_cycles_accumulate_history() {
    let dir = tempfile::tempdir().unwrap();
    let config = quiet_config(dir.path());

    let (report_tx, _) = broadcast::channel(16);
    let handle = MonitorHandle::spawn(&config, report_tx).unwrap();

    handle.cycle_now().await.unwrap();
    handle.cycle_now().await.unwrap();
    handle.cycle_now().await.unwrap();

    let reports = handle.recent(10).await.unwrap();
    assert_eq!(reports.len(), 3);
    // most recent last
    assert!(reports[0].timestamp <= reports[2].timestamp);

    handle.shutdown().await;
}

#[tokio::test]
async fn persisted_reports_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = quiet_config(dir.path());

    {
        let (report_tx, _) = broadcast::channel(16);
        let handle = MonitorHandle::spawn(&config, report_tx).unwrap();
        handle.cycle_now().await.unwrap();
        handle.shutdown().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    // a fresh store over the same directory sees the report
    let store = ReportStore::open(dir.path()).unwrap();
    assert_eq!(store.recent(10).len(), 1);
}

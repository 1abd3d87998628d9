//! Broadcast hub against an HTTP status provider

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use vigil::{actors::hub::HubHandle, status::HttpStatusSource};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn snapshot_carries_provider_data_to_every_subscriber() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/system"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "HEALTHY",
            "uptime": "2d",
            "cpu_usage": 21.0,
            "memory_usage": 55.0,
            "disk_usage": 31.0,
            "network_throughput": {"in": 10.0, "out": 4.0},
            "last_check": "2026-01-01T00:00:00Z"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/exchanges"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "exchange": "binance",
            "status": "CONNECTED",
            "latency": 40.0,
            "last_trade": "2026-01-01T00:00:00Z",
            "api_calls": 10,
            "error_rate": 0.0
        }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/strategies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&mock_server)
        .await;

    let source = Arc::new(HttpStatusSource::new(
        mock_server.uri(),
        Duration::from_secs(2),
    ));
    let hub = HubHandle::spawn(source, Duration::from_secs(3600));

    let (tx1, mut rx1) = mpsc::unbounded_channel();
    let (tx2, mut rx2) = mpsc::unbounded_channel();
    hub.subscribe(tx1).await.unwrap();
    hub.subscribe(tx2).await.unwrap();

    assert_eq!(hub.tick_now().await.unwrap(), 2);

    for rx in [&mut rx1, &mut rx2] {
        let text = rx.try_recv().unwrap();
        let message: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(message["type"], "monitoring_update");
        assert_eq!(message["system_status"]["status"], "HEALTHY");
        assert_eq!(message["exchange_statuses"][0]["exchange"], "binance");
        assert_eq!(message["strategy_statuses"], serde_json::json!([]));
    }

    hub.shutdown().await;
}

#[tokio::test]
async fn provider_outage_degrades_the_snapshot_but_broadcast_continues() {
    let source = Arc::new(HttpStatusSource::new(
        "http://127.0.0.1:1".to_string(),
        Duration::from_secs(1),
    ));
    let hub = HubHandle::spawn(source, Duration::from_secs(3600));

    let (tx, mut rx) = mpsc::unbounded_channel();
    hub.subscribe(tx).await.unwrap();

    assert_eq!(hub.tick_now().await.unwrap(), 1);

    let text = rx.try_recv().unwrap();
    let message: serde_json::Value = serde_json::from_str(&text).unwrap();

    assert_eq!(message["type"], "monitoring_update");
    // zero/empty defaults, never a missing message
    assert_eq!(message["system_status"]["status"], "");
    assert_eq!(message["exchange_statuses"], serde_json::json!([]));

    hub.shutdown().await;
}

#[tokio::test]
async fn shutdown_closes_subscriber_sinks() {
    let source = Arc::new(HttpStatusSource::new(
        "http://127.0.0.1:1".to_string(),
        Duration::from_secs(1),
    ));
    let hub = HubHandle::spawn(source, Duration::from_secs(3600));

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    hub.subscribe(tx).await.unwrap();

    hub.shutdown().await;

    // the sink is dropped by the hub, so the channel reports closed
    let closed = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap();
    assert!(closed.is_none());
}

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::broadcast;
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};
use vigil::{
    actors::{hub::HubHandle, monitor::MonitorHandle},
    config::read_config_file,
    status::HttpStatusSource,
};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file
    #[arg(short, default_value = "config/monitor_config.json")]
    config: String,
}

fn init(log_file: Option<&Path>) {
    let targets = filter::Targets::new().with_targets(vec![("vigil", LevelFilter::TRACE)]);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .compact()
        .with_ansi(false);

    let file = log_file.and_then(|path| {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .inspect_err(|e| eprintln!("could not open log file {}: {e}", path.display()))
            .ok()
    });

    if let Some(file) = file {
        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false),
            )
            .with(targets)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(targets)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    let config = read_config_file(&args.config)?;

    init(config.log_file.as_deref());
    trace!("started with args: {args:?}");

    let (report_tx, _) = broadcast::channel(16);
    let monitor = MonitorHandle::spawn(&config, report_tx)?;
    info!(
        "monitoring every {}s, reports under {}",
        config.monitor_interval,
        config.report_dir.display()
    );

    let status_api = config
        .status_api
        .clone()
        .unwrap_or_else(|| "http://localhost:8000/api/v1/monitoring".to_string());
    let source = Arc::new(HttpStatusSource::new(
        status_api,
        Duration::from_secs(config.probe_timeout),
    ));
    let hub = HubHandle::spawn(source, Duration::from_secs(config.broadcast_interval));
    info!("broadcasting status every {}s", config.broadcast_interval);

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    // let in-flight work finish, then close subscriber sinks
    monitor.shutdown().await;
    hub.shutdown().await;

    Ok(())
}

//! MonitorActor - drives the sample -> evaluate -> dispatch -> persist cycle
//!
//! Each cycle is the unit of failure: any error escaping a stage is
//! caught at the loop boundary, logged, and the next cycle proceeds on
//! schedule. The monitor must never crash itself out of being able to
//! report that something else has crashed.
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → sample → evaluate → dispatch criticals → persist report
//!     ↑                                                      │
//!     └─── Commands (CycleNow, Recent, UpdateInterval,       ▼
//!          Shutdown)                            publish ReportEvent
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::{
    AlertLevel, Report,
    config::{Config, ThresholdConfig},
    dispatcher::AlertDispatcher,
    evaluator::evaluate,
    sampler::{EngineClient, MetricSampler},
    store::ReportStore,
};

use super::messages::{MonitorCommand, ReportEvent};

/// Actor that runs the periodic monitoring cycle
pub struct MonitorActor {
    sampler: MetricSampler,

    engine: EngineClient,

    dispatcher: AlertDispatcher,

    store: ReportStore,

    thresholds: ThresholdConfig,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<MonitorCommand>,

    /// Broadcast sender for publishing completed reports
    report_tx: broadcast::Sender<ReportEvent>,

    /// Current cycle interval
    interval_duration: Duration,
}

impl MonitorActor {
    pub fn new(
        config: &Config,
        store: ReportStore,
        command_rx: mpsc::Receiver<MonitorCommand>,
        report_tx: broadcast::Sender<ReportEvent>,
    ) -> Self {
        Self {
            sampler: MetricSampler::new(
                config.services.clone(),
                Duration::from_secs(config.probe_timeout),
            ),
            engine: EngineClient::new(config.metrics_url.clone()),
            dispatcher: AlertDispatcher::new(config.webhook_url.clone()),
            store,
            thresholds: config.alert_thresholds.clone(),
            command_rx,
            report_tx,
            interval_duration: Duration::from_secs(config.monitor_interval),
        }
    }

    /// Run the actor's main loop
    ///
    /// Runs until a Shutdown command arrives or the command channel
    /// closes. A cycle in flight always finishes before the loop exits.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting monitor actor");

        let mut ticker = interval(self.interval_duration);
        // an overlong cycle fires the next one immediately after it
        // completes; cycles are strictly sequential, never skipped
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            tokio::select! {
                // Timer tick - run a monitoring cycle
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        error!("monitoring cycle failed: {e:#}");
                    }
                }

                // Handle commands
                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        MonitorCommand::CycleNow { respond_to } => {
                            debug!("received CycleNow command");
                            let result = self.run_cycle().await;
                            let _ = respond_to.send(result);
                        }

                        MonitorCommand::Recent { n, respond_to } => {
                            let _ = respond_to.send(self.store.recent(n));
                        }

                        MonitorCommand::UpdateInterval { interval_secs } => {
                            debug!("updating interval to {interval_secs}s");
                            self.interval_duration = Duration::from_secs(interval_secs);
                            ticker = interval(self.interval_duration);
                            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
                        }

                        MonitorCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                // Command channel closed - exit
                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("monitor actor stopped");
    }

    /// One full monitoring cycle.
    ///
    /// Stage failures are contained here: a failed probe records a
    /// default value, a failed dispatch drops the alert, a failed
    /// persist costs durability for this cycle only. Exactly one report
    /// is appended per cycle regardless.
    #[instrument(skip(self))]
    async fn run_cycle(&mut self) -> Result<()> {
        let snapshot = self.sampler.sample().await;
        let health = self.sampler.health().await;
        let trading = self.engine.fetch().await;

        let alerts = evaluate(&snapshot, &health, &self.thresholds);

        // only critical alerts leave the process
        for alert in alerts.iter().filter(|a| a.level == AlertLevel::Critical) {
            if !self.dispatcher.dispatch(alert).await {
                warn!("critical alert for {} was not delivered", alert.metric);
            }
        }

        for alert in &alerts {
            warn!("{:?}: {}", alert.level, alert.message);
        }

        let report = Report::new(snapshot, health, trading, alerts);

        info!(
            "cycle complete - status: {:?}, cpu: {:.1}%, memory: {:.1}%, disk: {:.1}%",
            report.overall_status,
            report.metrics.cpu_usage,
            report.metrics.memory_usage,
            report.metrics.disk_usage,
        );

        if let Err(e) = self.store.append(report.clone()) {
            error!("failed to persist report: {e}");
        }

        // It's OK if there are no receivers; reports are persisted
        // independently of live consumers.
        match self.report_tx.send(ReportEvent { report }) {
            Ok(receivers) => trace!("published report to {receivers} receivers"),
            Err(_) => trace!("no receivers for report event"),
        }

        Ok(())
    }
}

/// Handle for controlling the MonitorActor
#[derive(Clone)]
pub struct MonitorHandle {
    sender: mpsc::Sender<MonitorCommand>,
}

impl MonitorHandle {
    /// Spawn a new monitor actor as a tokio task and return a handle.
    ///
    /// Opens the report store under `config.report_dir`; failing to do so
    /// is a startup error, not a cycle error.
    pub fn spawn(config: &Config, report_tx: broadcast::Sender<ReportEvent>) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let store = ReportStore::open(&config.report_dir)
            .context("failed to open report store")?;

        let actor = MonitorActor::new(config, store, cmd_rx, report_tx);

        tokio::spawn(actor.run());

        Ok(Self { sender: cmd_tx })
    }

    /// Run a monitoring cycle immediately, bypassing the interval timer.
    pub async fn cycle_now(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::CycleNow { respond_to: tx })
            .await
            .context("failed to send CycleNow command")?;

        rx.await.context("failed to receive cycle result")??;
        Ok(())
    }

    /// The most recent `n` reports of the current day, most recent last.
    pub async fn recent(&self, n: usize) -> Result<Vec<Report>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::Recent { n, respond_to: tx })
            .await
            .context("failed to send Recent command")?;

        rx.await.context("failed to receive recent reports")
    }

    /// Update the cycle interval.
    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(MonitorCommand::UpdateInterval { interval_secs })
            .await
            .context("failed to send UpdateInterval command")?;
        Ok(())
    }

    /// Gracefully shut down the monitor.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(MonitorCommand::Shutdown).await;
    }
}

//! BroadcastHubActor - fans out live status snapshots to subscribers
//!
//! The subscriber registry is mutated from two directions - the accept
//! path (subscribe) and the tick path (iterate to write, remove on
//! failure). Both run inside this single actor task, so add/remove/
//! iterate can never race.
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → Query StatusSource → Serialize snapshot → write to every sink
//!     ↑                                                     │ write failed
//!     └─── Commands (Subscribe, Unsubscribe, TickNow,       ▼
//!          Shutdown)                              remove that sink only
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tokio::time::interval;
use tracing::{debug, error, instrument, trace, warn};

use crate::status::StatusSource;

use super::messages::{HubCommand, SubscriptionId};

/// A destination capable of receiving one serialized status message.
///
/// Owned by the hub only while connected; a failed send marks the
/// subscriber as gone and the hub drops it.
pub trait Sink: Send + Sync {
    fn send(&mut self, message: &str) -> Result<(), SinkClosed>;
}

/// The peer behind a sink has disconnected.
#[derive(Debug)]
pub struct SinkClosed;

impl Sink for mpsc::UnboundedSender<String> {
    fn send(&mut self, message: &str) -> Result<(), SinkClosed> {
        mpsc::UnboundedSender::send(self, message.to_string()).map_err(|_| SinkClosed)
    }
}

/// Actor that owns the subscriber registry and the broadcast cadence
pub struct BroadcastHubActor {
    /// Live subscribers; exclusively owned by this task
    subscribers: HashMap<SubscriptionId, Box<dyn Sink>>,

    /// Next subscription id to hand out
    next_id: u64,

    /// Read-only status provider queried on each tick
    source: Arc<dyn StatusSource>,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<HubCommand>,

    /// Current broadcast interval
    interval_duration: Duration,
}

impl BroadcastHubActor {
    pub fn new(
        source: Arc<dyn StatusSource>,
        command_rx: mpsc::Receiver<HubCommand>,
        interval_duration: Duration,
    ) -> Self {
        Self {
            subscribers: HashMap::new(),
            next_id: 0,
            source,
            command_rx,
            interval_duration,
        }
    }

    /// Run the actor's main loop until shutdown or channel close.
    #[instrument(skip(self))]
    pub async fn run(mut self) {
        debug!("starting broadcast hub");

        let mut ticker = interval(self.interval_duration);

        loop {
            tokio::select! {
                // Timer tick - broadcast to all subscribers
                _ = ticker.tick() => {
                    self.tick().await;
                }

                // Handle commands
                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        HubCommand::Subscribe { sink, respond_to } => {
                            let id = self.subscribe(sink);
                            let _ = respond_to.send(id);
                        }

                        HubCommand::Unsubscribe { id } => {
                            // idempotent - removing twice is a no-op
                            if self.subscribers.remove(&id).is_some() {
                                debug!("subscriber {id:?} unsubscribed");
                            }
                        }

                        HubCommand::TickNow { respond_to } => {
                            let delivered = self.tick().await;
                            let _ = respond_to.send(delivered);
                        }

                        HubCommand::SubscriberCount { respond_to } => {
                            let _ = respond_to.send(self.subscribers.len());
                        }

                        HubCommand::Shutdown => {
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

        // dropping the sinks closes them
        let count = self.subscribers.len();
        self.subscribers.clear();
        debug!("broadcast hub stopped, closed {count} subscriber sinks");
    }

    fn subscribe(&mut self, sink: Box<dyn Sink>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.insert(id, sink);
        debug!("subscriber {id:?} connected ({} total)", self.subscribers.len());
        id
    }

    /// Compose the current status snapshot and write it to every live
    /// subscriber. A failed write removes that subscriber and never
    /// aborts delivery to the rest. Returns the number of subscribers
    /// still connected afterwards.
    async fn tick(&mut self) -> usize {
        if self.subscribers.is_empty() {
            return 0;
        }

        let message = self.compose_snapshot().await;
        let text = match serde_json::to_string(&message) {
            Ok(text) => text,
            Err(e) => {
                error!("failed to serialize status snapshot: {e}");
                return self.subscribers.len();
            }
        };

        let mut disconnected = vec![];
        for (id, sink) in self.subscribers.iter_mut() {
            if sink.send(&text).is_err() {
                disconnected.push(*id);
            }
        }

        for id in disconnected {
            self.subscribers.remove(&id);
            debug!("subscriber {id:?} disconnected, removed from broadcast set");
        }

        trace!("broadcast tick delivered to {} subscribers", self.subscribers.len());
        self.subscribers.len()
    }

    async fn compose_snapshot(&self) -> serde_json::Value {
        let (system, exchanges, strategies) = tokio::join!(
            self.source.system_status(),
            self.source.exchange_statuses(),
            self.source.strategy_statuses(),
        );

        json!({
            "type": "monitoring_update",
            "timestamp": Utc::now().to_rfc3339(),
            "system_status": system,
            "exchange_statuses": exchanges,
            "strategy_statuses": strategies,
        })
    }
}

/// Handle for controlling the BroadcastHubActor
#[derive(Clone)]
pub struct HubHandle {
    sender: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Spawn a new broadcast hub as a tokio task and return its handle.
    pub fn spawn(source: Arc<dyn StatusSource>, interval_duration: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = BroadcastHubActor::new(source, cmd_rx, interval_duration);

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    /// Register a subscriber sink and get back its subscription handle.
    pub async fn subscribe(&self, sink: impl Sink + 'static) -> Result<SubscriptionId> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(HubCommand::Subscribe {
                sink: Box::new(sink),
                respond_to: tx,
            })
            .await
            .context("failed to send Subscribe command")?;

        rx.await.context("failed to receive subscription id")
    }

    /// Remove a subscriber. Idempotent.
    pub async fn unsubscribe(&self, id: SubscriptionId) {
        let _ = self.sender.send(HubCommand::Unsubscribe { id }).await;
    }

    /// Trigger an immediate broadcast tick; returns the number of live
    /// subscribers after delivery.
    pub async fn tick_now(&self) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(HubCommand::TickNow { respond_to: tx })
            .await
            .context("failed to send TickNow command")?;

        rx.await.context("failed to receive tick result")
    }

    /// Current number of live subscribers.
    pub async fn subscriber_count(&self) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(HubCommand::SubscriberCount { respond_to: tx })
            .await
            .context("failed to send SubscriberCount command")?;

        rx.await.context("failed to receive subscriber count")
    }

    /// Shut down the hub, closing all subscriber sinks.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(HubCommand::Shutdown).await;
    }
}

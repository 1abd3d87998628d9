//! Message types for actor communication
//!
//! Commands are request/response messages sent to a specific actor via
//! mpsc; events are broadcast notifications published for any number of
//! subscribers. Events are cloneable so slow consumers never block the
//! publisher.

use tokio::sync::oneshot;

use crate::Report;

use super::hub::Sink;

/// Event published after every completed monitoring cycle.
///
/// The broadcast channel may lag or drop messages for slow subscribers -
/// acceptable, since reports are continuously generated and persisted
/// independently.
#[derive(Debug, Clone)]
pub struct ReportEvent {
    pub report: Report,
}

/// Commands that can be sent to the MonitorActor
#[derive(Debug)]
pub enum MonitorCommand {
    /// Run a full cycle immediately (bypassing the interval timer)
    ///
    /// Used for testing and manual refresh operations.
    CycleNow {
        respond_to: oneshot::Sender<anyhow::Result<()>>,
    },

    /// Fetch the most recent `n` reports of the current day
    Recent {
        n: usize,
        respond_to: oneshot::Sender<Vec<Report>>,
    },

    /// Update the cycle interval
    ///
    /// The new interval takes effect after the current cycle completes.
    UpdateInterval { interval_secs: u64 },

    /// Gracefully shut down; an in-flight cycle finishes first
    Shutdown,
}

/// Opaque handle identifying one live subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

/// Commands that can be sent to the BroadcastHubActor
pub enum HubCommand {
    /// Register a subscriber sink; responds with its subscription handle
    Subscribe {
        sink: Box<dyn Sink>,
        respond_to: oneshot::Sender<SubscriptionId>,
    },

    /// Remove a subscriber. Idempotent - unknown handles are a no-op.
    Unsubscribe { id: SubscriptionId },

    /// Run a broadcast tick immediately; responds with the number of
    /// subscribers still connected after delivery
    TickNow { respond_to: oneshot::Sender<usize> },

    /// Current number of live subscribers
    SubscriberCount { respond_to: oneshot::Sender<usize> },

    /// Gracefully shut down, closing all subscriber sinks
    Shutdown,
}

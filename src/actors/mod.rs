//! Actor-based monitoring core
//!
//! Two independent periodic actors run as tokio tasks and must never
//! block each other:
//!
//! - **MonitorActor** drives the sample -> evaluate -> dispatch -> persist
//!   cycle on the monitoring interval (default 60s) and publishes each
//!   cycle's report to a broadcast channel.
//! - **BroadcastHubActor** owns the subscriber registry and fans out a
//!   serialized status snapshot on its own cadence (default 5s).
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: each actor has an mpsc command channel for control
//! 2. **Events**: the monitor publishes [`messages::ReportEvent`]s to a
//!    broadcast channel for fan-out
//! 3. **Request/Response**: oneshot channels for synchronous queries

pub mod hub;
pub mod messages;
pub mod monitor;

//! Watcher pipeline: rule specs, the cross-watcher store, and the
//! per-topic evaluation machinery.
//!
//! A watcher is bound to one MQTT topic and one rule list. Each delivered
//! message runs through the same gauntlet: JSON decode, per-event subject
//! extraction, active-hours gate, dependency gate, condition evaluation,
//! edge/cooldown suppression, and finally notification dispatch. All of a
//! watcher's mutable state (stateful buckets, condition states, timers)
//! is owned by a single task; messages and timer firings enter through
//! one queue and are drained serially.

pub mod hours;
pub mod spec;
pub mod status;
pub mod store;
pub mod suppress;
pub mod watcher;


use async_trait::async_trait;
use mqwatch_common::types::Severity;

pub use spec::{ConditionSpec, DependencySpec, Edge, EventSpec, WatchSpec};
pub use store::GlobalStore;
pub use watcher::{Watcher, WatcherEvent};

/// Where a watcher sends the notifications its rules produce.
///
/// The concrete implementation routes by the watcher's id to a recipient
/// list with per-recipient severity floors. Delivery is best-effort; a
/// failing recipient never surfaces here.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, list_id: &str, severity: Severity, message: &str);
}

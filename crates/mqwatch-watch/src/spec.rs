//! Rule declarations as they appear in the configuration file.

use mqwatch_common::types::Severity;
use serde::Deserialize;
use serde_json::Value;

/// One MQTT topic bound to a list of events. The topic may contain the
/// usual `+` and `#` wildcards.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchSpec {
    pub id: String,
    pub topic: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Watch-level default for [`EventSpec::dynamic`].
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default)]
    pub events: Vec<EventSpec>,
}

/// A rule group keyed by one subject (a dotted path into the payload).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSpec {
    pub subject: String,
    /// Seed for the stateful bucket's last value, and the value the
    /// bucket returns to when a reset timer fires.
    #[serde(default)]
    pub default: Value,
    #[serde(default)]
    pub active_hours: Vec<ActiveRange>,
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
    /// Dynamic events never allocate buckets and never write to the
    /// cross-watcher store.
    #[serde(default)]
    pub dynamic: bool,
    /// Template partitioning the stateful bucket, for payload streams
    /// that multiplex many sources over one topic.
    #[serde(default)]
    pub state_key: Option<String>,
    #[serde(default)]
    pub conditions: Vec<ConditionSpec>,
}

/// Local-time range `HH:MM`–`HH:MM`; wraps midnight when `from > to`.
#[derive(Debug, Clone, Deserialize)]
pub struct ActiveRange {
    pub from: String,
    pub to: String,
}

/// Gate on another watcher's last observation. `path` must be exactly
/// `<watchId>.<subject>`.
#[derive(Debug, Clone, Deserialize)]
pub struct DependencySpec {
    pub path: String,
    pub state: Value,
}

/// One matcher within an event: either a typed equality (`value`) or an
/// expression string (`condition`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionSpec {
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub log: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub edge: Edge,
    #[serde(default)]
    pub cooldown_sec: u64,
    /// Template for the suppression source key.
    #[serde(default)]
    pub key: Option<String>,
    /// Seconds of continuous match before the warning fires.
    #[serde(default)]
    pub warning_threshold: u64,
    #[serde(default)]
    pub warning_message: Option<String>,
    #[serde(default = "default_warning_severity")]
    pub warning_severity: Severity,
    /// Seconds without a match before the bucket returns to `default`.
    #[serde(default)]
    pub reset: u64,
}

impl ConditionSpec {
    /// Declaring a non-default edge or a positive cooldown opts this
    /// condition out of the legacy duplicate suppression and its timers.
    pub fn uses_custom_suppression(&self) -> bool {
        self.edge == Edge::Rising || self.cooldown_sec > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    /// Notify on every match.
    Level,
    /// Notify only on false-to-true transitions of the match predicate.
    Rising,
}

impl Default for Edge {
    fn default() -> Self {
        Edge::Level
    }
}

fn default_true() -> bool {
    true
}

fn default_warning_severity() -> Severity {
    Severity::Warning
}

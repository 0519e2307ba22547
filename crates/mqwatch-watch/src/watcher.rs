//! One watcher: a topic-bound rule list plus all of its runtime state.

use crate::hours::{within_active_hours, ActiveWindow};
use crate::spec::{ConditionSpec, DependencySpec, Edge, EventSpec, WatchSpec};
use crate::status::EventStatus;
use crate::store::GlobalStore;
use crate::suppress::SuppressionCore;
use crate::NotificationSink;
use chrono::{DateTime, Local, Timelike};
use mqwatch_common::types::Severity;
use mqwatch_common::value::{canonical_string, lookup_path, normalized_eq};
use mqwatch_expr::{evaluate, interpolate_str, EvalContext};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Everything that can enter a watcher's queue. Messages and timer
/// firings share the queue so that all state mutation happens on one
/// task, in arrival order.
#[derive(Debug)]
pub enum WatcherEvent {
    Message {
        topic: String,
        payload: Vec<u8>,
    },
    WarningFired {
        status_key: String,
        generation: u64,
        warning_value: String,
        message: String,
        severity: Severity,
    },
    ResetFired {
        status_key: String,
        generation: u64,
        default_value: String,
    },
}

pub struct Watcher {
    id: String,
    events: Arc<Vec<EventSpec>>,
    windows: Arc<Vec<Vec<ActiveWindow>>>,
    watch_dynamic: bool,
    store: GlobalStore,
    sink: Arc<dyn NotificationSink>,
    tx: mpsc::Sender<WatcherEvent>,
    buckets: HashMap<String, EventStatus>,
    suppression: SuppressionCore,
}

impl Watcher {
    pub fn new(
        spec: &WatchSpec,
        store: GlobalStore,
        sink: Arc<dyn NotificationSink>,
        tx: mpsc::Sender<WatcherEvent>,
    ) -> Self {
        let windows: Vec<Vec<ActiveWindow>> = spec
            .events
            .iter()
            .map(|event| {
                event
                    .active_hours
                    .iter()
                    .filter_map(|range| {
                        let parsed = ActiveWindow::parse(range);
                        if parsed.is_none() {
                            tracing::warn!(
                                watcher = %spec.id,
                                subject = %event.subject,
                                from = %range.from,
                                to = %range.to,
                                "Ignoring unparsable active-hours range"
                            );
                        }
                        parsed
                    })
                    .collect()
            })
            .collect();

        let mut watcher = Self {
            id: spec.id.clone(),
            events: Arc::new(spec.events.clone()),
            windows: Arc::new(windows),
            watch_dynamic: spec.dynamic,
            store,
            sink,
            tx,
            buckets: HashMap::new(),
            suppression: SuppressionCore::default(),
        };

        // An event with neither `dynamic` nor `stateKey` always owns
        // exactly one bucket, keyed by its subject; seed it up front.
        let events = Arc::clone(&watcher.events);
        for event in events.iter() {
            if !watcher.event_dynamic(event) && event.state_key.is_none() {
                watcher.create_bucket(event.subject.clone(), event);
            }
        }
        watcher
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Sender half of the watcher's queue, for the transport and tests.
    pub fn sender(&self) -> mpsc::Sender<WatcherEvent> {
        self.tx.clone()
    }

    /// Drain the queue until every sender is gone.
    pub async fn run(mut self, mut rx: mpsc::Receiver<WatcherEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle(event, Local::now()).await;
        }
        tracing::debug!(watcher = %self.id, "Watcher queue closed");
    }

    pub async fn handle(&mut self, event: WatcherEvent, now: DateTime<Local>) {
        match event {
            WatcherEvent::Message { topic, payload } => {
                self.process_message(&topic, &payload, now).await;
            }
            WatcherEvent::WarningFired {
                status_key,
                generation,
                warning_value,
                message,
                severity,
            } => {
                self.warning_fired(&status_key, generation, &warning_value, &message, severity)
                    .await;
            }
            WatcherEvent::ResetFired {
                status_key,
                generation,
                default_value,
            } => {
                self.reset_fired(&status_key, generation, default_value);
            }
        }
    }

    /// Run one delivered message through every event's pipeline.
    pub async fn process_message(&mut self, topic: &str, payload: &[u8], now: DateTime<Local>) {
        let payload: Value = match serde_json::from_slice(payload) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(watcher = %self.id, topic, error = %e, "Dropping non-JSON payload");
                return;
            }
        };

        let now_epoch = now.timestamp();
        let minutes = now.time().hour() * 60 + now.time().minute();

        let events = Arc::clone(&self.events);
        let windows = Arc::clone(&self.windows);
        for (idx, event) in events.iter().enumerate() {
            self.process_event(event, &windows[idx], &payload, now_epoch, minutes)
                .await;
        }
    }

    async fn process_event(
        &mut self,
        event: &EventSpec,
        windows: &[ActiveWindow],
        payload: &Value,
        now_epoch: i64,
        minutes: u32,
    ) {
        let Some(raw) = lookup_path(payload, &event.subject) else {
            return;
        };
        let raw = raw.clone();

        if !within_active_hours(windows, minutes) {
            tracing::debug!(
                watcher = %self.id,
                subject = %event.subject,
                "Outside active hours, skipping event"
            );
            return;
        }

        for dep in &event.dependencies {
            if !self.dependency_satisfied(dep) {
                tracing::debug!(
                    watcher = %self.id,
                    subject = %event.subject,
                    dependency = %dep.path,
                    "Dependency not satisfied, skipping event"
                );
                return;
            }
        }

        let dynamic = self.event_dynamic(event);
        let current = canonical_string(&raw);
        let store = self.store.clone();

        let status_key = if dynamic {
            None
        } else {
            let key = match &event.state_key {
                Some(template) => {
                    let ctx = EvalContext::with_value(payload, &raw, &store);
                    format!("{}::{}", interpolate_str(template, &ctx), event.subject)
                }
                None => event.subject.clone(),
            };
            if !self.buckets.contains_key(&key) {
                self.create_bucket(key.clone(), event);
            }
            self.store
                .update(&self.id, &event.subject, Value::String(current.clone()));
            Some(key)
        };

        for (cond_idx, condition) in event.conditions.iter().enumerate() {
            let ctx = EvalContext::with_value(payload, &raw, &store);
            let matched = self.condition_matches(event, cond_idx, condition, &raw, &ctx);

            let source_key = source_key(event, condition, payload, &ctx);
            let full_key = format!("{}::{}::{}::{}", self.id, event.subject, cond_idx, source_key);

            if !matched {
                if condition.edge == Edge::Rising {
                    self.suppression.mark_not_matched(&full_key);
                }
                continue;
            }

            if let Some(log_template) = &condition.log {
                let line = interpolate_str(log_template, &ctx);
                if !line.is_empty() {
                    tracing::info!(watcher = %self.id, subject = %event.subject, "{line}");
                }
            }

            let allowed = self.suppression.should_notify(
                &full_key,
                condition.edge,
                condition.cooldown_sec,
                now_epoch,
            );
            if !allowed {
                tracing::debug!(
                    watcher = %self.id,
                    subject = %event.subject,
                    condition = cond_idx,
                    "Notification suppressed (edge/cooldown)"
                );
            }

            let message = condition
                .message
                .as_ref()
                .map(|template| interpolate_str(template, &ctx));

            if dynamic || condition.uses_custom_suppression() {
                if allowed {
                    if let Some(msg) = message.filter(|m| !m.is_empty()) {
                        self.sink.notify(&self.id, condition.severity, &msg).await;
                    }
                }
            } else if let Some(key) = &status_key {
                // Legacy stateful path: duplicate suppression against the
                // bucket's last value, plus warning/reset timers.
                self.rearm_timers(key, event, condition, &ctx, &current);

                let is_duplicate = self
                    .buckets
                    .get(key)
                    .map(|bucket| bucket.last_value == current)
                    .unwrap_or(false);

                if allowed && !is_duplicate {
                    if let Some(msg) = message.filter(|m| !m.is_empty()) {
                        self.sink.notify(&self.id, condition.severity, &msg).await;
                    }
                    if let Some(bucket) = self.buckets.get_mut(key) {
                        bucket.last_handled_value = Some(current.clone());
                    }
                } else if allowed {
                    tracing::debug!(
                        watcher = %self.id,
                        subject = %event.subject,
                        value = %current,
                        "Value unchanged, notification suppressed"
                    );
                }
            }
        }

        if let Some(key) = &status_key {
            if let Some(bucket) = self.buckets.get_mut(key) {
                bucket.last_value = current;
            }
        }
    }

    fn condition_matches(
        &self,
        event: &EventSpec,
        cond_idx: usize,
        condition: &ConditionSpec,
        raw: &Value,
        ctx: &EvalContext,
    ) -> bool {
        if let Some(expr) = condition.condition.as_deref().filter(|e| !e.trim().is_empty()) {
            return match evaluate(expr, ctx) {
                Ok(matched) => matched,
                Err(e) => {
                    tracing::warn!(
                        watcher = %self.id,
                        subject = %event.subject,
                        condition = cond_idx,
                        error = %e,
                        "Expression failed to evaluate"
                    );
                    false
                }
            };
        }
        match &condition.value {
            None | Some(Value::Null) => true,
            Some(declared @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => {
                normalized_eq(declared, raw)
            }
            Some(_) => false,
        }
    }

    fn dependency_satisfied(&self, dep: &DependencySpec) -> bool {
        let parts: Vec<&str> = dep.path.split('.').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            tracing::warn!(
                watcher = %self.id,
                path = %dep.path,
                "Dependency path must be '<watchId>.<subject>'"
            );
            return false;
        }
        match self.store.get(parts[0], parts[1]) {
            Some(value) => normalized_eq(&value, &dep.state),
            None => false,
        }
    }

    fn event_dynamic(&self, event: &EventSpec) -> bool {
        self.watch_dynamic || event.dynamic
    }

    fn create_bucket(&mut self, key: String, event: &EventSpec) {
        self.store
            .update(&self.id, &event.subject, event.default.clone());
        self.buckets
            .insert(key, EventStatus::new(canonical_string(&event.default)));
    }

    /// Re-evaluate the warning and reset timers on a matching legacy
    /// evaluation. The warning message is interpolated now, not at fire
    /// time, so the notification reflects the payload that armed it.
    fn rearm_timers(
        &mut self,
        status_key: &str,
        event: &EventSpec,
        condition: &ConditionSpec,
        ctx: &EvalContext,
        current: &str,
    ) {
        let warning_message = condition
            .warning_message
            .as_ref()
            .map(|template| interpolate_str(template, ctx))
            .unwrap_or_default();
        let default_value = canonical_string(&event.default);
        let tx = self.tx.clone();

        let Some(bucket) = self.buckets.get_mut(status_key) else {
            return;
        };

        if condition.warning_threshold > 0 {
            if bucket.warning_timer.is_none() {
                bucket.warning_gen += 1;
                let fired = WatcherEvent::WarningFired {
                    status_key: status_key.to_string(),
                    generation: bucket.warning_gen,
                    warning_value: current.to_string(),
                    message: warning_message,
                    severity: condition.warning_severity,
                };
                let delay = Duration::from_secs(condition.warning_threshold);
                let warn_tx = tx.clone();
                bucket.warning_timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = warn_tx.send(fired).await;
                }));
            }
        } else {
            bucket.clear_warning_timer();
            bucket.warning_fired = false;
        }

        bucket.clear_reset_timer();
        if condition.reset > 0 {
            let fired = WatcherEvent::ResetFired {
                status_key: status_key.to_string(),
                generation: bucket.reset_gen,
                default_value,
            };
            let delay = Duration::from_secs(condition.reset);
            bucket.reset_timer = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(fired).await;
            }));
        }
    }

    async fn warning_fired(
        &mut self,
        status_key: &str,
        generation: u64,
        warning_value: &str,
        message: &str,
        severity: Severity,
    ) {
        let still_valid = {
            let Some(bucket) = self.buckets.get_mut(status_key) else {
                return;
            };
            if generation != bucket.warning_gen {
                return;
            }
            bucket.warning_timer = None;
            let valid = !bucket.warning_fired && bucket.last_value == warning_value;
            bucket.warning_fired = true;
            valid
        };

        if still_valid {
            if !message.is_empty() {
                self.sink.notify(&self.id, severity, message).await;
            }
        } else {
            tracing::info!(
                watcher = %self.id,
                status_key,
                "Warning no longer valid, skipping"
            );
        }
    }

    fn reset_fired(&mut self, status_key: &str, generation: u64, default_value: String) {
        let Some(bucket) = self.buckets.get_mut(status_key) else {
            return;
        };
        if generation != bucket.reset_gen {
            return;
        }
        bucket.reset_timer = None;
        bucket.last_value = default_value;
        tracing::debug!(watcher = %self.id, status_key, "Bucket reset to default");
    }

    #[cfg(test)]
    pub(crate) fn bucket(&self, key: &str) -> Option<&EventStatus> {
        self.buckets.get(key)
    }
}

/// Partition key for edge/cooldown tracking: the condition's `key`
/// template, else the event's `stateKey` template, else
/// `tags.host:tags.path` when both exist, else the subject.
fn source_key(
    event: &EventSpec,
    condition: &ConditionSpec,
    payload: &Value,
    ctx: &EvalContext,
) -> String {
    if let Some(template) = &condition.key {
        return interpolate_str(template, ctx);
    }
    if let Some(template) = &event.state_key {
        return interpolate_str(template, ctx);
    }
    if let (Some(host), Some(path)) = (
        lookup_path(payload, "tags.host"),
        lookup_path(payload, "tags.path"),
    ) {
        return format!("{}:{}", canonical_string(host), canonical_string(path));
    }
    event.subject.clone()
}

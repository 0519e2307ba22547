//! Edge and cooldown suppression, tracked per
//! `<watcher>::<subject>::<conditionIndex>::<sourceKey>`.

use crate::spec::Edge;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct ConditionState {
    pub prev_match: bool,
    pub last_sent_epoch: Option<i64>,
}

/// Per-watcher suppression state. Private to the owning watcher task,
/// so no locking.
#[derive(Default)]
pub struct SuppressionCore {
    states: HashMap<String, ConditionState>,
}

impl SuppressionCore {
    /// Decide whether a matched condition may notify at `now`, updating
    /// the record either way. The caller has already established the
    /// match, so `prev_match` unconditionally becomes true.
    pub fn should_notify(&mut self, key: &str, edge: Edge, cooldown_sec: u64, now_epoch: i64) -> bool {
        let state = self.states.entry(key.to_string()).or_default();

        let mut allow = match edge {
            Edge::Rising => !state.prev_match,
            Edge::Level => true,
        };
        state.prev_match = true;

        if allow && cooldown_sec > 0 {
            if let Some(last) = state.last_sent_epoch {
                if now_epoch - last < cooldown_sec as i64 {
                    allow = false;
                }
            }
        }

        if allow {
            state.last_sent_epoch = Some(now_epoch);
        }
        allow
    }

    /// Arm the next rising edge after a non-match. Leaves the cooldown
    /// clock untouched.
    pub fn mark_not_matched(&mut self, key: &str) {
        self.states.entry(key.to_string()).or_default().prev_match = false;
    }

    #[cfg(test)]
    pub(crate) fn state(&self, key: &str) -> Option<&ConditionState> {
        self.states.get(key)
    }
}

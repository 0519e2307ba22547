//! Runtime state for stateful (non-dynamic) events.

use tokio::task::JoinHandle;

/// One stateful bucket. Keyed by the event's subject, or by the
/// interpolated `stateKey` joined with the subject when one is set.
///
/// At most one warning timer and one reset timer are armed at a time.
/// Generation counters fence stale firings: a timer event whose
/// generation no longer matches the bucket is ignored.
pub struct EventStatus {
    pub last_value: String,
    pub last_handled_value: Option<String>,
    pub warning_fired: bool,
    pub(crate) warning_timer: Option<JoinHandle<()>>,
    pub(crate) warning_gen: u64,
    pub(crate) reset_timer: Option<JoinHandle<()>>,
    pub(crate) reset_gen: u64,
}

impl EventStatus {
    pub fn new(seed: String) -> Self {
        Self {
            last_value: seed,
            last_handled_value: None,
            warning_fired: false,
            warning_timer: None,
            warning_gen: 0,
            reset_timer: None,
            reset_gen: 0,
        }
    }

    pub(crate) fn clear_warning_timer(&mut self) {
        if let Some(handle) = self.warning_timer.take() {
            handle.abort();
        }
        self.warning_gen += 1;
    }

    pub(crate) fn clear_reset_timer(&mut self) {
        if let Some(handle) = self.reset_timer.take() {
            handle.abort();
        }
        self.reset_gen += 1;
    }
}

impl Drop for EventStatus {
    fn drop(&mut self) {
        if let Some(handle) = self.warning_timer.take() {
            handle.abort();
        }
        if let Some(handle) = self.reset_timer.take() {
            handle.abort();
        }
    }
}

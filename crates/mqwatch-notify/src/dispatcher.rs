//! Routes a finished notification to the recipients of one list.

use crate::{Method, NotificationChannel};
use chrono::Local;
use mqwatch_common::types::Severity;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Which recipients of the list receive this delivery.
pub enum DeliveryFilter {
    /// Everyone on the list.
    All,
    /// Recipients whose severity floor the message clears.
    Severity(Severity),
    /// Recipients using one of these methods, severity ignored.
    Methods(HashSet<Method>),
}

struct Recipient {
    method: Method,
    address: String,
    min_severity: Severity,
}

/// Recipient lists are keyed by the owning watcher's id. The map is
/// populated at startup and read-only afterwards, so delivery calls can
/// run concurrently without locking.
#[derive(Default)]
pub struct Dispatcher {
    lists: HashMap<String, Vec<Recipient>>,
    channels: HashMap<Method, Arc<dyn NotificationChannel>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_channel(&mut self, channel: Arc<dyn NotificationChannel>) {
        self.channels.insert(channel.method(), channel);
    }

    pub fn add_recipient(
        &mut self,
        method: Method,
        list_id: &str,
        address: &str,
        min_severity: Severity,
    ) {
        self.lists
            .entry(list_id.to_string())
            .or_default()
            .push(Recipient {
                method,
                address: address.to_string(),
                min_severity,
            });
    }

    pub fn recipient_count(&self, list_id: &str) -> usize {
        self.lists.get(list_id).map(Vec::len).unwrap_or(0)
    }

    /// Deliver `message` to every recipient of `list_id` passing the
    /// filter. The message is prefixed with a local timestamp. Mail and
    /// SMS sends are offloaded so a slow transport cannot stall the
    /// caller; failures are logged per recipient and never propagate.
    pub async fn send_notifications(&self, list_id: &str, message: &str, filter: DeliveryFilter) {
        let Some(recipients) = self.lists.get(list_id) else {
            tracing::debug!(list_id, "No recipient list for notification");
            return;
        };

        let stamped = format!("{} {}", Local::now().format("%Y-%m-%d %H:%M:%S"), message);

        for recipient in recipients {
            let deliver = match &filter {
                DeliveryFilter::All => true,
                DeliveryFilter::Severity(severity) => *severity >= recipient.min_severity,
                DeliveryFilter::Methods(methods) => methods.contains(&recipient.method),
            };
            if !deliver {
                continue;
            }
            self.dispatch(recipient, &stamped).await;
        }
    }

    async fn dispatch(&self, recipient: &Recipient, message: &str) {
        let Some(channel) = self.channels.get(&recipient.method) else {
            tracing::warn!(method = %recipient.method, "No channel registered for recipient");
            return;
        };

        match recipient.method {
            // Local, cheap, and ordering matters for the log.
            Method::Log => {
                if let Err(e) = channel.send(message, &recipient.address).await {
                    tracing::error!(error = %e, "Log delivery failed");
                }
            }
            // Network transports run detached from the pipeline.
            Method::Mail | Method::Sms => {
                let channel = Arc::clone(channel);
                let message = message.to_string();
                let address = recipient.address.clone();
                let method = recipient.method;
                tokio::spawn(async move {
                    if let Err(e) = channel.send(&message, &address).await {
                        tracing::error!(
                            method = %method,
                            recipient = %address,
                            error = %e,
                            "Notification delivery failed"
                        );
                    }
                });
            }
        }
    }
}

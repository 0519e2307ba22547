//! Notification delivery: recipient lists, severity filtering, and the
//! LOG / MAIL / SMS channels behind them.
//!
//! Recipient lists are built once at startup and are read-only
//! afterwards. Delivery is best-effort: a failing recipient is logged
//! and never blocks the rest of the list or the pipeline that produced
//! the message.

pub mod channels;
pub mod dispatcher;
pub mod error;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use serde::Deserialize;

pub use dispatcher::{DeliveryFilter, Dispatcher};
pub use error::NotifyError;

/// Delivery method, as spelled in the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Log,
    Mail,
    Sms,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Log => write!(f, "LOG"),
            Method::Mail => write!(f, "MAIL"),
            Method::Sms => write!(f, "SMS"),
        }
    }
}

/// One delivery channel. Implementations exist for the local log, SMTP
/// mail, and an SMS gateway; the dispatcher routes to whichever channel
/// is registered for a recipient's method.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Deliver `message` to `address`. The address is empty for LOG
    /// recipients.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying transport rejects the send;
    /// the dispatcher logs it and moves on.
    async fn send(&self, message: &str, address: &str) -> Result<(), NotifyError>;

    fn method(&self) -> Method;
}

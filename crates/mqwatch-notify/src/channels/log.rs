use crate::error::Result;
use crate::{Method, NotificationChannel};
use async_trait::async_trait;

/// Emits the notification to the local log. The recipient address is
/// unused.
pub struct LogChannel;

#[async_trait]
impl NotificationChannel for LogChannel {
    async fn send(&self, message: &str, _address: &str) -> Result<()> {
        tracing::info!("{message}");
        Ok(())
    }

    fn method(&self) -> Method {
        Method::Log
    }
}

use crate::error::{NotifyError, Result};
use crate::{Method, NotificationChannel};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Gateway settings, mirroring the `messageService.sms` config section.
/// SMS is optional: missing credentials or `enabled: false` produce a
/// channel that logs and drops every send.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SmsConfig {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
}

struct GatewayCredentials {
    sid: String,
    token: String,
    service: String,
}

pub struct SmsChannel {
    client: reqwest::Client,
    credentials: Option<GatewayCredentials>,
}

impl SmsChannel {
    pub fn new(config: &SmsConfig) -> Self {
        let enabled = config.enabled.unwrap_or(true);
        let credentials = match (enabled, &config.sid, &config.token, &config.service) {
            (true, Some(sid), Some(token), Some(service)) => Some(GatewayCredentials {
                sid: sid.clone(),
                token: token.clone(),
                service: service.clone(),
            }),
            _ => None,
        };
        Self {
            client: reqwest::Client::new(),
            credentials,
        }
    }

    pub fn available(&self) -> bool {
        self.credentials.is_some()
    }
}

#[async_trait]
impl NotificationChannel for SmsChannel {
    async fn send(&self, message: &str, address: &str) -> Result<()> {
        let Some(credentials) = &self.credentials else {
            tracing::warn!(recipient = %address, "SMS requested but sending is unavailable");
            return Ok(());
        };

        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            credentials.sid
        );
        let params = [
            ("To", address),
            ("Body", message),
            ("MessagingServiceSid", credentials.service.as_str()),
        ];
        let response = self
            .client
            .post(&url)
            .basic_auth(&credentials.sid, Some(&credentials.token))
            .form(&params)
            .timeout(SEND_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::SmsGateway(response.status().as_u16()));
        }
        Ok(())
    }

    fn method(&self) -> Method {
        Method::Sms
    }
}

use crate::error::{NotifyError, Result};
use crate::{Method, NotificationChannel};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;

/// SMTP settings, mirroring the `messageService.mail` config section.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub from: String,
    #[serde(default, rename = "ignoreTLS")]
    pub ignore_tls: bool,
    #[serde(default, rename = "requireTLS")]
    pub require_tls: bool,
    /// EHLO client name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tls: Option<MailTlsConfig>,
    #[serde(default)]
    pub auth: Option<MailAuthConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailTlsConfig {
    #[serde(default)]
    pub servername: Option<String>,
    #[serde(default, rename = "rejectUnauthorized")]
    pub reject_unauthorized: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailAuthConfig {
    pub user: String,
    pub pass: String,
}

pub struct MailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl MailChannel {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Address {
                address: config.from.clone(),
                reason: e.to_string(),
            })?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e| NotifyError::InvalidMailConfig(e.to_string()))?
            .port(config.port);

        if config.ignore_tls {
            builder = builder.tls(Tls::None);
        } else {
            let tls = config.tls.clone().unwrap_or_default();
            let servername = tls.servername.unwrap_or_else(|| config.host.clone());
            let mut params = TlsParameters::builder(servername);
            if tls.reject_unauthorized == Some(false) {
                params = params.dangerous_accept_invalid_certs(true);
            }
            let params = params
                .build()
                .map_err(|e| NotifyError::InvalidMailConfig(e.to_string()))?;
            builder = builder.tls(if config.require_tls {
                Tls::Required(params)
            } else {
                Tls::Opportunistic(params)
            });
        }

        if let Some(auth) = &config.auth {
            builder = builder.credentials(Credentials::new(auth.user.clone(), auth.pass.clone()));
        }
        if let Some(name) = &config.name {
            builder = builder.hello_name(ClientId::Domain(name.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl NotificationChannel for MailChannel {
    async fn send(&self, message: &str, address: &str) -> Result<()> {
        let to: Mailbox =
            address
                .parse()
                .map_err(|e: lettre::address::AddressError| NotifyError::Address {
                    address: address.to_string(),
                    reason: e.to_string(),
                })?;
        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Notification Event")
            .header(ContentType::TEXT_PLAIN)
            .body(message.to_string())?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;
        Ok(())
    }

    fn method(&self) -> Method {
        Method::Mail
    }
}

/// Errors that can occur while delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Mail transport configuration is unusable.
    #[error("invalid mail configuration: {0}")]
    InvalidMailConfig(String),

    /// A recipient address did not parse as a mailbox.
    #[error("invalid mail address '{address}': {reason}")]
    Address { address: String, reason: String },

    /// Building the mail message failed.
    #[error("mail build error: {0}")]
    MailBuild(#[from] lettre::error::Error),

    /// The SMTP server rejected the send.
    #[error("SMTP error: {0}")]
    Smtp(String),

    /// An HTTP request to the SMS gateway failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The SMS gateway returned a non-success status.
    #[error("SMS gateway returned status {0}")]
    SmsGateway(u16),
}

pub type Result<T> = std::result::Result<T, NotifyError>;

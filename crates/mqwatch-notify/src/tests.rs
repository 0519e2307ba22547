use crate::channels::mail::{MailChannel, MailConfig};
use crate::channels::sms::{SmsChannel, SmsConfig};
use crate::dispatcher::{DeliveryFilter, Dispatcher};
use crate::{Method, NotificationChannel};
use async_trait::async_trait;
use mqwatch_common::types::Severity;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

struct RecordingChannel {
    method: Method,
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingChannel {
    fn new(method: Method) -> (Arc<Self>, Arc<Mutex<Vec<(String, String)>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        (
            Arc::new(Self {
                method,
                sent: Arc::clone(&sent),
            }),
            sent,
        )
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn send(&self, message: &str, address: &str) -> crate::error::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((message.to_string(), address.to_string()));
        Ok(())
    }

    fn method(&self) -> Method {
        self.method
    }
}

async fn settle() {
    // Let detached delivery tasks run on the current-thread scheduler
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn severity_floor_filters_recipients() {
    let (log, sent) = RecordingChannel::new(Method::Log);
    let mut dispatcher = Dispatcher::new();
    dispatcher.register_channel(log);
    dispatcher.add_recipient(Method::Log, "door", "", Severity::Info);
    dispatcher.add_recipient(Method::Log, "door", "", Severity::Warning);

    dispatcher
        .send_notifications("door", "m1", DeliveryFilter::Severity(Severity::Debug))
        .await;
    assert_eq!(sent.lock().unwrap().len(), 0);

    dispatcher
        .send_notifications("door", "m2", DeliveryFilter::Severity(Severity::Info))
        .await;
    assert_eq!(sent.lock().unwrap().len(), 1);

    dispatcher
        .send_notifications("door", "m3", DeliveryFilter::Severity(Severity::Critical))
        .await;
    assert_eq!(sent.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn method_filter_ignores_severity() {
    let (log, log_sent) = RecordingChannel::new(Method::Log);
    let (mail, mail_sent) = RecordingChannel::new(Method::Mail);
    let mut dispatcher = Dispatcher::new();
    dispatcher.register_channel(log);
    dispatcher.register_channel(mail);
    dispatcher.add_recipient(Method::Log, "w", "", Severity::Critical);
    dispatcher.add_recipient(Method::Mail, "w", "ops@example.com", Severity::Critical);

    let methods: HashSet<Method> = [Method::Mail].into_iter().collect();
    dispatcher
        .send_notifications("w", "mail only", DeliveryFilter::Methods(methods))
        .await;
    settle().await;

    assert_eq!(log_sent.lock().unwrap().len(), 0);
    let mail_sent = mail_sent.lock().unwrap();
    assert_eq!(mail_sent.len(), 1);
    assert_eq!(mail_sent[0].1, "ops@example.com");
}

#[tokio::test]
async fn unfiltered_delivery_reaches_everyone() {
    let (log, log_sent) = RecordingChannel::new(Method::Log);
    let (sms, sms_sent) = RecordingChannel::new(Method::Sms);
    let mut dispatcher = Dispatcher::new();
    dispatcher.register_channel(log);
    dispatcher.register_channel(sms);
    dispatcher.add_recipient(Method::Log, "w", "", Severity::Critical);
    dispatcher.add_recipient(Method::Sms, "w", "+15551234", Severity::Critical);

    dispatcher
        .send_notifications("w", "hello", DeliveryFilter::All)
        .await;
    settle().await;

    assert_eq!(log_sent.lock().unwrap().len(), 1);
    assert_eq!(sms_sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn messages_carry_a_local_timestamp_prefix() {
    let (log, sent) = RecordingChannel::new(Method::Log);
    let mut dispatcher = Dispatcher::new();
    dispatcher.register_channel(log);
    dispatcher.add_recipient(Method::Log, "w", "", Severity::Info);

    dispatcher
        .send_notifications("w", "Door open!", DeliveryFilter::All)
        .await;

    let sent = sent.lock().unwrap();
    let message = &sent[0].0;
    // "YYYY-MM-DD HH:MM:SS " prefix, then the body
    assert_eq!(message.len(), 20 + "Door open!".len());
    assert!(message.ends_with(" Door open!"));
    assert_eq!(&message[4..5], "-");
    assert_eq!(&message[13..14], ":");
}

#[tokio::test]
async fn unknown_list_is_a_quiet_noop() {
    let (log, sent) = RecordingChannel::new(Method::Log);
    let mut dispatcher = Dispatcher::new();
    dispatcher.register_channel(log);

    dispatcher
        .send_notifications("nobody", "msg", DeliveryFilter::All)
        .await;
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_channel_does_not_block_other_recipients() {
    let (log, sent) = RecordingChannel::new(Method::Log);
    let mut dispatcher = Dispatcher::new();
    dispatcher.register_channel(log);
    // MAIL recipient with no mail channel registered
    dispatcher.add_recipient(Method::Mail, "w", "ops@example.com", Severity::Info);
    dispatcher.add_recipient(Method::Log, "w", "", Severity::Info);

    dispatcher
        .send_notifications("w", "msg", DeliveryFilter::All)
        .await;
    assert_eq!(sent.lock().unwrap().len(), 1);
}

// ── channels ──

#[tokio::test]
async fn sms_without_credentials_logs_and_returns() {
    let channel = SmsChannel::new(&SmsConfig::default());
    assert!(!channel.available());
    // Must not attempt any network call
    assert!(channel.send("msg", "+15551234").await.is_ok());
}

#[test]
fn sms_disabled_overrides_credentials() {
    let config = SmsConfig {
        enabled: Some(false),
        sid: Some("AC123".into()),
        token: Some("tok".into()),
        service: Some("MG456".into()),
    };
    assert!(!SmsChannel::new(&config).available());
}

#[test]
fn sms_with_credentials_is_available() {
    let config = SmsConfig {
        enabled: None,
        sid: Some("AC123".into()),
        token: Some("tok".into()),
        service: Some("MG456".into()),
    };
    assert!(SmsChannel::new(&config).available());
}

#[test]
fn mail_config_parses_nodemailer_style_keys() {
    let config: MailConfig = serde_json::from_str(
        r#"{
            "host": "smtp.example.com",
            "port": 587,
            "from": "alerts@example.com",
            "ignoreTLS": false,
            "requireTLS": true,
            "name": "mqwatch.local",
            "tls": {"servername": "smtp.example.com", "rejectUnauthorized": false},
            "auth": {"user": "alerts", "pass": "secret"}
        }"#,
    )
    .unwrap();
    assert!(config.require_tls);
    assert!(!config.ignore_tls);
    assert_eq!(
        config.tls.as_ref().unwrap().reject_unauthorized,
        Some(false)
    );
}

#[test]
fn mail_channel_builds_without_tls() {
    let config: MailConfig = serde_json::from_str(
        r#"{"host": "smtp.example.com", "port": 25, "from": "alerts@example.com", "ignoreTLS": true}"#,
    )
    .unwrap();
    assert!(MailChannel::new(&config).is_ok());
}

#[test]
fn mail_channel_rejects_bad_from_address() {
    let config: MailConfig = serde_json::from_str(
        r#"{"host": "smtp.example.com", "port": 25, "from": "not an address"}"#,
    )
    .unwrap();
    assert!(MailChannel::new(&config).is_err());
}

#[test]
fn recipient_method_spelling_is_uppercase() {
    assert_eq!(
        serde_json::from_str::<Method>(r#""LOG""#).unwrap(),
        Method::Log
    );
    assert_eq!(
        serde_json::from_str::<Method>(r#""MAIL""#).unwrap(),
        Method::Mail
    );
    assert_eq!(
        serde_json::from_str::<Method>(r#""SMS""#).unwrap(),
        Method::Sms
    );
    assert!(serde_json::from_str::<Method>(r#""PIGEON""#).is_err());
}

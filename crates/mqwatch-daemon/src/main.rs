mod config;
mod transport;

use anyhow::Result;
use async_trait::async_trait;
use config::AppConfig;
use mqwatch_common::types::Severity;
use mqwatch_notify::channels::log::LogChannel;
use mqwatch_notify::channels::mail::MailChannel;
use mqwatch_notify::channels::sms::SmsChannel;
use mqwatch_notify::{DeliveryFilter, Dispatcher};
use mqwatch_watch::{GlobalStore, NotificationSink, Watcher};
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// Adapts the dispatcher to the sink interface the watchers expect:
/// every rule-produced notification is a severity-filtered delivery.
struct DispatcherSink(Arc<Dispatcher>);

#[async_trait]
impl NotificationSink for DispatcherSink {
    async fn notify(&self, list_id: &str, severity: Severity, message: &str) {
        self.0
            .send_notifications(list_id, message, DeliveryFilter::Severity(severity))
            .await;
    }
}

/// `LOG_LEVEL` feeds the filter (default `debug`); `LOG_PATH` redirects
/// output to `log.txt` inside that directory, created if absent. The
/// returned guard must live as long as the process.
fn init_logging() -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "debug".to_string());
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("debug"));

    match std::env::var("LOG_PATH") {
        Ok(dir) if !dir.is_empty() => {
            std::fs::create_dir_all(&dir)?;
            let appender = tracing_appender::rolling::never(&dir, "log.txt");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Ok(Some(guard))
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            Ok(None)
        }
    }
}

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  mqwatch [config.json]    Start the watcher daemon");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CONFIG_FILE    Config path (overridden by the positional argument)");
    eprintln!("  LOG_PATH       Directory for log.txt (stderr when unset)");
    eprintln!("  LOG_LEVEL      Log filter, default 'debug'");
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install default CryptoProvider: {e:?}"))?;

    let _log_guard = init_logging()?;

    let arg = std::env::args().nth(1);
    if matches!(arg.as_deref(), Some("--help" | "-h")) {
        print_usage();
        return Ok(());
    }
    let config_path = arg
        .or_else(|| std::env::var("CONFIG_FILE").ok())
        .unwrap_or_else(|| "config/mqwatch.json".to_string());

    let config = match AppConfig::load(Path::new(&config_path)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %config_path, error = %e, "Configuration error");
            std::process::exit(1);
        }
    };

    let mut dispatcher = Dispatcher::new();
    dispatcher.register_channel(Arc::new(LogChannel));

    if let Some(mail_config) = &config.message_service.mail {
        match MailChannel::new(mail_config) {
            Ok(channel) => dispatcher.register_channel(Arc::new(channel)),
            Err(e) => {
                tracing::error!(error = %e, "Configuration error: unusable mail transport");
                std::process::exit(1);
            }
        }
    }

    let sms = SmsChannel::new(&config.message_service.sms);
    if !sms.available() {
        tracing::info!("SMS delivery unavailable (disabled or missing credentials)");
    }
    dispatcher.register_channel(Arc::new(sms));

    for list in &config.notification_list {
        for recipient in &list.recipients {
            if !recipient.enabled {
                continue;
            }
            dispatcher.add_recipient(
                recipient.method,
                &list.id,
                &recipient.recipient,
                recipient.min_severity,
            );
        }
        tracing::info!(
            list = %list.id,
            recipients = dispatcher.recipient_count(&list.id),
            "Loaded notification list"
        );
    }

    let dispatcher = Arc::new(dispatcher);
    let sink: Arc<dyn NotificationSink> = Arc::new(DispatcherSink(Arc::clone(&dispatcher)));
    let store = GlobalStore::new();

    let mut tasks = Vec::new();
    let mut started = 0usize;
    for spec in &config.watch_list {
        if !spec.enabled {
            tracing::info!(watcher = %spec.id, "Watcher disabled, skipping");
            continue;
        }
        let (tx, rx) = mpsc::channel(256);
        let watcher = Watcher::new(spec, store.clone(), Arc::clone(&sink), tx.clone());
        tracing::info!(watcher = %spec.id, topic = %spec.topic, events = spec.events.len(), "Starting watcher");
        tasks.push(tokio::spawn(watcher.run(rx)));
        tasks.push(tokio::spawn(transport::run_transport(
            config.mqtt.clone(),
            spec.id.clone(),
            spec.topic.clone(),
            tx,
        )));
        started += 1;
    }

    tracing::info!(
        watchers = started,
        lists = config.notification_list.len(),
        "mqwatch started"
    );

    signal::ctrl_c().await?;
    tracing::info!("Shutting down gracefully");
    for task in tasks {
        task.abort();
    }
    Ok(())
}

//! The single JSON configuration document.
//!
//! Located by the `CONFIG_FILE` environment variable (or a positional
//! argument, or `config/mqwatch.json`). A missing `watchList` or
//! `notificationList`, or an unknown recipient type, is fatal at
//! startup.

use mqwatch_common::types::Severity;
use mqwatch_notify::channels::mail::MailConfig;
use mqwatch_notify::channels::sms::SmsConfig;
use mqwatch_notify::Method;
use mqwatch_watch::WatchSpec;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub message_service: MessageServiceConfig,
    pub watch_list: Vec<WatchSpec>,
    pub notification_list: Vec<NotificationListConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MqttConfig {
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageServiceConfig {
    #[serde(default)]
    pub mail: Option<MailConfig>,
    #[serde(default)]
    pub sms: SmsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationListConfig {
    pub id: String,
    #[serde(default)]
    pub recipients: Vec<RecipientConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientConfig {
    #[serde(rename = "type")]
    pub method: Method,
    #[serde(default)]
    pub recipient: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub min_severity: Severity,
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_true() -> bool {
    true
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> serde_json::Value {
        serde_json::json!({
            "mqtt": {"host": "broker.local", "port": 1883},
            "watchList": [{
                "id": "door",
                "topic": "zigbee2mqtt/DoorSensor",
                "events": []
            }],
            "notificationList": [{
                "id": "door",
                "recipients": [
                    {"type": "LOG", "recipient": "", "enabled": true},
                    {"type": "MAIL", "recipient": "ops@example.com", "enabled": true, "minSeverity": "warning"}
                ]
            }]
        })
    }

    #[test]
    fn minimal_config_parses() {
        let config: AppConfig = serde_json::from_value(minimal()).unwrap();
        assert_eq!(config.watch_list.len(), 1);
        assert_eq!(config.notification_list[0].recipients.len(), 2);
        assert_eq!(
            config.notification_list[0].recipients[1].min_severity,
            Severity::Warning
        );
        assert!(config.message_service.mail.is_none());
    }

    #[test]
    fn missing_watch_list_is_an_error() {
        let mut doc = minimal();
        doc.as_object_mut().unwrap().remove("watchList");
        assert!(serde_json::from_value::<AppConfig>(doc).is_err());
    }

    #[test]
    fn missing_notification_list_is_an_error() {
        let mut doc = minimal();
        doc.as_object_mut().unwrap().remove("notificationList");
        assert!(serde_json::from_value::<AppConfig>(doc).is_err());
    }

    #[test]
    fn non_array_watch_list_is_an_error() {
        let mut doc = minimal();
        doc["watchList"] = serde_json::json!("not a list");
        assert!(serde_json::from_value::<AppConfig>(doc).is_err());
    }

    #[test]
    fn unknown_recipient_type_is_an_error() {
        let mut doc = minimal();
        doc["notificationList"][0]["recipients"][0]["type"] = serde_json::json!("PIGEON");
        assert!(serde_json::from_value::<AppConfig>(doc).is_err());
    }

    #[test]
    fn recipient_defaults() {
        let recipient: RecipientConfig =
            serde_json::from_value(serde_json::json!({"type": "LOG", "recipient": ""})).unwrap();
        assert!(recipient.enabled);
        assert_eq!(recipient.min_severity, Severity::Info);
    }
}

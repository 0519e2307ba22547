//! MQTT transport, one connection per watcher.
//!
//! The loop drives rumqttc's event loop directly: a ConnAck triggers the
//! (re)subscribe, publishes are forwarded into the watcher's queue, and
//! any error or disconnect backs off a fixed 2.5 seconds before the next
//! poll reconnects. Messages are treated as at-most-once.

use crate::config::MqttConfig;
use mqwatch_watch::WatcherEvent;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::mpsc;

const RECONNECT_DELAY: Duration = Duration::from_millis(2500);

pub async fn run_transport(
    mqtt: MqttConfig,
    watcher_id: String,
    topic: String,
    tx: mpsc::Sender<WatcherEvent>,
) {
    let mut options = MqttOptions::new(format!("mqwatch-{watcher_id}"), mqtt.host, mqtt.port);
    options.set_keep_alive(Duration::from_secs(30));
    if let (Some(username), Some(password)) = (mqtt.username, mqtt.password) {
        options.set_credentials(username, password);
    }

    let (client, mut eventloop) = AsyncClient::new(options, 16);

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!(watcher = %watcher_id, topic = %topic, "Connected to broker, subscribing");
                if let Err(e) = client.subscribe(topic.clone(), QoS::AtMostOnce).await {
                    tracing::error!(watcher = %watcher_id, error = %e, "Subscribe failed");
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let event = WatcherEvent::Message {
                    topic: publish.topic.clone(),
                    payload: publish.payload.to_vec(),
                };
                if tx.send(event).await.is_err() {
                    tracing::warn!(watcher = %watcher_id, "Watcher queue closed, stopping transport");
                    return;
                }
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::warn!(watcher = %watcher_id, "Broker disconnected, reconnecting in 2.5s");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(watcher = %watcher_id, error = %e, "MQTT connection error, reconnecting in 2.5s");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

//! MQTT Publish Sink
//!
//! The collector publishes with an emitter-style `(key, channel,
//! payload)` contract; on plain MQTT the channel key becomes a topic
//! prefix, so `publish("k", "cars/corsa/engineRpm", …)` lands on topic
//! `k/cars/corsa/engineRpm` and an empty key publishes on the bare
//! channel.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, MqttOptions, QoS};
use thiserror::Error;
use tracing::{debug, error, info};

/// Sink error types
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("publish failed: {0}")]
    Publish(String),
}

/// Broker connection settings
#[derive(Debug, Clone)]
pub struct SinkConfig {
    /// MQTT broker host
    pub host: String,
    /// MQTT broker port
    pub port: u16,
    /// Client identifier presented to the broker
    pub client_id: String,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "obd-collector".to_string(),
        }
    }
}

/// Publish sink backed by an MQTT broker connection
pub struct MqttSink {
    client: AsyncClient,
}

impl MqttSink {
    /// Open the broker connection and spawn its event-loop driver.
    ///
    /// The driver task owns reconnection: rumqttc re-dials on the next
    /// poll after an error, so failures here are logged and retried
    /// rather than surfaced.
    pub fn connect(config: SinkConfig) -> Self {
        let mut options = MqttOptions::new(config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(30));

        let (client, mut eventloop) = AsyncClient::new(options, 10);

        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(incoming)) => {
                        debug!("MQTT incoming: {:?}", incoming);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("MQTT connection error: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        });

        info!("Connecting to MQTT broker at {}:{}", config.host, config.port);
        Self { client }
    }

    /// Publish one payload on `key/channel`.
    pub async fn publish(&self, key: &str, channel: &str, payload: &str) -> Result<(), SinkError> {
        self.client
            .publish(
                topic(key, channel),
                QoS::AtLeastOnce,
                false,
                payload.as_bytes().to_vec(),
            )
            .await
            .map_err(|e| SinkError::Publish(e.to_string()))
    }
}

/// Channel key and channel joined into an MQTT topic.
pub fn topic(key: &str, channel: &str) -> String {
    if key.is_empty() {
        channel.to_string()
    } else {
        format!("{key}/{channel}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_topics_get_the_prefix() {
        assert_eq!(topic("k1", "cars/corsa/engineRpm"), "k1/cars/corsa/engineRpm");
    }

    #[test]
    fn empty_key_publishes_on_the_bare_channel() {
        assert_eq!(topic("", "cars/corsa/engineRpm"), "cars/corsa/engineRpm");
    }
}

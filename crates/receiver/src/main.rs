//! Car Message Receiver - Main Entry Point
//!
//! Waits indefinitely for car messages: subscribes to every vehicle
//! parameter channel and appends each payload to disk, one folder per
//! vehicle, one file per parameter.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// One folder per vehicle is created under this directory
const OUTPUT_DIR: &str = "cars_output";

#[derive(Debug, Clone, Deserialize)]
struct ReceiverConfig {
    mqtt: MqttSettings,
}

#[derive(Debug, Clone, Deserialize)]
struct MqttSettings {
    host: String,
    port: u16,
    key: String,
}

impl ReceiverConfig {
    fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("mqtt.host", "localhost")?
            .set_default("mqtt.port", 1883)?
            .set_default("mqtt.key", "")?
            .add_source(config::Environment::with_prefix("OBD").separator("__"))
            .build()?
            .try_deserialize()
    }
}

fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("=== Car Message Receiver v{} ===", env!("CARGO_PKG_VERSION"));

    let cfg = ReceiverConfig::load().context("loading configuration")?;

    tokio::fs::create_dir_all(OUTPUT_DIR)
        .await
        .context("creating output directory")?;

    let mut options = MqttOptions::new("car-receiver", &cfg.mqtt.host, cfg.mqtt.port);
    options.set_keep_alive(Duration::from_secs(30));
    let (client, mut eventloop) = AsyncClient::new(options, 10);

    let filter = mqtt_sink::topic(&cfg.mqtt.key, "cars/+/+");
    client
        .subscribe(&filter, QoS::AtLeastOnce)
        .await
        .context("subscribing to vehicle channels")?;
    info!("Subscribed to {}", filter);

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if let Err(e) = save_message(&publish.topic, &publish.payload).await {
                    error!("Couldn't save message on {}: {}", publish.topic, e);
                }
            }
            Ok(_) => {}
            Err(e) => {
                error!("MQTT connection error: {}", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

/// Append one reading under `cars_output/<vehicle>/<parameter>`.
async fn save_message(topic: &str, payload: &[u8]) -> anyhow::Result<()> {
    let (vehicle, parameter) = split_topic(topic).context("unexpected topic shape")?;

    let dir = PathBuf::from(OUTPUT_DIR).join(vehicle);
    tokio::fs::create_dir_all(&dir).await?;

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(parameter))
        .await?;

    let line = format!(
        "{} {}\n",
        Local::now().format("%Y/%m/%d %H:%M:%S%.6f"),
        String::from_utf8_lossy(payload).trim()
    );
    file.write_all(line.as_bytes()).await?;

    Ok(())
}

/// Split `…/cars/<vehicle>/<parameter>` into its two components.
///
/// Segments that could escape the output directory are rejected.
fn split_topic(topic: &str) -> Option<(&str, &str)> {
    let mut segments = topic.rsplit('/');
    let parameter = segments.next()?;
    let vehicle = segments.next()?;
    if segments.next() != Some("cars") {
        return None;
    }
    if [parameter, vehicle]
        .iter()
        .any(|s| s.is_empty() || *s == "." || *s == "..")
    {
        return None;
    }
    Some((vehicle, parameter))
}

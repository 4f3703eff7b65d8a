//! OBD-II Telemetry Collector - Main Entry Point
//!
//! Opens the adapter serial port, discovers which parameter ids the
//! vehicle supports, then runs one polling worker per registered
//! parameter plus a single publishing consumer until shutdown.

mod config;

use std::sync::Arc;

use anyhow::Context;
use mqtt_sink::{MqttSink, SinkConfig};
use obd_link::{discover_supported_pids, registry, Transport};
use obd_sampler::{run_parameter_worker, Reading, SamplerConfig};
use tokio::sync::mpsc;
use tokio_serial::SerialPortBuilderExt;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::CollectorConfig;

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

    info!("=== OBD-II Telemetry Collector v{} ===", env!("CARGO_PKG_VERSION"));

    let cfg = CollectorConfig::load().context("loading configuration")?;
    info!("Chosen port: {}", cfg.serial_port);
    info!("Chosen baud rate: {}", cfg.baud_rate);

    let link = tokio_serial::new(&cfg.serial_port, cfg.baud_rate)
        .open_native_async()
        .with_context(|| format!("opening serial port {}", cfg.serial_port))?;
    let transport = Arc::new(Transport::new(link, cfg.read_timeout()));

    let supported = Arc::new(discover_supported_pids(&transport).await);

    let sink = MqttSink::connect(SinkConfig {
        host: cfg.mqtt.host.clone(),
        port: cfg.mqtt.port,
        client_id: format!("collector-{}", cfg.vehicle),
    });

    let sampler_config = SamplerConfig {
        window_size: cfg.window_size,
        pre_read_delay: cfg.pre_read_delay(),
    };

    let (readings_tx, readings_rx) = mpsc::channel(64);
    for parameter in registry() {
        tokio::spawn(run_parameter_worker(
            transport.clone(),
            parameter,
            supported.clone(),
            sampler_config.clone(),
            readings_tx.clone(),
        ));
    }
    drop(readings_tx);

    let publisher = tokio::spawn(publish_readings(
        readings_rx,
        sink,
        cfg.mqtt.key.clone(),
        cfg.vehicle.clone(),
    ));

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutting application down...");
    publisher.abort();

    Ok(())
}

/// Single publishing consumer for every worker's aggregated readings.
///
/// A failed publish drops that reading; the workers keep sampling and
/// the next window proceeds normally.
async fn publish_readings(
    mut readings: mpsc::Receiver<Reading>,
    sink: MqttSink,
    key: String,
    vehicle: String,
) {
    while let Some(reading) = readings.recv().await {
        let channel = reading_channel(&vehicle, reading.parameter);
        let payload = format_value(reading.value);
        if let Err(e) = sink.publish(&key, &channel, &payload).await {
            error!("Couldn't publish reading: {}", e);
        }
    }
}

/// Channel key for one vehicle parameter.
fn reading_channel(vehicle: &str, parameter: &str) -> String {
    format!("cars/{vehicle}/{parameter}")
}

/// Published payloads are fixed-precision decimal strings.
fn format_value(value: f64) -> String {
    format!("{value:.2}")
}

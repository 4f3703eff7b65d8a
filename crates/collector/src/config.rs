//! Collector Configuration
//!
//! Built-in defaults layered under `OBD_*` environment overrides, e.g.
//! `OBD_SERIAL_PORT=/dev/ttyUSB0 OBD_VEHICLE=corsa OBD_MQTT__HOST=broker`.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorConfig {
    /// Serial device the adapter is attached to
    pub serial_port: String,
    /// Adapter baud rate
    pub baud_rate: u32,
    /// Upper bound on one reply read
    pub read_timeout_ms: u64,
    /// Settle time between write and read in a transaction
    pub pre_read_delay_ms: u64,
    /// Vehicle identifier used in the published channel key
    pub vehicle: String,
    /// Samples averaged into one published reading
    pub window_size: usize,
    pub mqtt: MqttSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MqttSettings {
    pub host: String,
    pub port: u16,
    /// Channel key; empty publishes on bare channels
    pub key: String,
}

impl CollectorConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("serial_port", "/dev/ttyUSB0")?
            .set_default("baud_rate", 38400)?
            .set_default("read_timeout_ms", 1000)?
            .set_default("pre_read_delay_ms", 100)?
            .set_default("vehicle", "unknown")?
            .set_default("window_size", 50)?
            .set_default("mqtt.host", "localhost")?
            .set_default("mqtt.port", 1883)?
            .set_default("mqtt.key", "")?
            .add_source(config::Environment::with_prefix("OBD").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn pre_read_delay(&self) -> Duration {
        Duration::from_millis(self.pre_read_delay_ms)
    }
}

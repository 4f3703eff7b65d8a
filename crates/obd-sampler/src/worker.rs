//! Per-Parameter Polling Workers
//!
//! One worker task per registered parameter, all started after the
//! capability scan. A worker polls its parameter through the shared
//! transport until the process shuts down; the only early exits are an
//! unsupported parameter id and loss of the adapter link.

use std::sync::Arc;
use std::time::Duration;

use obd_link::command::{self, service};
use obd_link::{extract_data_octets, Parameter, SupportedPids, Transport};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::window::SampleWindow;

/// Aggregated value ready for publication
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Registry name of the parameter
    pub parameter: &'static str,
    /// Mean over one full sample window
    pub value: f64,
}

/// Tunables shared by every parameter worker
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Samples averaged into one published reading
    pub window_size: usize,
    /// Settle time between writing a query and reading its reply
    pub pre_read_delay: Duration,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            window_size: 50,
            pre_read_delay: Duration::from_millis(100),
        }
    }
}

/// What one polling cycle produced.
///
/// Failures carry no sample; the next iteration of the worker loop is
/// the only retry mechanism.
enum CycleOutcome {
    Sample(f64),
    NoSample,
    LinkDown,
}

/// Poll one parameter forever, pushing window means into `readings`.
///
/// Checks the discovered capability set exactly once: an unsupported
/// parameter id stops the worker before any query reaches the wire, so
/// the shared channel is never wasted on queries the vehicle would
/// reject.
pub async fn run_parameter_worker<L>(
    transport: Arc<Transport<L>>,
    parameter: &'static Parameter,
    supported: Arc<SupportedPids>,
    config: SamplerConfig,
    readings: mpsc::Sender<Reading>,
) where
    L: AsyncRead + AsyncWrite + Unpin,
{
    if !supported.contains(parameter.pid) {
        warn!(
            "PID 0x{:02X} ({}) is not supported by this vehicle",
            parameter.pid, parameter.name
        );
        return;
    }

    let query = command::read_current_data(parameter.pid);
    let mut window = SampleWindow::new(config.window_size);

    loop {
        match poll_once(&transport, parameter, &query, config.pre_read_delay).await {
            CycleOutcome::Sample(value) => {
                if let Some(mean) = window.push(value) {
                    info!("{} = {:.2}", parameter.name, mean);
                    let reading = Reading {
                        parameter: parameter.name,
                        value: mean,
                    };
                    if readings.send(reading).await.is_err() {
                        debug!("Reading channel closed, stopping {} worker", parameter.name);
                        return;
                    }
                }
            }
            CycleOutcome::NoSample => {
                // Attempt discarded; retry on the next cycle.
            }
            CycleOutcome::LinkDown => {
                warn!("Adapter link lost, stopping {} worker", parameter.name);
                return;
            }
        }
    }
}

async fn poll_once<L>(
    transport: &Transport<L>,
    parameter: &Parameter,
    query: &[u8],
    pre_read_delay: Duration,
) -> CycleOutcome
where
    L: AsyncRead + AsyncWrite + Unpin,
{
    let reply = match transport.submit(query, pre_read_delay).await {
        Ok(reply) => reply,
        Err(e) if e.is_fatal() => return CycleOutcome::LinkDown,
        Err(e) => {
            debug!("Polling 0x{:02X} failed: {}", parameter.pid, e);
            return CycleOutcome::NoSample;
        }
    };

    let octets = extract_data_octets(&reply, service::CURRENT_DATA, parameter.pid);
    match (parameter.decode)(&octets) {
        Some(value) => CycleOutcome::Sample(value),
        None => CycleOutcome::NoSample,
    }
}

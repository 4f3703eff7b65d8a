//! Polling and Aggregation Engine
//!
//! Turns the adapter protocol layer into a stream of aggregated
//! readings: one worker task per registered parameter, each repeatedly
//! querying through the shared transport, accumulating a fixed-size
//! sample window, and handing the window mean to a single publishing
//! consumer over a channel.

mod window;
mod worker;

pub use window::SampleWindow;
pub use worker::{run_parameter_worker, Reading, SamplerConfig};

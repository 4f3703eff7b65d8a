//! ELM327 Adapter Protocol Layer
//!
//! This crate covers everything between an already-open serial byte
//! channel and decoded sensor octets: a mutex-serialized command/response
//! transport, the adapter's ASCII response grammar, the supported-PID
//! discovery walk, and the static parameter registry.

pub mod command;
mod error;
mod parse;
mod pid;
mod scan;
mod transport;

pub use error::TransportError;
pub use parse::extract_data_octets;
pub use pid::{registry, Parameter};
pub use scan::{discover_supported_pids, SupportedPids};
pub use transport::{Transport, MAX_REPLY_BYTES};

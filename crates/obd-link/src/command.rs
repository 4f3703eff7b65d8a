//! ELM327 Command Encoding
//!
//! All commands are ASCII, terminated by a carriage return. The byte
//! sequences here are fixed by the adapter's documented protocol.

/// Reset the adapter to power-on defaults
pub const RESET: &[u8] = b"ATZ\r";

/// Let the adapter search for the vehicle's transport protocol
pub const SET_PROTOCOL_AUTO: &[u8] = b"ATSP0\r";

/// OBD-II service codes
pub mod service {
    /// Show current data
    pub const CURRENT_DATA: u8 = 0x01;

    /// Positive replies echo the request service plus this offset
    pub const REPLY_OFFSET: u8 = 0x40;
}

/// Query one current-data parameter, asking for a single response line.
pub fn read_current_data(pid: u8) -> Vec<u8> {
    format!("01{pid:02X}1\r").into_bytes()
}

/// Query the supported-PID bitmask for the block starting at `block`.
///
/// Block ids are 0x00, 0x20, 0x40, ...; for block 0 this encodes the
/// standard `0100` probe.
pub fn supported_pids_query(block: u8) -> Vec<u8> {
    format!("01{block:02X}\r").into_bytes()
}

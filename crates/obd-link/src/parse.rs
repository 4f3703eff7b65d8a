//! ELM327 Response Grammar
//!
//! Adapter replies are ASCII octet pairs separated by spaces, usually
//! wrapped in protocol noise: a leading prompt, an echo of the command,
//! status lines such as `SEARCHING...`, stray carriage returns, and the
//! prompt for the next command. This module digs the data octets for one
//! service/parameter out of that.

use tracing::{debug, warn};

use crate::command::service::REPLY_OFFSET;

/// Extract the data octets of the reply to `service`/`pid` from a raw
/// adapter buffer.
///
/// Returns an empty vector when the buffer carries no matching data.
/// Malformed or partial replies are an expected condition on a noisy
/// serial link, so anomalies are logged rather than raised.
pub fn extract_data_octets(raw: &[u8], service: u8, pid: u8) -> Vec<u8> {
    let text = String::from_utf8_lossy(raw);
    let service_token = format!("{:02X}", service.wrapping_add(REPLY_OFFSET));
    let pid_token = format!("{pid:02X}");

    // The reply line may be echoed more than once in one buffer; scan
    // lines from the end and inside each line take the last echo that
    // actually carries data.
    for line in text.split('\r').rev() {
        let tokens: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == '>')
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.len() < 3 {
            continue;
        }

        for at in (0..tokens.len() - 2).rev() {
            if tokens[at] == service_token && tokens[at + 1] == pid_token {
                let joined: String = tokens[at + 2..].concat();
                return match hex::decode(&joined) {
                    Ok(octets) => octets,
                    Err(e) => {
                        warn!("Undecodable data octets in {:?}: {}", line.trim(), e);
                        Vec::new()
                    }
                };
            }
        }
    }

    debug!(
        "Reply carries no data for service {} pid {}",
        service_token, pid_token
    );
    Vec::new()
}

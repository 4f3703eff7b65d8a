//! Supported-Parameter Discovery
//!
//! Before polling begins, the adapter is reset and asked which parameter
//! ids the vehicle implements. The answer arrives as 32-bit bitmasks in
//! blocks of 0x20 ids; a block's reply also flags whether the next block
//! is worth querying (the id equal to the next block's own start doubles
//! as the continuation bit).

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use crate::command::{self, service};
use crate::parse::extract_data_octets;
use crate::transport::Transport;

const RESET_DELAY: Duration = Duration::from_millis(1000);
const PROTOCOL_DELAY: Duration = Duration::from_millis(100);
/// The first block query triggers the adapter's protocol search, which
/// can take several seconds on a cold bus.
const FIRST_BLOCK_DELAY: Duration = Duration::from_millis(7000);
const BLOCK_DELAY: Duration = Duration::from_millis(200);

const BLOCK_SPAN: u16 = 0x20;

/// The parameter ids a vehicle implements, discovered once per process
/// lifetime and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SupportedPids(BTreeSet<u8>);

impl SupportedPids {
    pub fn contains(&self, pid: u8) -> bool {
        self.0.contains(&pid)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<u8> for SupportedPids {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Reset the adapter and walk the supported-PID blocks.
///
/// Transport failures are tolerated: the scan returns whatever ids were
/// accumulated before the failure, and the affected workers terminate as
/// unsupported instead of aborting startup.
pub async fn discover_supported_pids<L>(transport: &Transport<L>) -> SupportedPids
where
    L: AsyncRead + AsyncWrite + Unpin,
{
    info!("Resetting adapter...");
    if let Err(e) = transport.submit(command::RESET, RESET_DELAY).await {
        warn!("Adapter reset failed: {}", e);
    }

    info!("Selecting transport protocol automatically...");
    if let Err(e) = transport
        .submit(command::SET_PROTOCOL_AUTO, PROTOCOL_DELAY)
        .await
    {
        warn!("Protocol selection failed: {}", e);
    }

    let mut pids: BTreeSet<u8> = BTreeSet::new();
    let mut block: u16 = 0x00;
    let mut delay = FIRST_BLOCK_DELAY;

    loop {
        info!(
            "Querying supported parameter ids (0x{:02X}-0x{:02X})...",
            block + 1,
            block + BLOCK_SPAN
        );

        match transport
            .submit(&command::supported_pids_query(block as u8), delay)
            .await
        {
            Ok(reply) => {
                let mask = extract_data_octets(&reply, service::CURRENT_DATA, block as u8);
                pids.extend(decode_mask(&mask, block));
            }
            Err(e) => {
                warn!("Capability query for block 0x{:02X} failed: {}", block, e);
            }
        }

        let next = block + BLOCK_SPAN;
        if next > 0xFF || !pids.contains(&(next as u8)) {
            break;
        }
        block = next;
        delay = BLOCK_DELAY;
    }

    let listing: Vec<String> = pids.iter().map(|p| format!("0x{p:02X}")).collect();
    info!(
        "Vehicle supports {} parameter ids: {}",
        pids.len(),
        listing.join(", ")
    );

    SupportedPids(pids)
}

/// Decode one supported-PID bitmask.
///
/// Bit 7 of byte 0 flags `block + 1`, bit 6 flags `block + 2`, and so on
/// through all four bytes.
fn decode_mask(mask: &[u8], block: u16) -> Vec<u8> {
    let offset = block + 1;
    let mut ids = Vec::new();
    for (i, byte) in mask.iter().enumerate() {
        for bit in (0..8u16).rev() {
            if byte & (1 << bit) != 0 {
                let id = offset + (i as u16) * 8 + (7 - bit);
                if id <= 0xFF {
                    ids.push(id as u8);
                }
            }
        }
    }
    ids
}

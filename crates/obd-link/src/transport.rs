//! Serialized Command/Response Transport
//!
//! Many workers share one physical channel to the adapter. Each logical
//! command is one exclusive write-then-read transaction; the lock is held
//! across the optional pre-read delay and the read, never across parsing
//! or publishing.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::error::TransportError;

/// Largest reply the adapter produces for a single-line query
pub const MAX_REPLY_BYTES: usize = 50;

/// Per-read bound while emptying stale buffered input before a write
const DRAIN_READ_TIMEOUT: Duration = Duration::from_millis(2);

/// Exclusive-access wrapper around the adapter byte channel.
///
/// Generic over the channel so tests can substitute an in-memory pipe for
/// the serial port.
pub struct Transport<L> {
    link: Mutex<L>,
    read_timeout: Duration,
}

impl<L> Transport<L>
where
    L: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already-open byte channel.
    pub fn new(link: L, read_timeout: Duration) -> Self {
        Self {
            link: Mutex::new(link),
            read_timeout,
        }
    }

    /// Run one command/response transaction.
    ///
    /// `pre_read_delay` gives adapter firmware time to assemble the reply
    /// before the read is issued; some dongles need this rather than the
    /// read timeout alone.
    pub async fn submit(
        &self,
        command: &[u8],
        pre_read_delay: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let mut link = self.link.lock().await;

        Self::drain_stale(&mut link).await;

        let written = link
            .write(command)
            .await
            .map_err(TransportError::WriteFailed)?;
        if written == 0 {
            return Err(TransportError::NoDataWritten);
        }
        link.flush().await.map_err(TransportError::WriteFailed)?;

        sleep(pre_read_delay).await;

        let mut buf = vec![0u8; MAX_REPLY_BYTES];
        match timeout(self.read_timeout, link.read(&mut buf)).await {
            Err(_) => Err(TransportError::NoDataReceived),
            Ok(Err(e)) => Err(TransportError::ReadFailed(e)),
            Ok(Ok(0)) => Err(TransportError::NoDataReceived),
            Ok(Ok(n)) => {
                buf.truncate(n);
                debug!("Received {} reply bytes", n);
                Ok(buf)
            }
        }
    }

    /// Discard input left over from an earlier, possibly timed-out,
    /// transaction so it cannot be mistaken for the next reply.
    async fn drain_stale(link: &mut L) {
        let mut scratch = [0u8; MAX_REPLY_BYTES];
        loop {
            match timeout(DRAIN_READ_TIMEOUT, link.read(&mut scratch)).await {
                Ok(Ok(n)) if n > 0 => {
                    warn!("Discarded {} bytes of stale adapter input", n);
                }
                _ => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::DuplexStream;

    const NO_DELAY: Duration = Duration::from_millis(0);

    fn transport(read_timeout: Duration) -> (Transport<DuplexStream>, DuplexStream) {
        let (near, far) = tokio::io::duplex(256);
        (Transport::new(near, read_timeout), far)
    }

    /// Reads one CR-terminated command from the far end, then sends the
    /// canned reply.
    async fn reply_once(far: &mut DuplexStream, reply: &[u8]) -> Vec<u8> {
        let mut command = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            far.read_exact(&mut byte).await.expect("command byte");
            command.push(byte[0]);
            if byte[0] == b'\r' {
                break;
            }
        }
        far.write_all(reply).await.expect("reply write");
        command
    }

    #[tokio::test(start_paused = true)]
    async fn submit_returns_exact_reply_bytes() {
        let (transport, mut far) = transport(Duration::from_secs(1));

        let responder = tokio::spawn(async move {
            reply_once(&mut far, b"41 0C 1A F8 \r\r>").await
        });

        let reply = transport.submit(b"010C1\r", NO_DELAY).await.unwrap();
        assert_eq!(reply, b"41 0C 1A F8 \r\r>");
        assert_eq!(responder.await.unwrap(), b"010C1\r");
    }

    #[tokio::test(start_paused = true)]
    async fn silent_adapter_is_no_data_received() {
        let (transport, _far) = transport(Duration::from_millis(200));

        let err = transport.submit(b"010C1\r", NO_DELAY).await.unwrap_err();
        assert!(matches!(err, TransportError::NoDataReceived));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_input_is_drained_before_the_write() {
        let (transport, mut far) = transport(Duration::from_secs(1));

        // Leftovers from a previous, timed-out transaction.
        far.write_all(b"41 0D 22 \r\r>").await.unwrap();

        let responder = tokio::spawn(async move {
            reply_once(&mut far, b"41 0C 1A F8 \r\r>").await;
        });

        let reply = transport.submit(b"010C1\r", NO_DELAY).await.unwrap();
        assert_eq!(reply, b"41 0C 1A F8 \r\r>");
        responder.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_submits_never_interleave_on_the_wire() {
        let (transport, mut far) = transport(Duration::from_secs(1));
        let transport = std::sync::Arc::new(transport);

        // Echo each complete command back as the reply: an interleaved
        // write would corrupt the echo a submitter receives.
        let responder = tokio::spawn(async move {
            for _ in 0..8 {
                let command = reply_once(&mut far, b"").await;
                far.write_all(&command).await.unwrap();
            }
        });

        let mut tasks = Vec::new();
        for pid in [0x04u8, 0x05, 0x0C, 0x0D, 0x11, 0x1F, 0x21, 0x46] {
            let transport = transport.clone();
            tasks.push(tokio::spawn(async move {
                let command = crate::command::read_current_data(pid);
                let reply = transport.submit(&command, NO_DELAY).await.unwrap();
                assert_eq!(reply, command);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }
        responder.await.unwrap();
    }
}

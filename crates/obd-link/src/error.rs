//! Adapter Link Error Types

use thiserror::Error;

/// Errors from a single command/response transaction on the adapter link
#[derive(Debug, Error)]
pub enum TransportError {
    /// The write call succeeded but transferred zero bytes
    #[error("no data written to adapter")]
    NoDataWritten,

    /// The read returned nothing within the timeout
    #[error("no data received from adapter")]
    NoDataReceived,

    /// The underlying channel rejected the write
    #[error("write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// The underlying channel failed mid-read
    #[error("read failed: {0}")]
    ReadFailed(#[source] std::io::Error),
}

impl TransportError {
    /// Whether this error indicates total loss of the physical channel.
    ///
    /// Anything transient (timeouts, empty replies, adapter garbage) is
    /// absorbed by the caller's next polling cycle; only a dead channel
    /// should stop the workers.
    pub fn is_fatal(&self) -> bool {
        use std::io::ErrorKind;

        match self {
            Self::WriteFailed(e) | Self::ReadFailed(e) => matches!(
                e.kind(),
                ErrorKind::BrokenPipe
                    | ErrorKind::NotConnected
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::ConnectionReset
                    | ErrorKind::UnexpectedEof
            ),
            Self::NoDataWritten | Self::NoDataReceived => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_not_fatal() {
        assert!(!TransportError::NoDataReceived.is_fatal());
        assert!(!TransportError::NoDataWritten.is_fatal());
    }

    #[test]
    fn broken_pipe_is_fatal() {
        let err = TransportError::WriteFailed(std::io::Error::from(
            std::io::ErrorKind::BrokenPipe,
        ));
        assert!(err.is_fatal());

        let err = TransportError::ReadFailed(std::io::Error::from(
            std::io::ErrorKind::TimedOut,
        ));
        assert!(!err.is_fatal());
    }
}

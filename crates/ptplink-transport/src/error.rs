use std::io;

use ptplink_frame::FrameError;

/// Errors that can occur in PTP transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to connect to the device.
    #[error("failed to connect to {addr}: {source}")]
    Connect { addr: String, source: io::Error },

    /// An I/O error occurred on the transport.
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),

    /// A frame could not be encoded, decoded, read or written.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Nothing arrived within the readiness timeout.
    #[error("timed out waiting for the device")]
    Timeout,

    /// The device answered the init handshake with a failure frame.
    #[error("device refused the connection")]
    PermissionDenied,

    /// The exchange did not follow the protocol.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The device address could not be parsed.
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// A GUID string could not be parsed.
    #[error("invalid GUID {0:?}")]
    InvalidGuid(String),

    /// The transport does not implement this operation.
    #[error("{0} is not supported by this transport")]
    Unsupported(&'static str),

    /// The transport has been closed.
    #[error("transport shut down")]
    Shutdown,
}

impl TransportError {
    /// Whether this error means "nothing arrived in time" rather than a failure.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Io(err) | Self::Frame(FrameError::Io(err)) => is_timeout_kind(err.kind()),
            _ => false,
        }
    }

    /// Whether the device refused the connection.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied)
    }
}

fn is_timeout_kind(kind: io::ErrorKind) -> bool {
    matches!(kind, io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

pub type Result<T> = std::result::Result<T, TransportError>;

use std::time::Duration;

use ptplink_frame::FrameError;
use ptplink_transport::TransportError;

/// Errors that can occur while driving transactions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error. Aborts the transaction in progress.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response belongs to a different transaction than the request.
    #[error("response transaction id {actual} does not match request {expected}")]
    TransactionMismatch { expected: u32, actual: u32 },

    /// The device answered a convenience operation with a non-OK code.
    #[error("device answered {code:#06x}")]
    Response { code: u16 },

    /// The device descriptor could not be decoded.
    #[error("malformed device info: {0}")]
    DeviceInfo(FrameError),

    /// No event arrived before the deadline.
    #[error("no event within {0:?}")]
    Timeout(Duration),
}

impl SessionError {
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Transport(err) => err.is_timeout(),
            _ => false,
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Transport(err) if err.is_permission_denied())
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that can occur while encoding, decoding, reading or writing frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Fewer bytes are available than a field or declared length requires.
    #[error("truncated frame ({needed} bytes needed, {available} available)")]
    Truncated { needed: usize, available: usize },

    /// The declared length is smaller than the header that carries it.
    #[error("declared length {declared} is shorter than the {header}-byte header")]
    LengthUnderflow { declared: u32, header: usize },

    /// A frame or container type tag did not match what the exchange requires.
    #[error("unexpected frame type {got:#x} (expected {expected:#x})")]
    UnexpectedType { expected: u32, got: u32 },

    /// More parameters than the record can carry.
    #[error("too many parameters ({count}, max {max})")]
    TooManyParams { count: usize, max: usize },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: u64, max: u64 },

    /// A data phase carried a different byte count than it announced.
    #[error("data phase announced {expected} bytes but carried {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection before a new frame started.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;

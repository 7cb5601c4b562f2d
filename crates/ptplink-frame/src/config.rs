/// Default maximum size of a frame body read into memory: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Default block size used when streaming a frame body to a consumer.
pub const DEFAULT_STREAM_CHUNK: usize = 64 * 1024;

/// Configuration for frame readers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum body size read into a single buffer. Default: 16 MiB.
    ///
    /// Streamed bodies (data phases) are not bounded by this value.
    pub max_payload_size: usize,
    /// Block size for streamed bodies. Default: 64 KiB.
    pub stream_chunk_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            stream_chunk_size: DEFAULT_STREAM_CHUNK,
        }
    }
}

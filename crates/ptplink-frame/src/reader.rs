use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::config::FrameConfig;
use crate::error::{FrameError, Result};

/// Which prefix a frame starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderLayout {
    /// Length only (4 bytes). Fuji command and event sockets.
    LengthOnly,
    /// Length and frame type (8 bytes). Standard PTP/IP and the Fuji init ack.
    LengthAndType,
}

impl HeaderLayout {
    pub const fn size(self) -> usize {
        match self {
            Self::LengthOnly => 4,
            Self::LengthAndType => 8,
        }
    }
}

/// The fixed prefix of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Declared total length, header included.
    pub length: u32,
    /// Frame type, when the layout carries one.
    pub kind: Option<u32>,
    pub layout: HeaderLayout,
}

impl FrameHeader {
    /// Body length implied by the declared length.
    pub fn body_len(&self) -> Result<usize> {
        (self.length as usize)
            .checked_sub(self.layout.size())
            .ok_or(FrameError::LengthUnderflow {
                declared: self.length,
                header: self.layout.size(),
            })
    }

    /// Frame type, or 0 for layouts without one.
    pub fn kind(&self) -> u32 {
        self.kind.unwrap_or(0)
    }
}

/// A complete frame read into memory.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub header: FrameHeader,
    pub body: Bytes,
}

/// Reads length-prefixed frames from any `Read` stream.
///
/// Reads happen in two stages: exactly the header, then exactly the body the
/// header declares. Short reads are retried until satisfied. A zero-byte
/// read before the first header byte is [`FrameError::ConnectionClosed`];
/// anywhere later it is [`FrameError::Truncated`].
///
/// A read timeout (`WouldBlock` or `TimedOut`) before the first header byte
/// is returned as [`FrameError::Io`] and nothing is consumed. Once part of a
/// frame has been read, a timeout is [`FrameError::Truncated`]: the stream
/// position is no longer at a frame boundary.
pub struct FrameReader<T> {
    inner: T,
    config: FrameConfig,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self { inner, config }
    }

    /// Read the next frame header.
    pub fn read_header(&mut self, layout: HeaderLayout) -> Result<FrameHeader> {
        let mut raw = [0u8; 8];
        let raw = &mut raw[..layout.size()];
        let filled = self.fill(raw, false)?;
        if filled == 0 {
            return Err(FrameError::ConnectionClosed);
        }
        if filled < raw.len() {
            return Err(FrameError::Truncated {
                needed: raw.len(),
                available: filled,
            });
        }

        let length = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let kind = match layout {
            HeaderLayout::LengthOnly => None,
            HeaderLayout::LengthAndType => Some(u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]])),
        };
        trace!(length, kind, bytes = ?raw, "frame header");
        Ok(FrameHeader {
            length,
            kind,
            layout,
        })
    }

    /// Read exactly `len` body bytes into memory.
    pub fn read_body(&mut self, len: usize) -> Result<Bytes> {
        if len > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: len as u64,
                max: self.config.max_payload_size as u64,
            });
        }
        let mut body = BytesMut::zeroed(len);
        let filled = self.fill(&mut body, true)?;
        if filled < len {
            return Err(FrameError::Truncated {
                needed: len,
                available: filled,
            });
        }
        trace!(len, bytes = ?&body[..], "frame body");
        Ok(body.freeze())
    }

    /// Read a whole frame: header, then the body it declares.
    pub fn read_frame(&mut self, layout: HeaderLayout) -> Result<RawFrame> {
        let header = self.read_header(layout)?;
        let body = self.read_body(header.body_len()?)?;
        Ok(RawFrame { header, body })
    }

    /// Stream exactly `len` body bytes to `consume` in blocks.
    ///
    /// Nothing beyond one block is buffered, so `len` is not bounded by
    /// `max_payload_size`.
    pub fn stream_body<F>(&mut self, len: u64, mut consume: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<()>,
    {
        let chunk = self.config.stream_chunk_size.max(1);
        let mut block = vec![0u8; (len.min(chunk as u64)) as usize];
        let mut left = len;
        while left > 0 {
            let want = left.min(block.len() as u64) as usize;
            let filled = self.fill(&mut block[..want], true)?;
            if filled < want {
                return Err(FrameError::Truncated {
                    needed: (len - left) as usize + want,
                    available: (len - left) as usize + filled,
                });
            }
            consume(&block[..want])?;
            left -= want as u64;
        }
        Ok(())
    }

    /// Read until `buf` is full or the stream ends. Returns bytes read.
    ///
    /// `in_frame` says earlier bytes of the same frame were already taken.
    fn fill(&mut self, buf: &mut [u8], in_frame: bool) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if (in_frame || filled > 0) && is_timeout(&err) => {
                    return Err(FrameError::Truncated {
                        needed: buf.len(),
                        available: filled,
                    });
                }
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(filled)
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update the maximum in-memory body size.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

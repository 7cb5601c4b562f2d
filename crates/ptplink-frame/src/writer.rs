use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::trace;

use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes complete frames to any `Write` stream.
///
/// Every write loops until the whole buffer is accepted, so a partial write
/// from the stream never leaves half a frame on the wire. An expired write
/// timeout (`WouldBlock` or `TimedOut`) is returned as [`FrameError::Io`].
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Encode a frame into the scratch buffer with `encode`, then write and flush it.
    pub fn send_with<F>(&mut self, encode: F) -> Result<()>
    where
        F: FnOnce(&mut BytesMut) -> Result<()>,
    {
        self.buf.clear();
        encode(&mut self.buf)?;
        trace!(len = self.buf.len(), bytes = ?&self.buf[..], "writing frame");
        let frame = std::mem::take(&mut self.buf);
        let result = self.write_all(&frame);
        self.buf = frame;
        result?;
        self.flush()
    }

    /// Write every byte of `data`, looping on partial writes.
    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < data.len() {
            match self.inner.write(&data[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

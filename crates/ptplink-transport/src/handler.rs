//! Streaming sources and sinks for data phases.
//!
//! A transport never sees the whole payload at once: it pulls blocks from a
//! [`DataSource`] when sending and pushes blocks into a [`DataSink`] when
//! receiving. Which backing store sits behind them is the caller's choice.

use std::io::{self, ErrorKind, Read, Write};

use bytes::{Bytes, BytesMut};

use crate::error::{Result, TransportError};

/// Supplies outgoing data-phase bytes.
pub trait DataSource {
    /// Fill up to `buf.len()` bytes and return how many were written.
    ///
    /// Returning 0 means the source is exhausted.
    fn supply(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Accepts incoming data-phase bytes.
pub trait DataSink {
    fn accept(&mut self, data: &[u8]) -> io::Result<()>;
}

impl<S: DataSource + ?Sized> DataSource for &mut S {
    fn supply(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).supply(buf)
    }
}

impl<S: DataSink + ?Sized> DataSink for &mut S {
    fn accept(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).accept(data)
    }
}

/// Source over a borrowed byte slice.
#[derive(Debug)]
pub struct MemorySource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> MemorySource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet supplied.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

impl DataSource for MemorySource<'_> {
    fn supply(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Sink into a fixed, caller-provided buffer.
#[derive(Debug)]
pub struct MemorySink<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl<'a> MemorySink<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    /// Bytes accepted so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl DataSink for MemorySink<'_> {
    fn accept(&mut self, data: &[u8]) -> io::Result<()> {
        let end = self.len + data.len();
        if end > self.buf.len() {
            return Err(io::Error::new(
                ErrorKind::WriteZero,
                format!(
                    "sink buffer full ({} of {} bytes used, {} more offered)",
                    self.len,
                    self.buf.len(),
                    data.len()
                ),
            ));
        }
        self.buf[self.len..end].copy_from_slice(data);
        self.len = end;
        Ok(())
    }
}

/// Growable in-memory accumulator.
#[derive(Debug, Default)]
pub struct BufferSink {
    buf: BytesMut,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

impl DataSink for BufferSink {
    fn accept(&mut self, data: &[u8]) -> io::Result<()> {
        self.buf.extend_from_slice(data);
        Ok(())
    }
}

/// Source over any reader, typically an open [`std::fs::File`].
#[derive(Debug)]
pub struct ReadSource<R> {
    inner: R,
}

impl<R: Read> ReadSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> DataSource for ReadSource<R> {
    fn supply(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.inner.read(buf) {
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }
}

/// Sink into any writer, typically an open [`std::fs::File`].
#[derive(Debug)]
pub struct WriteSink<W> {
    inner: W,
}

impl<W: Write> WriteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> DataSink for WriteSink<W> {
    fn accept(&mut self, data: &[u8]) -> io::Result<()> {
        self.inner.write_all(data)
    }
}

/// Fill `buf` completely from `source`.
///
/// A source that runs dry first is an `UnexpectedEof` I/O error.
pub fn fill_from(source: &mut dyn DataSource, buf: &mut [u8]) -> Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.supply(&mut buf[filled..])? {
            0 => {
                return Err(TransportError::Io(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!(
                        "data source exhausted after {filled} of {} bytes",
                        buf.len()
                    ),
                )))
            }
            n => filled += n,
        }
    }
    Ok(())
}

/// Pull exactly `size` bytes from `source` in blocks of `block_size`.
///
/// Every block except possibly the last is full. `write` receives each block
/// and whether it is the last one. Nothing is called when `size` is 0.
pub fn pull_blocks<F>(
    source: &mut dyn DataSource,
    size: u64,
    block_size: usize,
    mut write: F,
) -> Result<()>
where
    F: FnMut(&[u8], bool) -> Result<()>,
{
    let block_size = block_size.max(1);
    let mut block = vec![0u8; size.min(block_size as u64) as usize];
    let mut left = size;
    while left > 0 {
        let want = left.min(block_size as u64) as usize;
        fill_from(source, &mut block[..want])?;
        left -= want as u64;
        write(&block[..want], left == 0)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn memory_source_supplies_in_order() {
        let data: Vec<u8> = (0..10).collect();
        let mut source = MemorySource::new(&data);
        let mut buf = [0u8; 4];
        assert_eq!(source.supply(&mut buf).unwrap(), 4);
        assert_eq!(buf, [0, 1, 2, 3]);
        assert_eq!(source.remaining(), 6);
        let mut rest = [0u8; 16];
        assert_eq!(source.supply(&mut rest).unwrap(), 6);
        assert_eq!(source.supply(&mut rest).unwrap(), 0);
    }

    #[test]
    fn memory_sink_rejects_overflow() {
        let mut storage = [0u8; 4];
        let mut sink = MemorySink::new(&mut storage);
        sink.accept(b"ab").unwrap();
        sink.accept(b"cd").unwrap();
        let err = sink.accept(b"e").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WriteZero);
        assert_eq!(sink.filled(), b"abcd");
        assert_eq!(sink.len(), 4);
    }

    #[test]
    fn buffer_sink_grows() {
        let mut sink = BufferSink::with_capacity(2);
        sink.accept(b"hello ").unwrap();
        sink.accept(b"camera").unwrap();
        assert_eq!(sink.len(), 12);
        assert_eq!(sink.into_bytes().as_ref(), b"hello camera");
    }

    #[test]
    fn file_backed_source_and_sink() {
        let path = std::env::temp_dir().join(format!(
            "ptplink-handler-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ));
        let payload: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();

        {
            let file = std::fs::File::create(&path).expect("temp file should be creatable");
            let mut sink = WriteSink::new(file);
            for chunk in payload.chunks(777) {
                sink.accept(chunk).unwrap();
            }
        }

        let file = std::fs::File::open(&path).expect("temp file should open");
        let mut source = ReadSource::new(file);
        let mut collected = Vec::new();
        pull_blocks(&mut source, payload.len() as u64, 1024, |block, _| {
            collected.extend_from_slice(block);
            Ok(())
        })
        .unwrap();
        assert_eq!(collected, payload);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn pull_blocks_sizes_and_last_flag() {
        let data = vec![7u8; 200_000];
        let mut source = MemorySource::new(&data);
        let mut blocks = Vec::new();
        pull_blocks(&mut source, 200_000, 65_536, |block, last| {
            blocks.push((block.len(), last));
            Ok(())
        })
        .unwrap();
        assert_eq!(
            blocks,
            vec![
                (65_536, false),
                (65_536, false),
                (65_536, false),
                (3_392, true)
            ]
        );
    }

    #[test]
    fn pull_blocks_fills_from_trickling_source() {
        let data: Vec<u8> = (0..=255).collect();
        let mut source = Trickle {
            inner: Cursor::new(data.clone()),
        };
        let mut blocks = Vec::new();
        pull_blocks(&mut source, 256, 100, |block, _| {
            blocks.push(block.to_vec());
            Ok(())
        })
        .unwrap();
        assert_eq!(blocks.iter().map(Vec::len).collect::<Vec<_>>(), vec![100, 100, 56]);
        assert_eq!(blocks.concat(), data);
    }

    #[test]
    fn pull_blocks_short_source_is_eof() {
        let data = [0u8; 10];
        let mut source = MemorySource::new(&data);
        let err = pull_blocks(&mut source, 20, 8, |_, _| Ok(())).unwrap_err();
        assert!(matches!(err, TransportError::Io(e) if e.kind() == ErrorKind::UnexpectedEof));
    }

    #[test]
    fn pull_blocks_zero_size_calls_nothing() {
        let mut source = MemorySource::new(&[]);
        let mut calls = 0;
        pull_blocks(&mut source, 0, 64, |_, _| {
            calls += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(calls, 0);
    }

    struct Trickle {
        inner: Cursor<Vec<u8>>,
    }

    impl DataSource for Trickle {
        fn supply(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(7);
            self.inner.read(&mut buf[..n])
        }
    }
}

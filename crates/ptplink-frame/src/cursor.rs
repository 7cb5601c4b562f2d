use bytes::BufMut;

use crate::error::{FrameError, Result};

/// Bounds-checked little-endian reader over a byte slice.
///
/// Every accessor fails with [`FrameError::Truncated`] instead of indexing
/// past the end of the slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// The unconsumed tail, without advancing.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(FrameError::Truncated {
                needed: len,
                available: self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// Read as many `u32` values as the remaining bytes hold, up to `max`.
    ///
    /// A trailing remainder shorter than four bytes is left unconsumed.
    pub fn read_u32_tail(&mut self, max: usize) -> Result<Vec<u32>> {
        let count = self.remaining() / 4;
        if count > max {
            return Err(FrameError::TooManyParams { count, max });
        }
        (0..count).map(|_| self.read_u32()).collect()
    }

    /// PTP array: `u32` element count followed by `u16` elements.
    pub fn read_u16_array(&mut self) -> Result<Vec<u16>> {
        let count = self.read_u32()? as usize;
        let needed = count.saturating_mul(2);
        if needed > self.remaining() {
            return Err(FrameError::Truncated {
                needed,
                available: self.remaining(),
            });
        }
        (0..count).map(|_| self.read_u16()).collect()
    }

    /// PTP string: `u8` count of UTF-16LE units (terminator included), then the units.
    pub fn read_ptp_string(&mut self) -> Result<String> {
        let count = self.read_u8()? as usize;
        let raw = self.read_bytes(count * 2)?;
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .take_while(|&unit| unit != 0)
            .collect();
        Ok(String::from_utf16_lossy(&units))
    }

    /// Null-terminated UTF-16LE string running to the terminator or to the end.
    pub fn read_utf16z(&mut self) -> String {
        let mut units = Vec::new();
        while self.remaining() >= 2 {
            let unit = u16::from_le_bytes([self.buf[self.pos], self.buf[self.pos + 1]]);
            self.pos += 2;
            if unit == 0 {
                break;
            }
            units.push(unit);
        }
        String::from_utf16_lossy(&units)
    }
}

/// Append `text` as UTF-16LE followed by a null unit.
pub fn put_utf16z(dst: &mut impl BufMut, text: &str) {
    for unit in text.encode_utf16() {
        dst.put_u16_le(unit);
    }
    dst.put_u16_le(0);
}

/// Encoded size of [`put_utf16z`] output.
pub fn utf16z_len(text: &str) -> usize {
    (text.encode_utf16().count() + 1) * 2
}

/// Append `text` as a PTP string. The empty string encodes as a zero count.
///
/// Strings longer than 254 UTF-16 units are cut to fit the `u8` count.
pub fn put_ptp_string(dst: &mut impl BufMut, text: &str) {
    let units: Vec<u16> = text.encode_utf16().take(254).collect();
    if units.is_empty() {
        dst.put_u8(0);
        return;
    }
    dst.put_u8(units.len() as u8 + 1);
    for unit in units {
        dst.put_u16_le(unit);
    }
    dst.put_u16_le(0);
}

/// Append a PTP `u16` array with its `u32` count prefix.
pub fn put_u16_array(dst: &mut impl BufMut, values: &[u16]) {
    dst.put_u32_le(values.len() as u32);
    for &value in values {
        dst.put_u16_le(value);
    }
}

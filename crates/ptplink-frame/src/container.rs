use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use crate::codes::rc;
use crate::cursor::ByteReader;
use crate::error::{FrameError, Result};

/// Generic container header: length (4) + type (2) + code (2) + transaction id (4).
pub const CONTAINER_HEADER_SIZE: usize = 12;

/// Maximum number of parameters a command or response carries.
pub const MAX_PARAMS: usize = 5;

/// Length value announcing a data phase too large for a `u32`.
pub const UNKNOWN_LENGTH: u32 = u32::MAX;

/// The container type tag of the generic layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum ContainerType {
    Command = 1,
    Data = 2,
    Response = 3,
    Event = 4,
}

impl ContainerType {
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Self::Command),
            2 => Some(Self::Data),
            3 => Some(Self::Response),
            4 => Some(Self::Event),
            _ => None,
        }
    }
}

/// A command or response: code, session, transaction id and 0–5 parameters.
///
/// `session_id` is session bookkeeping and is not carried on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Operation code for requests, response code for responses.
    pub code: u16,
    pub session_id: u32,
    pub transaction_id: u32,
    pub params: Vec<u32>,
}

impl Container {
    /// A container with no parameters.
    pub fn new(code: u16) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }

    /// A container with parameters, rejecting more than [`MAX_PARAMS`].
    pub fn with_params(code: u16, params: &[u32]) -> Result<Self> {
        check_params(params.len())?;
        Ok(Self {
            code,
            params: params.to_vec(),
            ..Self::default()
        })
    }

    /// Parameter at `index`, if present.
    pub fn param(&self, index: usize) -> Option<u32> {
        self.params.get(index).copied()
    }

    /// Whether this response carries the OK code.
    pub fn is_ok(&self) -> bool {
        self.code == rc::OK
    }

    /// Size of the generic encoding of this container.
    pub fn wire_size(&self) -> usize {
        CONTAINER_HEADER_SIZE + 4 * self.params.len()
    }
}

fn check_params(count: usize) -> Result<()> {
    if count > MAX_PARAMS {
        return Err(FrameError::TooManyParams {
            count,
            max: MAX_PARAMS,
        });
    }
    Ok(())
}

/// Decoded generic container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub length: u32,
    pub kind: u16,
    pub code: u16,
    pub transaction_id: u32,
}

impl ContainerHeader {
    /// Read the part of the header that follows the length field.
    pub fn read_after_length(length: u32, cursor: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            length,
            kind: cursor.read_u16()?,
            code: cursor.read_u16()?,
            transaction_id: cursor.read_u32()?,
        })
    }

    /// Require a specific container type.
    pub fn expect(&self, kind: ContainerType) -> Result<()> {
        if self.kind != kind as u16 {
            return Err(FrameError::UnexpectedType {
                expected: kind as u32,
                got: self.kind as u32,
            });
        }
        Ok(())
    }

    /// Payload length implied by the declared length, if the length is known.
    pub fn payload_len(&self) -> Result<Option<u64>> {
        if self.length == UNKNOWN_LENGTH {
            return Ok(None);
        }
        if (self.length as usize) < CONTAINER_HEADER_SIZE {
            return Err(FrameError::LengthUnderflow {
                declared: self.length,
                header: CONTAINER_HEADER_SIZE,
            });
        }
        Ok(Some(u64::from(self.length) - CONTAINER_HEADER_SIZE as u64))
    }
}

/// Encode a command, response or event container in the generic layout.
///
/// ```text
/// ┌────────────┬──────────┬──────────┬──────────────┬──────────────────┐
/// │ Length     │ Type     │ Code     │ Transaction  │ Params           │
/// │ (4B LE)    │ (2B LE)  │ (2B LE)  │ (4B LE)      │ (0-5 × 4B LE)    │
/// └────────────┴──────────┴──────────┴──────────────┴──────────────────┘
/// ```
pub fn encode_container(kind: ContainerType, container: &Container, dst: &mut BytesMut) -> Result<()> {
    check_params(container.params.len())?;
    let len = container.wire_size();
    dst.reserve(len);
    dst.put_u32_le(len as u32);
    dst.put_u16_le(kind as u16);
    dst.put_u16_le(container.code);
    dst.put_u32_le(container.transaction_id);
    for &param in &container.params {
        dst.put_u32_le(param);
    }
    Ok(())
}

/// Encode the header of a data container announcing `payload_len` bytes.
///
/// Payloads that do not fit a `u32` length announce [`UNKNOWN_LENGTH`].
pub fn encode_data_header(code: u16, transaction_id: u32, payload_len: u64, dst: &mut BytesMut) {
    let total = payload_len + CONTAINER_HEADER_SIZE as u64;
    let len = u32::try_from(total).unwrap_or(UNKNOWN_LENGTH);
    dst.reserve(CONTAINER_HEADER_SIZE);
    dst.put_u32_le(len);
    dst.put_u16_le(ContainerType::Data as u16);
    dst.put_u16_le(code);
    dst.put_u32_le(transaction_id);
}

/// Decode a complete generic container from `buf`.
///
/// Returns the header and the payload slice the declared length covers.
/// Bytes beyond the declared length are not part of the container.
pub fn decode_container(buf: &[u8]) -> Result<(ContainerHeader, &[u8])> {
    let mut cursor = ByteReader::new(buf);
    let length = cursor.read_u32()?;
    let header = ContainerHeader::read_after_length(length, &mut cursor)?;
    let payload_len = header
        .payload_len()?
        .unwrap_or(cursor.remaining() as u64) as usize;
    let payload = cursor.read_bytes(payload_len)?;
    Ok((header, payload))
}

/// Parameters of a command or response payload, count implied by its length.
pub fn decode_params(payload: &[u8]) -> Result<Vec<u32>> {
    ByteReader::new(payload).read_u32_tail(MAX_PARAMS)
}

/// Build a [`Container`] from a decoded header and its parameter payload.
pub fn container_from_parts(header: &ContainerHeader, payload: &[u8]) -> Result<Container> {
    Ok(Container {
        code: header.code,
        session_id: 0,
        transaction_id: header.transaction_id,
        params: decode_params(payload)?,
    })
}

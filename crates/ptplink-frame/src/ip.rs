//! PTP/IP frame bodies.
//!
//! Standard frames carry an 8-byte header, length (4) + type (4), and the
//! length counts the header. The Fuji dialect only uses that header for its
//! init exchange; everything after is a generic container (see
//! [`crate::container`]).

use bytes::{BufMut, BytesMut};

use crate::container::{Container, MAX_PARAMS};
use crate::cursor::{put_utf16z, utf16z_len, ByteReader};
use crate::error::{FrameError, Result};
use crate::event::{Event, MAX_EVENT_PARAMS};

/// PTP/IP header: length (4) + frame type (4).
pub const IP_HEADER_SIZE: usize = 8;

/// Protocol version sent in the standard init request (major 1, minor 0).
pub const PTPIP_VERSION: u32 = 0x0001_0000;

/// Magic word that opens the Fuji init request.
pub const FUJI_INIT_MAGIC: u32 = 0x8F53_E4F2;

/// Data-phase field of a command request.
pub const DATA_PHASE_NONE_OR_IN: u32 = 1;
pub const DATA_PHASE_OUT: u32 = 2;

/// Length of a peer GUID.
pub const GUID_LEN: usize = 16;

/// PTP/IP frame types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum IpFrameType {
    InitCommandRequest = 1,
    InitCommandAck = 2,
    InitEventRequest = 3,
    InitEventAck = 4,
    InitFail = 5,
    CmdRequest = 6,
    CmdResponse = 7,
    Event = 8,
    StartData = 9,
    Data = 10,
    Cancel = 11,
    EndData = 12,
    Ping = 13,
    Pong = 14,
}

impl IpFrameType {
    pub fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            1 => Self::InitCommandRequest,
            2 => Self::InitCommandAck,
            3 => Self::InitEventRequest,
            4 => Self::InitEventAck,
            5 => Self::InitFail,
            6 => Self::CmdRequest,
            7 => Self::CmdResponse,
            8 => Self::Event,
            9 => Self::StartData,
            10 => Self::Data,
            11 => Self::Cancel,
            12 => Self::EndData,
            13 => Self::Ping,
            14 => Self::Pong,
            _ => return None,
        })
    }

    /// Fail unless `got` is this frame type.
    pub fn expect(self, got: u32) -> Result<()> {
        if got != self as u32 {
            return Err(FrameError::UnexpectedType {
                expected: self as u32,
                got,
            });
        }
        Ok(())
    }
}

fn put_header(dst: &mut BytesMut, kind: IpFrameType, body_len: usize) {
    dst.reserve(IP_HEADER_SIZE + body_len);
    dst.put_u32_le((IP_HEADER_SIZE + body_len) as u32);
    dst.put_u32_le(kind as u32);
}

/// Standard init command request: guid, host name, version.
pub fn encode_init_command_request(guid: &[u8; GUID_LEN], host_name: &str, dst: &mut BytesMut) {
    put_header(
        dst,
        IpFrameType::InitCommandRequest,
        GUID_LEN + utf16z_len(host_name) + 4,
    );
    dst.put_slice(guid);
    put_utf16z(dst, host_name);
    dst.put_u16_le(PTPIP_VERSION as u16);
    dst.put_u16_le((PTPIP_VERSION >> 16) as u16);
}

/// Fuji init command request: magic, guid, host name.
pub fn encode_fuji_init_command_request(
    guid: &[u8; GUID_LEN],
    host_name: &str,
    dst: &mut BytesMut,
) {
    put_header(
        dst,
        IpFrameType::InitCommandRequest,
        4 + GUID_LEN + utf16z_len(host_name),
    );
    dst.put_u32_le(FUJI_INIT_MAGIC);
    dst.put_slice(guid);
    put_utf16z(dst, host_name);
}

/// Body of an init command acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitAck {
    /// Identifier the device assigned to this connection's event pipe.
    pub pipe_id: u32,
    pub guid: [u8; GUID_LEN],
    /// Device display name.
    pub name: String,
}

impl InitAck {
    pub fn decode(body: &[u8]) -> Result<Self> {
        let mut cursor = ByteReader::new(body);
        let pipe_id = cursor.read_u32()?;
        let guid = cursor.read_array()?;
        let name = cursor.read_utf16z();
        Ok(Self {
            pipe_id,
            guid,
            name,
        })
    }

    pub fn encode(&self, dst: &mut BytesMut) {
        put_header(
            dst,
            IpFrameType::InitCommandAck,
            4 + GUID_LEN + utf16z_len(&self.name),
        );
        dst.put_u32_le(self.pipe_id);
        dst.put_slice(&self.guid);
        put_utf16z(dst, &self.name);
    }
}

/// Init event request carrying the pipe id from the command ack.
pub fn encode_init_event_request(pipe_id: u32, dst: &mut BytesMut) {
    put_header(dst, IpFrameType::InitEventRequest, 4);
    dst.put_u32_le(pipe_id);
}

/// A header-only frame such as `InitEventAck`, `InitFail`, `Ping` or `Pong`.
pub fn encode_empty(kind: IpFrameType, dst: &mut BytesMut) {
    put_header(dst, kind, 0);
}

/// Command request: data-phase (4), code (2), transaction id (4), params.
pub fn encode_cmd_request(request: &Container, sends_data: bool, dst: &mut BytesMut) -> Result<()> {
    if request.params.len() > MAX_PARAMS {
        return Err(FrameError::TooManyParams {
            count: request.params.len(),
            max: MAX_PARAMS,
        });
    }
    put_header(dst, IpFrameType::CmdRequest, 10 + 4 * request.params.len());
    dst.put_u32_le(if sends_data {
        DATA_PHASE_OUT
    } else {
        DATA_PHASE_NONE_OR_IN
    });
    dst.put_u16_le(request.code);
    dst.put_u32_le(request.transaction_id);
    for &param in &request.params {
        dst.put_u32_le(param);
    }
    Ok(())
}

/// Decode a command request body into the container and its data-phase flag.
pub fn decode_cmd_request(body: &[u8]) -> Result<(Container, bool)> {
    let mut cursor = ByteReader::new(body);
    let phase = cursor.read_u32()?;
    let code = cursor.read_u16()?;
    let transaction_id = cursor.read_u32()?;
    let params = cursor.read_u32_tail(MAX_PARAMS)?;
    Ok((
        Container {
            code,
            session_id: 0,
            transaction_id,
            params,
        },
        phase == DATA_PHASE_OUT,
    ))
}

/// Command response: code (2), transaction id (4), params.
pub fn encode_cmd_response(response: &Container, dst: &mut BytesMut) -> Result<()> {
    if response.params.len() > MAX_PARAMS {
        return Err(FrameError::TooManyParams {
            count: response.params.len(),
            max: MAX_PARAMS,
        });
    }
    put_header(dst, IpFrameType::CmdResponse, 6 + 4 * response.params.len());
    dst.put_u16_le(response.code);
    dst.put_u32_le(response.transaction_id);
    for &param in &response.params {
        dst.put_u32_le(param);
    }
    Ok(())
}

/// Decode a command response body. The parameter count follows from its length.
pub fn decode_cmd_response(body: &[u8]) -> Result<Container> {
    let mut cursor = ByteReader::new(body);
    let code = cursor.read_u16()?;
    let transaction_id = cursor.read_u32()?;
    let params = cursor.read_u32_tail(MAX_PARAMS)?;
    Ok(Container {
        code,
        session_id: 0,
        transaction_id,
        params,
    })
}

/// Event frame: code (2), transaction id (4), params.
pub fn encode_event(event: &Event, dst: &mut BytesMut) -> Result<()> {
    if event.params.len() > MAX_EVENT_PARAMS {
        return Err(FrameError::TooManyParams {
            count: event.params.len(),
            max: MAX_EVENT_PARAMS,
        });
    }
    put_header(dst, IpFrameType::Event, 6 + 4 * event.params.len());
    dst.put_u16_le(event.code);
    dst.put_u32_le(event.transaction_id);
    for &param in &event.params {
        dst.put_u32_le(param);
    }
    Ok(())
}

/// Start-data frame announcing the total payload size.
pub fn encode_start_data(transaction_id: u32, total: u64, dst: &mut BytesMut) {
    put_header(dst, IpFrameType::StartData, 12);
    dst.put_u32_le(transaction_id);
    dst.put_u64_le(total);
}

/// Decode a start-data body into transaction id and announced total.
pub fn decode_start_data(body: &[u8]) -> Result<(u32, u64)> {
    let mut cursor = ByteReader::new(body);
    Ok((cursor.read_u32()?, cursor.read_u64()?))
}

/// Header and transaction id of a `Data` or `EndData` frame carrying `payload_len` bytes.
///
/// The payload itself is written by the caller right after.
pub fn encode_data_packet_header(
    last: bool,
    transaction_id: u32,
    payload_len: usize,
    dst: &mut BytesMut,
) {
    let kind = if last {
        IpFrameType::EndData
    } else {
        IpFrameType::Data
    };
    put_header(dst, kind, 4 + payload_len);
    dst.put_u32_le(transaction_id);
}

/// Cancel frame for `transaction_id`.
pub fn encode_cancel(transaction_id: u32, dst: &mut BytesMut) {
    put_header(dst, IpFrameType::Cancel, 4);
    dst.put_u32_le(transaction_id);
}

use std::io::{Read, Write};

use ptplink_frame::ip::{
    encode_fuji_init_command_request, encode_init_command_request, encode_init_event_request,
    InitAck,
};
use ptplink_frame::{FrameConfig, FrameError, FrameReader, FrameWriter, HeaderLayout, IpFrameType};
use ptplink_transport::{Result, TransportError};
use tracing::{debug, warn};

use crate::address::Dialect;
use crate::guid::Guid;

/// Upper bound on init ack bodies. They carry a GUID and a short name.
pub const MAX_HANDSHAKE_PAYLOAD: usize = 16 * 1024;

fn handshake_reader<S: Read>(stream: S) -> FrameReader<S> {
    FrameReader::with_config(
        stream,
        FrameConfig {
            max_payload_size: MAX_HANDSHAKE_PAYLOAD,
            ..FrameConfig::default()
        },
    )
}

/// Send the init command request on the command socket and read the ack.
///
/// Both dialects read the ack with a typed 8-byte header. An `InitFail`
/// answer is [`TransportError::PermissionDenied`].
pub fn init_command<S: Read + Write>(
    stream: &mut S,
    dialect: Dialect,
    guid: &Guid,
    host_name: &str,
) -> Result<InitAck> {
    debug!(%dialect, %guid, host_name, "sending init command request");
    FrameWriter::new(&mut *stream).send_with(|dst| {
        match dialect {
            Dialect::Standard => encode_init_command_request(guid.as_bytes(), host_name, dst),
            Dialect::Fuji => encode_fuji_init_command_request(guid.as_bytes(), host_name, dst),
        }
        Ok(())
    })?;

    let frame = handshake_reader(&mut *stream).read_frame(HeaderLayout::LengthAndType)?;
    match IpFrameType::from_u32(frame.header.kind()) {
        Some(IpFrameType::InitCommandAck) => {
            let ack = InitAck::decode(&frame.body)?;
            debug!(pipe_id = ack.pipe_id, name = %ack.name, "init command acknowledged");
            Ok(ack)
        }
        Some(IpFrameType::InitFail) => {
            warn!(%dialect, "device rejected init command request");
            Err(TransportError::PermissionDenied)
        }
        _ => Err(FrameError::UnexpectedType {
            expected: IpFrameType::InitCommandAck as u32,
            got: frame.header.kind(),
        }
        .into()),
    }
}

/// Bind the event socket to the command connection (standard dialect only).
pub fn init_event<S: Read + Write>(stream: &mut S, pipe_id: u32) -> Result<()> {
    debug!(pipe_id, "sending init event request");
    FrameWriter::new(&mut *stream).send_with(|dst| {
        encode_init_event_request(pipe_id, dst);
        Ok(())
    })?;

    let frame = handshake_reader(&mut *stream).read_frame(HeaderLayout::LengthAndType)?;
    match IpFrameType::from_u32(frame.header.kind()) {
        Some(IpFrameType::InitEventAck) => {
            debug!(pipe_id, "init event acknowledged");
            Ok(())
        }
        Some(IpFrameType::InitFail) => {
            warn!(pipe_id, "device rejected init event request");
            Err(TransportError::PermissionDenied)
        }
        _ => Err(FrameError::UnexpectedType {
            expected: IpFrameType::InitEventAck as u32,
            got: frame.header.kind(),
        }
        .into()),
    }
}

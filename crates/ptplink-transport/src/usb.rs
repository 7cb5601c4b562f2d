//! PTP over USB bulk pipes.
//!
//! The USB host stack stays outside this crate: [`UsbTransport`] drives any
//! [`BulkPipe`] and owns only the container-level rules (first-packet
//! header+data packing, zero-length packet termination, early responses,
//! surplus bytes after a data phase).

use std::io::{self, ErrorKind};
use std::time::Duration;

use bytes::BytesMut;
use ptplink_frame::codes::ev;
use ptplink_frame::container::{
    container_from_parts, decode_container, encode_container, encode_data_header, ContainerType,
    CONTAINER_HEADER_SIZE,
};
use ptplink_frame::{Container, Event, FrameError};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{Result, TransportError};
use crate::event::EventQueue;
use crate::handler::{fill_from, pull_blocks, DataSink, DataSource};
use crate::traits::{DataPhase, Transport};

/// Bytes requested for the first packet of a data phase or response.
pub const FIRST_PACKET_LEN: usize = 512;

/// Class request that cancels a transaction.
pub const CANCEL_REQUEST: u8 = 0x64;

const EVENT_PACKET_LEN: usize = 64;

/// Endpoint access the USB transport needs.
pub trait BulkPipe {
    /// Write to the bulk-out endpoint. An empty slice sends a zero-length packet.
    fn write_bulk(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Read from the bulk-in endpoint.
    fn read_bulk(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Read from the interrupt endpoint, waiting at most `timeout`.
    ///
    /// Returns 0 or a `TimedOut` error when nothing arrived.
    fn read_interrupt(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;

    /// wMaxPacketSize of the bulk-out endpoint.
    fn max_packet_size(&self) -> usize;

    /// Send a class-specific control request with `data` as its data stage.
    fn class_request(&mut self, request: u8, data: &[u8]) -> io::Result<()>;
}

/// Tunables for [`UsbTransport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UsbConfig {
    /// Block size for data sent after the first packet. Default: 4096.
    pub block_size: usize,
    /// Largest single bulk read in a data phase. Default: 64 KiB.
    pub read_chunk: usize,
    /// Interrupt wait for [`Transport::check_event_fast`]. Default: 150 ms.
    pub fast_event_timeout: Duration,
    /// Interrupt wait for [`Transport::check_event_wait`]. Default: 1 s.
    pub wait_event_timeout: Duration,
    /// Interrupt wait for checks made on the command path. Default: 1 ms.
    pub drain_event_timeout: Duration,
}

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            block_size: 4096,
            read_chunk: 64 * 1024,
            fast_event_timeout: Duration::from_millis(150),
            wait_event_timeout: Duration::from_secs(1),
            drain_event_timeout: Duration::from_millis(1),
        }
    }
}

/// [`Transport`] over a USB bulk pipe triple.
pub struct UsbTransport<P> {
    pipe: P,
    config: UsbConfig,
    pending_response: Option<Container>,
}

impl<P: BulkPipe> UsbTransport<P> {
    pub fn new(pipe: P) -> Self {
        Self::with_config(pipe, UsbConfig::default())
    }

    pub fn with_config(pipe: P, config: UsbConfig) -> Self {
        Self {
            pipe,
            config,
            pending_response: None,
        }
    }

    pub fn config(&self) -> &UsbConfig {
        &self.config
    }

    pub fn get_ref(&self) -> &P {
        &self.pipe
    }

    pub fn get_mut(&mut self) -> &mut P {
        &mut self.pipe
    }

    pub fn into_inner(self) -> P {
        self.pipe
    }

    fn max_packet(&self) -> usize {
        self.pipe.max_packet_size().max(CONTAINER_HEADER_SIZE + 1)
    }

    /// A single bulk write that must be accepted whole.
    fn write_packet(&mut self, data: &[u8]) -> Result<()> {
        let written = self.pipe.write_bulk(data)?;
        if written != data.len() {
            return Err(TransportError::Io(io::Error::new(
                ErrorKind::WriteZero,
                format!("bulk write accepted {written} of {} bytes", data.len()),
            )));
        }
        Ok(())
    }

    /// One bulk read, skipping a single stray zero-length packet.
    fn read_packet(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut n = self.pipe.read_bulk(buf)?;
        if n == 0 {
            trace!("skipping zero-length packet");
            n = self.pipe.read_bulk(buf)?;
        }
        if n == 0 {
            return Err(TransportError::Io(io::Error::from(ErrorKind::UnexpectedEof)));
        }
        Ok(n)
    }

    /// Keep `bytes` as the pending response if they hold one.
    fn stash_surplus(&mut self, bytes: &[u8]) {
        if bytes.len() < CONTAINER_HEADER_SIZE {
            if !bytes.is_empty() {
                warn!(len = bytes.len(), "discarding stray bytes after data phase");
            }
            return;
        }
        match decode_container(bytes) {
            Ok((header, payload)) if header.kind == ContainerType::Response as u16 => {
                if let Ok(response) = container_from_parts(&header, payload) {
                    debug!(code = response.code, "response arrived with data phase");
                    self.pending_response = Some(response);
                }
            }
            _ => warn!(len = bytes.len(), "discarding surplus bytes after data phase"),
        }
    }

    fn read_event(&mut self, timeout: Duration) -> Result<Event> {
        let mut buf = [0u8; EVENT_PACKET_LEN];
        let mut n = match self.pipe.read_interrupt(&mut buf, timeout) {
            Ok(0) => return Err(TransportError::Timeout),
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::TimedOut => return Err(TransportError::Timeout),
            Err(err) => return Err(err.into()),
        };
        if n < 4 {
            return Err(FrameError::Truncated {
                needed: CONTAINER_HEADER_SIZE,
                available: n,
            }
            .into());
        }
        let declared = (u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize).min(buf.len());
        while n < declared {
            match self.pipe.read_interrupt(&mut buf[n..declared], timeout)? {
                0 => break,
                more => n += more,
            }
        }
        let (header, payload) = decode_container(&buf[..n])?;
        let event = Event::from_container(&header, payload)?;
        debug!(code = event.code, transaction_id = event.transaction_id, "usb event");
        Ok(event)
    }
}

impl<P: BulkPipe> Transport for UsbTransport<P> {
    fn send_request(
        &mut self,
        request: &Container,
        _phase: DataPhase,
        events: &mut EventQueue,
    ) -> Result<()> {
        self.drain_event(events);
        debug!(code = request.code, transaction_id = request.transaction_id, "usb request");
        let mut buf = BytesMut::new();
        encode_container(ContainerType::Command, request, &mut buf)?;
        self.write_packet(&buf)
    }

    fn send_data(
        &mut self,
        request: &Container,
        size: u64,
        source: &mut dyn DataSource,
        events: &mut EventQueue,
    ) -> Result<()> {
        let max_packet = self.max_packet();
        let first = size.min((max_packet - CONTAINER_HEADER_SIZE) as u64) as usize;

        let mut packet = BytesMut::with_capacity(CONTAINER_HEADER_SIZE + first);
        encode_data_header(request.code, request.transaction_id, size, &mut packet);
        packet.resize(CONTAINER_HEADER_SIZE + first, 0);
        fill_from(source, &mut packet[CONTAINER_HEADER_SIZE..])?;
        self.write_packet(&packet)?;
        let mut written = packet.len() as u64;

        let block_size = self.config.block_size;
        pull_blocks(source, size - first as u64, block_size, |block, _| {
            self.write_packet(block)?;
            written += block.len() as u64;
            self.drain_event(events);
            Ok(())
        })?;

        if written % max_packet as u64 == 0 {
            trace!(written, "terminating with zero-length packet");
            self.pipe.write_bulk(&[])?;
        }
        debug!(code = request.code, size, "usb data sent");
        Ok(())
    }

    fn get_data(
        &mut self,
        request: &Container,
        sink: &mut dyn DataSink,
        events: &mut EventQueue,
    ) -> Result<()> {
        let _ = events;
        let mut first = vec![0u8; FIRST_PACKET_LEN.max(self.max_packet())];
        let n = self.read_packet(&mut first)?;
        let first = &first[..n];
        if n < CONTAINER_HEADER_SIZE {
            return Err(FrameError::Truncated {
                needed: CONTAINER_HEADER_SIZE,
                available: n,
            }
            .into());
        }

        let declared = u32::from_le_bytes([first[0], first[1], first[2], first[3]]);
        let kind = u16::from_le_bytes([first[4], first[5]]);
        let code = u16::from_le_bytes([first[6], first[7]]);

        if kind == ContainerType::Response as u16 {
            debug!("response arrived instead of data");
            self.stash_surplus(first);
            return Ok(());
        }
        if kind != ContainerType::Data as u16 {
            return Err(FrameError::UnexpectedType {
                expected: ContainerType::Data as u32,
                got: kind as u32,
            }
            .into());
        }
        if code != request.code {
            return Err(TransportError::Protocol(format!(
                "data phase for code {code:#06x} while {:#06x} is outstanding",
                request.code
            )));
        }

        let unknown_length = declared == u32::MAX;
        if !unknown_length && (declared as usize) < CONTAINER_HEADER_SIZE {
            return Err(FrameError::LengthUnderflow {
                declared,
                header: CONTAINER_HEADER_SIZE,
            }
            .into());
        }

        let in_first = if unknown_length {
            n
        } else {
            n.min(declared as usize)
        };
        sink.accept(&first[CONTAINER_HEADER_SIZE..in_first])?;
        if in_first < n {
            let surplus = first[in_first..].to_vec();
            self.stash_surplus(&surplus);
            return Ok(());
        }
        if unknown_length && n % self.max_packet() != 0 {
            return Ok(());
        }

        let max_packet = self.max_packet();
        let mut left = if unknown_length {
            u64::MAX
        } else {
            u64::from(declared) - n as u64
        };
        let mut chunk = vec![0u8; self.config.read_chunk.max(max_packet)];
        while left > 0 {
            let want = if unknown_length {
                max_packet
            } else if left > chunk.len() as u64 {
                chunk.len()
            } else if left as usize > max_packet {
                left as usize - (left as usize % max_packet)
            } else {
                left as usize
            };
            let got = self.pipe.read_bulk(&mut chunk[..want])?;
            if got == 0 {
                if unknown_length {
                    break;
                }
                return Err(TransportError::Io(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("data phase ended with {left} bytes outstanding"),
                )));
            }
            if unknown_length {
                sink.accept(&chunk[..got])?;
                if got < max_packet {
                    break;
                }
                continue;
            }
            let take = (got as u64).min(left) as usize;
            sink.accept(&chunk[..take])?;
            left -= take as u64;
            if take < got {
                let surplus = chunk[take..got].to_vec();
                self.stash_surplus(&surplus);
            }
        }
        debug!(code = request.code, "usb data received");
        Ok(())
    }

    fn get_response(&mut self, request: &Container, events: &mut EventQueue) -> Result<Container> {
        let _ = events;
        if let Some(response) = self.pending_response.take() {
            trace!(code = response.code, "using buffered response");
            return Ok(response);
        }
        let mut buf = vec![0u8; FIRST_PACKET_LEN.max(self.max_packet())];
        let n = self.read_packet(&mut buf)?;
        let (header, payload) = decode_container(&buf[..n])?;
        header.expect(ContainerType::Response)?;
        let response = container_from_parts(&header, payload)?;
        debug!(
            code = response.code,
            transaction_id = response.transaction_id,
            request = request.code,
            "usb response"
        );
        Ok(response)
    }

    fn check_event_fast(&mut self) -> Result<Event> {
        self.read_event(self.config.fast_event_timeout)
    }

    fn check_event_wait(&mut self) -> Result<Event> {
        self.read_event(self.config.wait_event_timeout)
    }

    fn cancel(&mut self, transaction_id: u32) -> Result<()> {
        let mut data = [0u8; 6];
        data[..2].copy_from_slice(&ev::CANCEL_TRANSACTION.to_le_bytes());
        data[2..].copy_from_slice(&transaction_id.to_le_bytes());
        debug!(transaction_id, "usb cancel request");
        self.pipe.class_request(CANCEL_REQUEST, &data)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "usb"
    }

    fn drain_event(&mut self, events: &mut EventQueue) {
        match self.read_event(self.config.drain_event_timeout) {
            Ok(event) => events.push(event),
            Err(err) if err.is_timeout() => {}
            Err(err) => warn!(%err, "usb event check failed"),
        }
    }
}

use std::net::SocketAddr;
use std::time::Duration;

use bytes::BytesMut;
use ptplink_frame::codes::op;
use ptplink_frame::container::container_from_parts;
use ptplink_frame::ip::{
    decode_cmd_response, decode_start_data, encode_cancel, encode_cmd_request,
    encode_data_packet_header, encode_empty, encode_start_data, InitAck,
};
use ptplink_frame::{
    encode_container, encode_data_header, ByteReader, Container, ContainerHeader, ContainerType,
    Event, FrameError, FrameReader, FrameWriter, HeaderLayout, IpFrameType, CONTAINER_HEADER_SIZE,
    IP_HEADER_SIZE,
};
use ptplink_transport::{
    pull_blocks, DataPhase, DataSink, DataSource, EventQueue, Result, Transport, TransportError,
};
use tracing::{debug, trace, warn};

use crate::address::Dialect;
use crate::config::IpConfig;
use crate::fuji::FUJI_FALLBACK_DEVICE_INFO;
use crate::stream::IpStream;

/// Announced total of a data phase whose size the device does not know.
const UNKNOWN_TOTAL: u64 = u64::MAX;

/// Size of the data-phase transaction id that prefixes `Data`/`EndData` payloads.
const DATA_TID_LEN: usize = 4;

/// Inner container header of a Fuji frame: type, code, transaction id.
const FUJI_INNER_HEADER: usize = CONTAINER_HEADER_SIZE - 4;

/// PTP/IP [`Transport`] over a command stream and an optional event stream.
///
/// The dialect decides framing. Standard PTP/IP wraps every message in a
/// typed 8-byte header; the Fuji dialect sends generic containers behind a
/// bare length.
pub struct PtpIpTransport<S> {
    dialect: Dialect,
    config: IpConfig,
    command: FrameReader<S>,
    event: Option<FrameReader<S>>,
    event_addr: Option<SocketAddr>,
    init_ack: Option<InitAck>,
    pending_response: Option<Container>,
    /// Set once a read stopped mid-frame; the event stream has lost its framing.
    event_broken: bool,
    closed: bool,
}

impl<S: IpStream> PtpIpTransport<S> {
    /// Wrap streams whose init handshake has already completed.
    pub fn from_streams(dialect: Dialect, command: S, event: Option<S>, config: IpConfig) -> Self {
        Self {
            dialect,
            config,
            command: FrameReader::new(command),
            event: event.map(FrameReader::new),
            event_addr: None,
            init_ack: None,
            pending_response: None,
            event_broken: false,
            closed: false,
        }
    }

    pub(crate) fn with_init_ack(mut self, ack: InitAck) -> Self {
        self.init_ack = Some(ack);
        self
    }

    pub(crate) fn with_event_addr(mut self, addr: SocketAddr) -> Self {
        self.event_addr = Some(addr);
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn config(&self) -> &IpConfig {
        &self.config
    }

    /// The init command acknowledgement, when this transport made the connection.
    pub fn init_ack(&self) -> Option<&InitAck> {
        self.init_ack.as_ref()
    }

    /// Device name announced in the init acknowledgement.
    pub fn device_name(&self) -> Option<&str> {
        self.init_ack.as_ref().map(|ack| ack.name.as_str())
    }

    pub(crate) fn event_addr(&self) -> Option<SocketAddr> {
        self.event_addr
    }

    pub fn has_event_channel(&self) -> bool {
        self.event.is_some()
    }

    /// Use `stream` as the event channel. Any handshake it needs must be done.
    pub fn attach_event_stream(&mut self, stream: S) {
        self.event = Some(FrameReader::new(stream));
        self.event_broken = false;
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(TransportError::Shutdown);
        }
        Ok(())
    }

    fn command_layout(&self) -> HeaderLayout {
        match self.dialect {
            Dialect::Standard => HeaderLayout::LengthAndType,
            Dialect::Fuji => HeaderLayout::LengthOnly,
        }
    }

    fn send_command_frame<F>(&mut self, encode: F) -> Result<()>
    where
        F: FnOnce(&mut BytesMut) -> ptplink_frame::Result<()>,
    {
        FrameWriter::new(self.command.get_mut()).send_with(encode)?;
        Ok(())
    }

    /// Write `prefix` then `payload` as one frame on the command stream.
    fn send_split_frame(&mut self, prefix: &[u8], payload: &[u8]) -> Result<()> {
        let mut writer = FrameWriter::new(self.command.get_mut());
        writer.write_all(prefix)?;
        writer.write_all(payload)?;
        writer.flush()?;
        Ok(())
    }

    /// Read one event.
    ///
    /// A frame read that fails for any reason other than a timeout before its
    /// first byte leaves the event channel unusable: every later read fails
    /// with [`TransportError::Protocol`] until a new stream is attached.
    fn read_event(&mut self, timeout: Duration) -> Result<Event> {
        self.ensure_open()?;
        if self.event_broken {
            return Err(TransportError::Protocol(
                "event channel lost frame sync".to_string(),
            ));
        }
        let dialect = self.dialect;
        let layout = match dialect {
            Dialect::Standard => HeaderLayout::LengthAndType,
            Dialect::Fuji => HeaderLayout::LengthOnly,
        };
        let Some(channel) = self.event.as_mut() else {
            return Err(TransportError::Timeout);
        };

        loop {
            if !channel.get_ref().wait_readable(timeout)? {
                return Err(TransportError::Timeout);
            }
            let frame = match channel.read_frame(layout) {
                Ok(frame) => frame,
                Err(err) => {
                    let err = TransportError::from(err);
                    if !err.is_timeout() {
                        warn!(%err, "event channel out of sync");
                        self.event_broken = true;
                    }
                    return Err(err);
                }
            };
            match dialect {
                Dialect::Fuji => {
                    let mut cursor = ByteReader::new(&frame.body);
                    let header = ContainerHeader::read_after_length(frame.header.length, &mut cursor)?;
                    let event = Event::from_container(&header, cursor.rest())?;
                    debug!(code = event.code, params = ?event.params, "fuji event");
                    return Ok(event);
                }
                Dialect::Standard => {
                    match IpFrameType::from_u32(frame.header.kind()) {
                        Some(IpFrameType::Event) => {
                            let event = Event::decode_body(&frame.body)?;
                            debug!(code = event.code, params = ?event.params, "ptpip event");
                            return Ok(event);
                        }
                        Some(IpFrameType::Ping) => {
                            trace!("answering ping");
                            FrameWriter::new(channel.get_mut()).send_with(|dst| {
                                encode_empty(IpFrameType::Pong, dst);
                                Ok(())
                            })?;
                        }
                        _ => warn!(kind = frame.header.kind(), "ignoring frame on event socket"),
                    }
                }
            }
        }
    }

    fn get_data_standard(&mut self, request: &Container, sink: &mut dyn DataSink) -> Result<()> {
        let start = self.command.read_frame(HeaderLayout::LengthAndType)?;
        match IpFrameType::from_u32(start.header.kind()) {
            Some(IpFrameType::StartData) => {}
            Some(IpFrameType::CmdResponse) => {
                let response = decode_cmd_response(&start.body)?;
                debug!(code = response.code, "response arrived instead of data");
                self.pending_response = Some(response);
                return Ok(());
            }
            _ => {
                return Err(FrameError::UnexpectedType {
                    expected: IpFrameType::StartData as u32,
                    got: start.header.kind(),
                }
                .into())
            }
        }

        let (transaction_id, total) = decode_start_data(&start.body)?;
        if transaction_id != request.transaction_id {
            warn!(
                expected = request.transaction_id,
                got = transaction_id,
                "start data for another transaction"
            );
        }
        debug!(code = request.code, total, "receiving data");

        let mut received: u64 = 0;
        loop {
            let header = self.command.read_header(HeaderLayout::LengthAndType)?;
            let body_len = header.body_len()?;
            let kind = IpFrameType::from_u32(header.kind());
            if !matches!(kind, Some(IpFrameType::Data | IpFrameType::EndData)) {
                warn!(kind = header.kind(), "skipping frame inside data phase");
                self.command.read_body(body_len)?;
                continue;
            }
            if body_len < DATA_TID_LEN {
                return Err(FrameError::Truncated {
                    needed: DATA_TID_LEN,
                    available: body_len,
                }
                .into());
            }
            self.command.read_body(DATA_TID_LEN)?;
            let len = (body_len - DATA_TID_LEN) as u64;
            if total != UNKNOWN_TOTAL && received + len > total {
                return Err(FrameError::LengthMismatch {
                    expected: total,
                    actual: received + len,
                }
                .into());
            }
            self.command
                .stream_body(len, |block| sink.accept(block).map_err(FrameError::Io))?;
            received += len;
            if kind == Some(IpFrameType::EndData) {
                break;
            }
        }

        if total != UNKNOWN_TOTAL && received != total {
            return Err(FrameError::LengthMismatch {
                expected: total,
                actual: received,
            }
            .into());
        }
        Ok(())
    }

    fn get_data_fuji(&mut self, request: &Container, sink: &mut dyn DataSink) -> Result<()> {
        let header = self.command.read_header(HeaderLayout::LengthOnly)?;
        let body_len = header.body_len()?;
        if body_len < FUJI_INNER_HEADER {
            return Err(FrameError::Truncated {
                needed: FUJI_INNER_HEADER,
                available: body_len,
            }
            .into());
        }
        let inner = self.command.read_body(FUJI_INNER_HEADER)?;
        let container =
            ContainerHeader::read_after_length(header.length, &mut ByteReader::new(&inner))?;
        let payload_len = body_len - FUJI_INNER_HEADER;

        match ContainerType::from_u16(container.kind) {
            Some(ContainerType::Data) => {}
            Some(ContainerType::Response) => {
                let params = self.command.read_body(payload_len)?;
                let response = container_from_parts(&container, &params)?;
                debug!(code = response.code, "response arrived instead of data");
                self.pending_response = Some(response);
                return Ok(());
            }
            _ => {
                return Err(FrameError::UnexpectedType {
                    expected: ContainerType::Data as u32,
                    got: u32::from(container.kind),
                }
                .into())
            }
        }
        if container.code != request.code {
            warn!(
                expected = request.code,
                got = container.code,
                "data container for another operation"
            );
        }

        if request.code == op::GET_DEVICE_INFO && payload_len == 0 {
            debug!("empty device info from fuji body, synthesizing");
            sink.accept(FUJI_FALLBACK_DEVICE_INFO)?;
            return Ok(());
        }
        debug!(code = request.code, len = payload_len, "receiving data");
        self.command
            .stream_body(payload_len as u64, |block| {
                sink.accept(block).map_err(FrameError::Io)
            })?;
        Ok(())
    }
}

impl<S: IpStream> Transport for PtpIpTransport<S> {
    fn send_request(
        &mut self,
        request: &Container,
        phase: DataPhase,
        events: &mut EventQueue,
    ) -> Result<()> {
        self.ensure_open()?;
        self.drain_event(events);
        debug!(
            code = request.code,
            transaction_id = request.transaction_id,
            params = ?request.params,
            "sending request"
        );
        match self.dialect {
            Dialect::Standard => self.send_command_frame(|dst| {
                encode_cmd_request(request, phase == DataPhase::Send, dst)
            }),
            Dialect::Fuji => {
                self.send_command_frame(|dst| encode_container(ContainerType::Command, request, dst))
            }
        }
    }

    fn send_data(
        &mut self,
        request: &Container,
        size: u64,
        source: &mut dyn DataSource,
        events: &mut EventQueue,
    ) -> Result<()> {
        self.ensure_open()?;
        let transaction_id = request.transaction_id;
        let block_size = self.config.block_size;
        debug!(code = request.code, size, "sending data");

        match self.dialect {
            Dialect::Standard => {
                self.send_command_frame(|dst| {
                    encode_start_data(transaction_id, size, dst);
                    Ok(())
                })?;
                if size == 0 {
                    return self.send_command_frame(|dst| {
                        encode_data_packet_header(true, transaction_id, 0, dst);
                        Ok(())
                    });
                }
                let mut prefix = BytesMut::with_capacity(IP_HEADER_SIZE + DATA_TID_LEN);
                pull_blocks(source, size, block_size, |block, last| {
                    self.drain_event(events);
                    prefix.clear();
                    encode_data_packet_header(last, transaction_id, block.len(), &mut prefix);
                    self.send_split_frame(&prefix, block)
                })
            }
            Dialect::Fuji => {
                let mut prefix = BytesMut::with_capacity(CONTAINER_HEADER_SIZE);
                encode_data_header(request.code, transaction_id, size, &mut prefix);
                let mut prefix = Some(prefix);
                if size == 0 {
                    return self.send_split_frame(&prefix.take().unwrap_or_default(), &[]);
                }
                pull_blocks(source, size, block_size, |block, _| {
                    self.drain_event(events);
                    let head = prefix.take().unwrap_or_default();
                    self.send_split_frame(&head, block)
                })
            }
        }
    }

    fn get_data(
        &mut self,
        request: &Container,
        sink: &mut dyn DataSink,
        events: &mut EventQueue,
    ) -> Result<()> {
        self.ensure_open()?;
        self.drain_event(events);
        match self.dialect {
            Dialect::Standard => self.get_data_standard(request, sink),
            Dialect::Fuji => self.get_data_fuji(request, sink),
        }
    }

    fn get_response(&mut self, request: &Container, events: &mut EventQueue) -> Result<Container> {
        self.ensure_open()?;
        if let Some(response) = self.pending_response.take() {
            trace!(code = response.code, "using buffered response");
            return Ok(response);
        }
        self.drain_event(events);

        let layout = self.command_layout();
        let response = loop {
            let frame = self.command.read_frame(layout)?;
            match self.dialect {
                Dialect::Fuji => {
                    let mut cursor = ByteReader::new(&frame.body);
                    let header = ContainerHeader::read_after_length(frame.header.length, &mut cursor)?;
                    header.expect(ContainerType::Response)?;
                    break container_from_parts(&header, cursor.rest())?;
                }
                Dialect::Standard => match IpFrameType::from_u32(frame.header.kind()) {
                    Some(IpFrameType::CmdResponse) => break decode_cmd_response(&frame.body)?,
                    Some(IpFrameType::EndData) => {
                        trace!("skipping trailing end-data frame");
                    }
                    _ => {
                        return Err(FrameError::UnexpectedType {
                            expected: IpFrameType::CmdResponse as u32,
                            got: frame.header.kind(),
                        }
                        .into())
                    }
                },
            }
        };
        debug!(
            code = response.code,
            transaction_id = response.transaction_id,
            request = request.code,
            "received response"
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
        self.ensure_open()?;
        match self.dialect {
            Dialect::Standard => {
                debug!(transaction_id, "sending cancel");
                self.send_command_frame(|dst| {
                    encode_cancel(transaction_id, dst);
                    Ok(())
                })
            }
            Dialect::Fuji => Err(TransportError::Unsupported("cancel")),
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.pending_response = None;
        debug!(transport = self.name(), "closing");
        let event_result = match self.event.take() {
            Some(channel) => channel.get_ref().shutdown(),
            None => Ok(()),
        };
        self.command.get_ref().shutdown()?;
        event_result?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        self.dialect.scheme()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::{self, Read, Write};
    use std::os::unix::net::UnixStream;
    use std::thread;
    use std::time::Instant;

    use bytes::BufMut;
    use ptplink_frame::codes::rc;
    use ptplink_frame::ip::{decode_cmd_request, encode_cmd_response, encode_event};
    use ptplink_frame::{decode_container, DeviceInfo, RawFrame};
    use ptplink_transport::{BufferSink, MemorySource};

    use super::*;

    const SEND_OBJECT: u16 = 0x100D;
    const GET_OBJECT: u16 = 0x1009;

    struct Pair {
        host: PtpIpTransport<UnixStream>,
        command: UnixStream,
        event: UnixStream,
    }

    fn pair(dialect: Dialect) -> Pair {
        let (host_cmd, camera_cmd) = UnixStream::pair().unwrap();
        let (host_evt, camera_evt) = UnixStream::pair().unwrap();
        Pair {
            host: PtpIpTransport::from_streams(
                dialect,
                host_cmd,
                Some(host_evt),
                IpConfig::default(),
            ),
            command: camera_cmd,
            event: camera_evt,
        }
    }

    fn write_frame(stream: &mut impl Write, encode: impl FnOnce(&mut BytesMut)) {
        let mut buf = BytesMut::new();
        encode(&mut buf);
        stream.write_all(&buf).unwrap();
    }

    fn request(code: u16, transaction_id: u32) -> Container {
        Container {
            transaction_id,
            ..Container::new(code)
        }
    }

    /// Camera side of one dialect, enough to store and return one object.
    struct FakeCamera {
        dialect: Dialect,
        reader: FrameReader<UnixStream>,
        object: Vec<u8>,
    }

    impl FakeCamera {
        fn new(dialect: Dialect, stream: UnixStream) -> Self {
            Self {
                dialect,
                reader: FrameReader::new(stream),
                object: Vec::new(),
            }
        }

        fn layout(&self) -> HeaderLayout {
            match self.dialect {
                Dialect::Standard => HeaderLayout::LengthAndType,
                Dialect::Fuji => HeaderLayout::LengthOnly,
            }
        }

        fn read_request(&mut self) -> Option<Container> {
            let frame = match self.reader.read_frame(self.layout()) {
                Ok(frame) => frame,
                Err(FrameError::ConnectionClosed) => return None,
                Err(err) => panic!("camera read failed: {err}"),
            };
            Some(match self.dialect {
                Dialect::Standard => {
                    assert_eq!(frame.header.kind(), IpFrameType::CmdRequest as u32);
                    decode_cmd_request(&frame.body).unwrap().0
                }
                Dialect::Fuji => fuji_container(&frame, ContainerType::Command),
            })
        }

        fn read_data(&mut self) -> Vec<u8> {
            let mut data = Vec::new();
            match self.dialect {
                Dialect::Standard => {
                    let start = self.reader.read_frame(HeaderLayout::LengthAndType).unwrap();
                    assert_eq!(start.header.kind(), IpFrameType::StartData as u32);
                    let (_, total) = decode_start_data(&start.body).unwrap();
                    loop {
                        let frame = self.reader.read_frame(HeaderLayout::LengthAndType).unwrap();
                        data.extend_from_slice(&frame.body[4..]);
                        if frame.header.kind() == IpFrameType::EndData as u32 {
                            break;
                        }
                        assert_eq!(frame.header.kind(), IpFrameType::Data as u32);
                    }
                    assert_eq!(data.len() as u64, total);
                }
                Dialect::Fuji => {
                    let frame = self.reader.read_frame(HeaderLayout::LengthOnly).unwrap();
                    assert_eq!(&frame.body[..2], &[2, 0]);
                    data.extend_from_slice(&frame.body[FUJI_INNER_HEADER..]);
                }
            }
            data
        }

        fn write_data(&mut self, code: u16, transaction_id: u32, data: &[u8]) {
            let stream = self.reader.get_mut();
            match self.dialect {
                Dialect::Standard => {
                    write_frame(stream, |dst| {
                        encode_start_data(transaction_id, data.len() as u64, dst)
                    });
                    let chunks: Vec<&[u8]> = if data.is_empty() {
                        vec![&data[..0]]
                    } else {
                        data.chunks(30_000).collect()
                    };
                    let count = chunks.len();
                    for (i, chunk) in chunks.into_iter().enumerate() {
                        write_frame(stream, |dst| {
                            encode_data_packet_header(i + 1 == count, transaction_id, chunk.len(), dst);
                            dst.put_slice(chunk);
                        });
                    }
                }
                Dialect::Fuji => write_frame(stream, |dst| {
                    encode_data_header(code, transaction_id, data.len() as u64, dst);
                    dst.put_slice(data);
                }),
            }
        }

        fn respond(&mut self, code: u16, transaction_id: u32) {
            let response = Container {
                transaction_id,
                ..Container::new(code)
            };
            let dialect = self.dialect;
            write_frame(self.reader.get_mut(), |dst| match dialect {
                Dialect::Standard => encode_cmd_response(&response, dst).unwrap(),
                Dialect::Fuji => encode_container(ContainerType::Response, &response, dst).unwrap(),
            });
        }

        /// Store on SendObject, return on GetObject, until the host hangs up.
        fn serve(mut self) {
            while let Some(request) = self.read_request() {
                match request.code {
                    SEND_OBJECT => {
                        self.object = self.read_data();
                        self.respond(rc::OK, request.transaction_id);
                    }
                    GET_OBJECT => {
                        let object = std::mem::take(&mut self.object);
                        self.write_data(request.code, request.transaction_id, &object);
                        self.respond(rc::OK, request.transaction_id);
                    }
                    _ => self.respond(rc::OPERATION_NOT_SUPPORTED, request.transaction_id),
                }
            }
        }
    }

    fn fuji_container(frame: &RawFrame, kind: ContainerType) -> Container {
        let mut cursor = ByteReader::new(&frame.body);
        let header = ContainerHeader::read_after_length(frame.header.length, &mut cursor).unwrap();
        header.expect(kind).unwrap();
        container_from_parts(&header, cursor.rest()).unwrap()
    }

    fn exchange(dialect: Dialect) {
        let Pair {
            mut host,
            command,
            event: _event,
        } = pair(dialect);
        let camera = thread::spawn(move || FakeCamera::new(dialect, command).serve());
        let mut events = EventQueue::new();
        let mut tid = 0;

        for size in [0usize, 1, 65_535, 65_536, 65_537, 200_000] {
            let payload: Vec<u8> = (0..size).map(|i| (i % 253) as u8).collect();

            tid += 1;
            let put = request(SEND_OBJECT, tid);
            host.send_request(&put, DataPhase::Send, &mut events).unwrap();
            host.send_data(&put, size as u64, &mut MemorySource::new(&payload), &mut events)
                .unwrap();
            assert!(host.get_response(&put, &mut events).unwrap().is_ok());

            tid += 1;
            let get = request(GET_OBJECT, tid);
            let mut sink = BufferSink::new();
            host.send_request(&get, DataPhase::Receive, &mut events).unwrap();
            host.get_data(&get, &mut sink, &mut events).unwrap();
            let response = host.get_response(&get, &mut events).unwrap();
            assert!(response.is_ok());
            assert_eq!(response.transaction_id, tid);
            assert_eq!(sink.len(), size, "{dialect} size {size}");
            assert_eq!(sink.as_slice(), payload.as_slice(), "{dialect} size {size}");
        }

        host.close().unwrap();
        camera.join().unwrap();
    }

    #[test]
    fn standard_data_phases_reassemble() {
        exchange(Dialect::Standard);
    }

    #[test]
    fn fuji_data_phases_reassemble() {
        exchange(Dialect::Fuji);
    }

    /// Accepts at most 1000 bytes per write; reads nothing.
    #[derive(Default)]
    struct TrickleStream {
        written: Vec<u8>,
        writes: usize,
    }

    impl Read for TrickleStream {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
    }

    impl Write for TrickleStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.writes += 1;
            let n = buf.len().min(1000);
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl IpStream for TrickleStream {
        fn wait_readable(&self, _timeout: Duration) -> io::Result<bool> {
            Ok(false)
        }

        fn set_io_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
            Ok(())
        }

        fn shutdown(&self) -> io::Result<()> {
            Ok(())
        }
    }

    struct CountingSource<'a> {
        inner: MemorySource<'a>,
        pulls: Vec<usize>,
    }

    impl DataSource for CountingSource<'_> {
        fn supply(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.pulls.push(buf.len());
            self.inner.supply(buf)
        }
    }

    #[test]
    fn blocks_survive_partial_writes() {
        let payload = vec![0xA5u8; 200_000];
        let mut source = CountingSource {
            inner: MemorySource::new(&payload),
            pulls: Vec::new(),
        };
        let mut host = PtpIpTransport::from_streams(
            Dialect::Standard,
            TrickleStream::default(),
            None,
            IpConfig::default(),
        );
        host.send_data(&request(SEND_OBJECT, 9), 200_000, &mut source, &mut EventQueue::new())
            .unwrap();

        assert_eq!(source.pulls, vec![65_536, 65_536, 65_536, 3_392]);

        let stream = host.command.get_ref();
        assert!(stream.writes > 200);
        let mut cursor = ByteReader::new(&stream.written);
        let mut frames = Vec::new();
        while !cursor.is_empty() {
            let len = cursor.read_u32().unwrap() as usize;
            let kind = cursor.read_u32().unwrap();
            cursor.read_bytes(len - IP_HEADER_SIZE).unwrap();
            frames.push((kind, len));
        }
        assert_eq!(
            frames,
            vec![
                (IpFrameType::StartData as u32, 20),
                (IpFrameType::Data as u32, 65_548),
                (IpFrameType::Data as u32, 65_548),
                (IpFrameType::Data as u32, 65_548),
                (IpFrameType::EndData as u32, 3_404),
            ]
        );
    }

    #[test]
    fn fuji_send_is_one_container() {
        let payload: Vec<u8> = (0..100_000u32).map(|i| i as u8).collect();
        let mut host = PtpIpTransport::from_streams(
            Dialect::Fuji,
            TrickleStream::default(),
            None,
            IpConfig::default(),
        );
        host.send_data(
            &request(SEND_OBJECT, 3),
            payload.len() as u64,
            &mut MemorySource::new(&payload),
            &mut EventQueue::new(),
        )
        .unwrap();

        let written = &host.command.get_ref().written;
        let (header, body) = decode_container(written).unwrap();
        assert_eq!(header.kind, ContainerType::Data as u16);
        assert_eq!(header.code, SEND_OBJECT);
        assert_eq!(header.transaction_id, 3);
        assert_eq!(body, payload.as_slice());
        assert_eq!(written.len(), CONTAINER_HEADER_SIZE + payload.len());
    }

    #[test]
    fn empty_standard_send_is_start_then_end() {
        let mut host = PtpIpTransport::from_streams(
            Dialect::Standard,
            TrickleStream::default(),
            None,
            IpConfig::default(),
        );
        host.send_data(&request(SEND_OBJECT, 5), 0, &mut MemorySource::new(&[]), &mut EventQueue::new())
            .unwrap();
        let written = &host.command.get_ref().written;
        assert_eq!(written.len(), 20 + 12);
        assert_eq!(&written[20..28], &[12, 0, 0, 0, 12, 0, 0, 0]);
    }

    #[test]
    fn stalled_camera_fails_send_within_write_timeout() {
        let (host_cmd, _camera_cmd) = UnixStream::pair().unwrap();
        host_cmd
            .set_write_timeout(Some(Duration::from_millis(50)))
            .unwrap();
        let mut host =
            PtpIpTransport::from_streams(Dialect::Standard, host_cmd, None, IpConfig::default());
        let payload = vec![0u8; 8 * 1024 * 1024];

        let start = Instant::now();
        let err = host
            .send_data(
                &request(SEND_OBJECT, 1),
                payload.len() as u64,
                &mut MemorySource::new(&payload),
                &mut EventQueue::new(),
            )
            .unwrap_err();
        assert!(err.is_timeout(), "{err}");
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn split_event_frame_breaks_event_channel() {
        let Pair {
            mut host,
            command: _command,
            mut event,
        } = pair(Dialect::Standard);
        host.event
            .as_ref()
            .unwrap()
            .get_ref()
            .set_read_timeout(Some(Duration::from_millis(50)))
            .unwrap();

        let mut wire = BytesMut::new();
        encode_event(&Event::with_params(0x4002, 0, &[0x10, 0x20]).unwrap(), &mut wire).unwrap();
        assert_eq!(wire.len(), 22);
        event.write_all(&wire[..10]).unwrap();

        let mut events = EventQueue::new();
        host.drain_event(&mut events);
        assert!(events.pop().is_none());

        // The rest of the frame must not be read as a fresh header.
        event.write_all(&wire[10..]).unwrap();
        let err = host.check_event_fast().unwrap_err();
        assert!(!err.is_timeout(), "{err}");
        assert!(matches!(err, TransportError::Protocol(_)));
        assert!(!host.check_event_wait().unwrap_err().is_timeout());
    }

    #[test]
    fn timeout_mid_event_frame_is_not_a_timeout() {
        let Pair {
            mut host,
            command: _command,
            mut event,
        } = pair(Dialect::Fuji);
        host.event
            .as_ref()
            .unwrap()
            .get_ref()
            .set_read_timeout(Some(Duration::from_millis(50)))
            .unwrap();
        event.write_all(&[16, 0, 0, 0, 4, 0]).unwrap();

        let err = host.check_event_wait().unwrap_err();
        assert!(matches!(
            err,
            TransportError::Frame(FrameError::Truncated { .. })
        ));
    }

    #[test]
    fn fast_check_without_event_is_quick_timeout() {
        let Pair { mut host, .. } = pair(Dialect::Standard);
        let start = Instant::now();
        assert!(matches!(host.check_event_fast(), Err(TransportError::Timeout)));
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[test]
    fn missing_event_channel_reports_timeout() {
        let (host_cmd, _camera) = UnixStream::pair().unwrap();
        let mut host =
            PtpIpTransport::from_streams(Dialect::Fuji, host_cmd, None, IpConfig::default());
        assert!(!host.has_event_channel());
        assert!(matches!(host.check_event_wait(), Err(TransportError::Timeout)));
    }

    #[test]
    fn ping_is_answered_and_event_returned() {
        let Pair {
            mut host,
            command: _command,
            mut event,
        } = pair(Dialect::Standard);
        write_frame(&mut event, |dst| encode_empty(IpFrameType::Ping, dst));
        write_frame(&mut event, |dst| {
            encode_event(&Event::with_params(0x4002, 0, &[0x10]).unwrap(), dst).unwrap()
        });

        let got = host.check_event_wait().unwrap();
        assert_eq!(got.code, 0x4002);
        assert_eq!(got.params, vec![0x10]);

        let pong = FrameReader::new(&mut event)
            .read_frame(HeaderLayout::LengthAndType)
            .unwrap();
        assert_eq!(pong.header.kind(), IpFrameType::Pong as u32);
    }

    #[test]
    fn fuji_event_is_generic_container() {
        let Pair {
            mut host,
            command: _command,
            mut event,
        } = pair(Dialect::Fuji);
        write_frame(&mut event, |dst| {
            let event = Container::with_params(0xC006, &[1, 2]).unwrap();
            encode_container(ContainerType::Event, &event, dst).unwrap()
        });
        let got = host.check_event_wait().unwrap();
        assert_eq!(got.code, 0xC006);
        assert_eq!(got.params, vec![1, 2]);
    }

    #[test]
    fn request_path_queues_waiting_event() {
        let Pair {
            mut host,
            mut command,
            mut event,
        } = pair(Dialect::Standard);
        write_frame(&mut event, |dst| {
            encode_event(&Event::new(0x400D, 0), dst).unwrap()
        });

        let mut events = EventQueue::new();
        host.send_request(&request(0x1001, 1), DataPhase::Receive, &mut events)
            .unwrap();
        assert_eq!(events.pop().map(|e| e.code), Some(0x400D));

        let frame = FrameReader::new(&mut command)
            .read_frame(HeaderLayout::LengthAndType)
            .unwrap();
        let (sent, sends_data) = decode_cmd_request(&frame.body).unwrap();
        assert_eq!(sent.code, 0x1001);
        assert!(!sends_data);
    }

    fn fuji_device_info(payload: &[u8], code: u16) -> Vec<u8> {
        let Pair {
            mut host,
            mut command,
            event: _event,
        } = pair(Dialect::Fuji);
        write_frame(&mut command, |dst| {
            encode_data_header(code, 1, payload.len() as u64, dst);
            dst.put_slice(payload);
        });
        let mut sink = BufferSink::new();
        host.get_data(&request(code, 1), &mut sink, &mut EventQueue::new())
            .unwrap();
        sink.into_bytes().to_vec()
    }

    #[test]
    fn fuji_empty_device_info_is_synthesized() {
        let data = fuji_device_info(&[], op::GET_DEVICE_INFO);
        assert_eq!(data, FUJI_FALLBACK_DEVICE_INFO);
        assert_eq!(DeviceInfo::decode(&data).unwrap().model, "X-T42");
    }

    #[test]
    fn fuji_real_device_info_passes_through() {
        let data = fuji_device_info(b"\x64\x00real", op::GET_DEVICE_INFO);
        assert_eq!(data, b"\x64\x00real");
    }

    #[test]
    fn fuji_empty_payload_for_other_ops_stays_empty() {
        assert!(fuji_device_info(&[], GET_OBJECT).is_empty());
    }

    #[test]
    fn response_instead_of_data_is_kept() {
        for dialect in [Dialect::Standard, Dialect::Fuji] {
            let Pair {
                mut host,
                command,
                event: _event,
            } = pair(dialect);
            let mut camera = FakeCamera::new(dialect, command);
            camera.respond(rc::ACCESS_DENIED, 4);

            let mut events = EventQueue::new();
            let mut sink = BufferSink::new();
            host.get_data(&request(GET_OBJECT, 4), &mut sink, &mut events)
                .unwrap();
            assert!(sink.is_empty());
            let response = host.get_response(&request(GET_OBJECT, 4), &mut events).unwrap();
            assert_eq!(response.code, rc::ACCESS_DENIED, "{dialect}");
        }
    }

    #[test]
    fn short_data_phase_is_length_mismatch() {
        let Pair {
            mut host,
            mut command,
            event: _event,
        } = pair(Dialect::Standard);
        write_frame(&mut command, |dst| {
            encode_start_data(2, 10, dst);
            encode_data_packet_header(true, 2, 4, dst);
            dst.put_slice(b"abcd");
        });
        let err = host
            .get_data(&request(GET_OBJECT, 2), &mut BufferSink::new(), &mut EventQueue::new())
            .unwrap_err();
        assert!(matches!(
            err,
            TransportError::Frame(FrameError::LengthMismatch {
                expected: 10,
                actual: 4
            })
        ));
    }

    #[test]
    fn cancel_per_dialect() {
        let Pair {
            mut host,
            mut command,
            event: _event,
        } = pair(Dialect::Standard);
        host.cancel(0x11).unwrap();
        let frame = FrameReader::new(&mut command)
            .read_frame(HeaderLayout::LengthAndType)
            .unwrap();
        assert_eq!(frame.header.kind(), IpFrameType::Cancel as u32);
        assert_eq!(frame.body.as_ref(), &[0x11, 0, 0, 0]);

        let Pair { mut host, .. } = pair(Dialect::Fuji);
        assert!(matches!(host.cancel(1), Err(TransportError::Unsupported(_))));
    }

    #[test]
    fn closed_transport_refuses_work() {
        let Pair {
            mut host,
            mut command,
            ..
        } = pair(Dialect::Fuji);
        host.close().unwrap();
        host.close().unwrap();
        assert!(matches!(
            host.send_request(&request(0x1002, 1), DataPhase::None, &mut EventQueue::new()),
            Err(TransportError::Shutdown)
        ));
        assert!(matches!(host.check_event_fast(), Err(TransportError::Shutdown)));
        let mut buf = [0u8; 1];
        assert_eq!(command.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn names_follow_dialect() {
        assert_eq!(pair(Dialect::Standard).host.name(), "ptpip");
        assert_eq!(pair(Dialect::Fuji).host.name(), "fujiptpip");
    }
}

use std::net::{SocketAddr, TcpStream};
use std::thread;

use ptplink_transport::{Result, TransportError};
use tracing::{debug, info, warn};

use crate::address::{Dialect, IpAddress};
use crate::config::IpConfig;
use crate::guid::Guid;
use crate::handshake::{init_command, init_event};
use crate::stream::IpStream;
use crate::transport::PtpIpTransport;

const FALLBACK_HOST_NAME: &str = "ptplink";

/// Connect to a camera with default configuration.
///
/// `address` is parsed by [`IpAddress::parse`] with the Fuji dialect
/// unless it carries a `ptpip:` scheme.
pub fn connect(address: &str) -> Result<PtpIpTransport<TcpStream>> {
    connect_with_config(&address.parse()?, IpConfig::default())
}

/// Connect with explicit configuration.
///
/// Opens the command socket and performs the init handshake, then (unless
/// [`IpConfig::defer_event_channel`] is set) opens the event channel.
pub fn connect_with_config(
    address: &IpAddress,
    config: IpConfig,
) -> Result<PtpIpTransport<TcpStream>> {
    let guid = config.guid.unwrap_or_else(Guid::random);
    let host_name = config.host_name.clone().unwrap_or_else(local_host_name);
    info!(%address, "connecting to camera");

    let mut command = open_stream(address.command_addr(), &config)?;
    let ack = init_command(&mut command, address.dialect, &guid, &host_name)?;

    let defer = config.defer_event_channel;
    let mut transport = PtpIpTransport::from_streams(address.dialect, command, None, config)
        .with_init_ack(ack)
        .with_event_addr(address.event_addr());
    if defer {
        debug!("event channel deferred");
    } else {
        transport.connect_event_channel()?;
    }

    info!(
        %address,
        device = transport.device_name().unwrap_or_default(),
        "camera connected"
    );
    Ok(transport)
}

impl PtpIpTransport<TcpStream> {
    /// Open the event socket if it is not open yet.
    ///
    /// "Connection refused" is retried [`IpConfig::event_connect_retries`]
    /// times; other failures and exhausted retries are I/O errors. The
    /// standard dialect then binds the socket with the init event handshake.
    pub fn connect_event_channel(&mut self) -> Result<()> {
        if self.has_event_channel() {
            return Ok(());
        }
        let addr = self
            .event_addr()
            .ok_or(TransportError::Unsupported("event channel without a known address"))?;
        let mut stream = connect_event_stream(addr, self.config())?;
        if self.dialect() == Dialect::Standard {
            let pipe_id = self.init_ack().map(|ack| ack.pipe_id).unwrap_or_default();
            init_event(&mut stream, pipe_id)?;
        }
        debug!(%addr, "event channel connected");
        self.attach_event_stream(stream);
        Ok(())
    }
}

fn open_stream(addr: SocketAddr, config: &IpConfig) -> Result<TcpStream> {
    let stream = TcpStream::connect_timeout(&addr, config.io_timeout).map_err(|source| {
        TransportError::Connect {
            addr: addr.to_string(),
            source,
        }
    })?;
    prepare(&stream, config)?;
    debug!(%addr, "command socket connected");
    Ok(stream)
}

fn connect_event_stream(addr: SocketAddr, config: &IpConfig) -> Result<TcpStream> {
    let mut retries = config.event_connect_retries;
    loop {
        match TcpStream::connect_timeout(&addr, config.io_timeout) {
            Ok(stream) => {
                prepare(&stream, config)?;
                return Ok(stream);
            }
            Err(err) if err.kind() == std::io::ErrorKind::ConnectionRefused && retries > 0 => {
                retries -= 1;
                debug!(%addr, retries, "event connect refused, retrying");
                thread::sleep(config.event_retry_delay);
            }
            Err(err) => {
                warn!(%addr, %err, "could not connect event socket");
                return Err(TransportError::Io(err));
            }
        }
    }
}

fn prepare(stream: &TcpStream, config: &IpConfig) -> Result<()> {
    stream.set_nodelay(true)?;
    stream.set_io_timeout(Some(config.io_timeout))?;
    Ok(())
}

/// Name this host announces in the init request.
pub fn local_host_name() -> String {
    system_host_name()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| FALLBACK_HOST_NAME.to_string())
}

#[cfg(unix)]
fn system_host_name() -> Option<String> {
    let mut buf = [0u8; 256];
    // SAFETY: `buf` is a valid writable buffer of the length passed, and
    // gethostname writes at most that many bytes into it.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast::<libc::c_char>(), buf.len()) };
    if rc != 0 {
        return None;
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Some(String::from_utf8_lossy(&buf[..len]).into_owned())
}

#[cfg(not(unix))]
fn system_host_name() -> Option<String> {
    std::env::var("COMPUTERNAME").ok()
}

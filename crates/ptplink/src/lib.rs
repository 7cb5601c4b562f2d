//! Picture Transfer Protocol for cameras over the network and USB.
//!
//! ptplink drives PTP transactions (request, optional data phase, response)
//! and picks up device events, over PTP/IP sockets (standard and Fuji
//! dialects) or a USB bulk pipe supplied by the host.
//!
//! # Crate Structure
//!
//! - [`frame`]: container, PTP/IP frame and device-info codecs
//! - [`transport`]: the `Transport` contract, data handlers and USB bulk transport
//! - [`ip`]: PTP/IP socket transport (behind the `ip` feature, on by default)
//! - [`session`]: the transaction engine
//! - [`result`]: mapping of errors to single numeric result codes
//! - [`logging`]: subscriber setup (behind the `logging` feature)

pub mod result;

#[cfg(feature = "logging")]
pub mod logging;

/// Re-export frame types.
pub mod frame {
    pub use ptplink_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use ptplink_transport::*;
}

/// Re-export PTP/IP types (requires `ip` feature).
#[cfg(feature = "ip")]
pub mod ip {
    pub use ptplink_ip::*;
}

/// Re-export session types.
pub mod session {
    pub use ptplink_session::*;
}

pub use ptplink_session::{Payload, Session, SessionError};

/// Session over a PTP/IP connection.
#[cfg(feature = "ip")]
pub type IpSession = Session<ptplink_ip::PtpIpTransport<std::net::TcpStream>>;

/// Connect to `address` and wrap the transport in a [`Session`].
///
/// No PTP session is opened yet; call [`Session::open_session`] next.
#[cfg(feature = "ip")]
pub fn connect(address: &str) -> ptplink_session::Result<IpSession> {
    Ok(Session::new(ptplink_ip::connect(address)?))
}

/// [`connect`] with explicit address and configuration.
#[cfg(feature = "ip")]
pub fn connect_with_config(
    address: &ptplink_ip::IpAddress,
    config: ptplink_ip::IpConfig,
) -> ptplink_session::Result<IpSession> {
    Ok(Session::new(ptplink_ip::connect_with_config(address, config)?))
}

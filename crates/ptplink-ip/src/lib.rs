//! PTP/IP socket transport.
//!
//! Talks to cameras over TCP in one of two dialects:
//! - [`Dialect::Standard`]: PTP/IP with typed 8-byte frame headers and an
//!   init-event handshake binding the event socket to the command socket
//! - [`Dialect::Fuji`]: Fujifilm's variant, generic containers behind a bare
//!   length prefix, event socket on the next port
//!
//! [`connect`] parses an address, performs the init handshake and returns a
//! [`PtpIpTransport`] ready for a session.

pub mod address;
pub mod config;
pub mod connector;
pub mod fuji;
pub mod guid;
pub mod handshake;
pub mod stream;
pub mod transport;

pub use address::{Dialect, IpAddress};
pub use config::IpConfig;
pub use connector::{connect, connect_with_config, local_host_name};
pub use fuji::FUJI_FALLBACK_DEVICE_INFO;
pub use guid::Guid;
pub use stream::IpStream;
pub use transport::PtpIpTransport;

//! PTP transport contract.
//!
//! Defines what the transaction engine needs from a physical medium:
//! - The [`Transport`] trait (request, data phase, response, events, cancel)
//! - Streaming data-phase handlers ([`DataSource`], [`DataSink`])
//! - The [`EventQueue`] transports fill during opportunistic checks
//!
//! A USB transport over an abstract [`BulkPipe`] lives here too. The PTP/IP
//! transport is in `ptplink-ip`.

pub mod error;
pub mod event;
pub mod handler;
pub mod traits;
pub mod usb;

pub use error::{Result, TransportError};
pub use event::EventQueue;
pub use handler::{
    fill_from, pull_blocks, BufferSink, DataSink, DataSource, MemorySink, MemorySource,
    ReadSource, WriteSink,
};
pub use traits::{DataPhase, Transport};
pub use usb::{BulkPipe, UsbConfig, UsbTransport};

//! PTP container and PTP/IP frame codecs.
//!
//! Everything that touches raw bytes lives here:
//! - The generic 12-byte container used on USB and by the Fuji IP dialect
//! - The 8-byte PTP/IP frame header and its init, command, data and event bodies
//! - Device-info decoding
//! - A two-stage length-prefixed [`FrameReader`] and a looping [`FrameWriter`]
//!
//! All multi-byte fields are little-endian. Decoding goes through a checked
//! [`ByteReader`], so a length that disagrees with the bytes present is a
//! [`FrameError`], never a panic.

pub mod codes;
pub mod config;
pub mod container;
pub mod cursor;
pub mod deviceinfo;
pub mod error;
pub mod event;
pub mod ip;
pub mod reader;
pub mod writer;

pub use config::{FrameConfig, DEFAULT_MAX_PAYLOAD, DEFAULT_STREAM_CHUNK};
pub use container::{
    decode_container, encode_container, encode_data_header, Container, ContainerHeader,
    ContainerType, CONTAINER_HEADER_SIZE, MAX_PARAMS,
};
pub use cursor::ByteReader;
pub use deviceinfo::DeviceInfo;
pub use error::{FrameError, Result};
pub use event::{Event, MAX_EVENT_PARAMS};
pub use ip::{IpFrameType, IP_HEADER_SIZE};
pub use reader::{FrameHeader, FrameReader, HeaderLayout, RawFrame};
pub use writer::FrameWriter;

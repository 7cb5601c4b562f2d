//! Transaction engine for PTP devices.
//!
//! A [`Session`] owns one [`Transport`](ptplink_transport::Transport) and
//! drives request, data and response phases over it. It also keeps the
//! transaction counter, the session id, the queue of events noticed on the
//! command path and the cached device descriptor.

pub mod error;
pub mod session;

pub use error::{Result, SessionError};
pub use session::{Payload, Session};

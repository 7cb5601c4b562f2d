//! One numeric result code per operation.
//!
//! Hosts that expose PTP to a C-style or scripting surface want a single
//! `u16` per call. Device response codes pass through unchanged; local
//! failures use the codes below. Timeout and permission-denied stay distinct
//! from generic I/O so callers can retry selectively.

use std::io;

use ptplink_frame::codes::rc;
use ptplink_frame::FrameError;
use ptplink_session::SessionError;
use ptplink_transport::TransportError;

pub const OK: u16 = rc::OK;
pub const GENERAL_ERROR: u16 = rc::GENERAL_ERROR;
pub const INVALID_TRANSACTION_ID: u16 = rc::INVALID_TRANSACTION_ID;
pub const OPERATION_NOT_SUPPORTED: u16 = rc::OPERATION_NOT_SUPPORTED;
pub const ACCESS_DENIED: u16 = rc::ACCESS_DENIED;

/// Local I/O failure.
pub const IO: u16 = 0x02FF;
/// Nothing arrived in time.
pub const TIMEOUT: u16 = 0x02FA;
/// Bad argument, such as an unparsable address.
pub const BAD_PARAMETER: u16 = 0x02FC;

pub fn io_code(err: &io::Error) -> u16 {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::PermissionDenied => ACCESS_DENIED,
        _ => IO,
    }
}

pub fn frame_code(err: &FrameError) -> u16 {
    match err {
        FrameError::Io(source) => io_code(source),
        FrameError::ConnectionClosed => IO,
        _ => GENERAL_ERROR,
    }
}

pub fn transport_code(err: &TransportError) -> u16 {
    match err {
        TransportError::Connect { source, .. } | TransportError::Io(source) => io_code(source),
        TransportError::Frame(err) => frame_code(err),
        TransportError::Timeout => TIMEOUT,
        TransportError::PermissionDenied => ACCESS_DENIED,
        TransportError::Protocol(_) => INVALID_TRANSACTION_ID,
        TransportError::InvalidAddress { .. } | TransportError::InvalidGuid(_) => BAD_PARAMETER,
        TransportError::Unsupported(_) => OPERATION_NOT_SUPPORTED,
        TransportError::Shutdown => IO,
    }
}

pub fn session_code(err: &SessionError) -> u16 {
    match err {
        SessionError::Transport(err) => transport_code(err),
        SessionError::TransactionMismatch { .. } => INVALID_TRANSACTION_ID,
        SessionError::Response { code } => *code,
        SessionError::DeviceInfo(err) => frame_code(err),
        SessionError::Timeout(_) => TIMEOUT,
    }
}

/// Collapse an operation's outcome into its result code.
pub fn result_code<T>(result: &Result<T, SessionError>) -> u16 {
    match result {
        Ok(_) => OK,
        Err(err) => session_code(err),
    }
}

pub fn is_timeout(code: u16) -> bool {
    code == TIMEOUT
}

pub fn is_permission_denied(code: u16) -> bool {
    code == ACCESS_DENIED
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn io_kinds() {
        assert_eq!(io_code(&io::Error::from(io::ErrorKind::TimedOut)), TIMEOUT);
        assert_eq!(io_code(&io::Error::from(io::ErrorKind::WouldBlock)), TIMEOUT);
        assert_eq!(
            io_code(&io::Error::from(io::ErrorKind::PermissionDenied)),
            ACCESS_DENIED
        );
        assert_eq!(io_code(&io::Error::from(io::ErrorKind::ConnectionRefused)), IO);
    }

    #[test]
    fn transport_errors() {
        assert_eq!(transport_code(&TransportError::Timeout), TIMEOUT);
        assert!(is_permission_denied(transport_code(
            &TransportError::PermissionDenied
        )));
        assert_eq!(
            transport_code(&TransportError::Frame(FrameError::Truncated {
                needed: 4,
                available: 1
            })),
            GENERAL_ERROR
        );
        assert_eq!(
            transport_code(&TransportError::InvalidAddress {
                address: "x".to_string(),
                reason: "bad".to_string()
            }),
            BAD_PARAMETER
        );
        assert_eq!(
            transport_code(&TransportError::Unsupported("cancel")),
            OPERATION_NOT_SUPPORTED
        );
        assert_eq!(
            transport_code(&TransportError::Connect {
                addr: "127.0.0.1:15740".to_string(),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            }),
            IO
        );
        assert_eq!(
            transport_code(&TransportError::Protocol("wrong code".to_string())),
            INVALID_TRANSACTION_ID
        );
    }

    #[test]
    fn session_errors() {
        assert_eq!(
            session_code(&SessionError::TransactionMismatch {
                expected: 3,
                actual: 4
            }),
            INVALID_TRANSACTION_ID
        );
        assert_eq!(session_code(&SessionError::Response { code: 0x2019 }), 0x2019);
        assert!(is_timeout(session_code(&SessionError::Timeout(
            Duration::from_millis(5)
        ))));
        assert_eq!(
            session_code(&SessionError::Transport(TransportError::Shutdown)),
            IO
        );
    }

    #[test]
    fn outcomes() {
        assert_eq!(result_code::<()>(&Ok(())), OK);
        assert_eq!(
            result_code::<()>(&Err(SessionError::Transport(TransportError::Timeout))),
            TIMEOUT
        );
        assert!(!is_timeout(IO));
    }
}

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

/// A connected byte stream the PTP/IP transport can drive.
///
/// Beyond `Read + Write`, the transport needs a bounded readiness wait for
/// event checks and the usual socket housekeeping.
pub trait IpStream: Read + Write {
    /// Wait up to `timeout` for the stream to become readable.
    ///
    /// Returns `Ok(false)` when the wait expired. End-of-stream and socket
    /// errors count as readable; the following read reports them.
    fn wait_readable(&self, timeout: Duration) -> io::Result<bool>;

    /// Apply `timeout` to blocking reads and writes.
    fn set_io_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Shut down both directions.
    fn shutdown(&self) -> io::Result<()>;
}

impl IpStream for TcpStream {
    #[cfg(unix)]
    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        use std::os::fd::AsRawFd;
        poll_readable(self.as_raw_fd(), timeout)
    }

    #[cfg(not(unix))]
    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        let previous = self.read_timeout()?;
        self.set_read_timeout(Some(timeout.max(Duration::from_millis(1))))?;
        let mut peeked = [0u8; 1];
        let ready = match self.peek(&mut peeked) {
            Ok(_) => Ok(true),
            Err(err) if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                Ok(false)
            }
            Err(_) => Ok(true),
        };
        self.set_read_timeout(previous)?;
        ready
    }

    fn set_io_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(timeout)?;
        self.set_write_timeout(timeout)
    }

    fn shutdown(&self) -> io::Result<()> {
        ignore_not_connected(TcpStream::shutdown(self, Shutdown::Both))
    }
}

#[cfg(unix)]
impl IpStream for std::os::unix::net::UnixStream {
    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        use std::os::fd::AsRawFd;
        poll_readable(self.as_raw_fd(), timeout)
    }

    fn set_io_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(timeout)?;
        self.set_write_timeout(timeout)
    }

    fn shutdown(&self) -> io::Result<()> {
        ignore_not_connected(std::os::unix::net::UnixStream::shutdown(
            self,
            Shutdown::Both,
        ))
    }
}

fn ignore_not_connected(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(err) if err.kind() == io::ErrorKind::NotConnected => Ok(()),
        other => other,
    }
}

/// `poll(2)` for readability with millisecond resolution.
///
/// Sub-millisecond timeouts poll without waiting.
#[cfg(unix)]
pub(crate) fn poll_readable(fd: std::os::fd::RawFd, timeout: Duration) -> io::Result<bool> {
    let millis = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    loop {
        // SAFETY: `pfd` is a valid, writable pollfd for the duration of the call,
        // the count passed is 1, and `fd` is an open descriptor owned by the caller.
        let rc = unsafe { libc::poll(&mut pfd, 1, millis) };
        if rc >= 0 {
            return Ok(rc > 0 && pfd.revents != 0);
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

//! The interruptible connection: a data descriptor plus a self-pipe, so a
//! blocked read or write can always be woken by `disconnect()` from another
//! thread (`spec.md` §4.9).
//!
//! Grounded on `hdds::transport::tcp::TcpConnection`'s state machine
//! (`examples/hdds-team-hdds/crates/hdds/src/transport/tcp/connection.rs`)
//! and on `ash::posix::connection` (`examples/original_source/src/ash/posix/connection.cpp`)
//! for the write/read/disconnect shapes themselves. `hdds` carries a richer
//! `Idle -> Connecting -> Connected -> Reconnecting -> Closing -> Closed`
//! machine for a self-managing TCP client; this type is handed an
//! already-open descriptor; it owns nothing of the connection lifecycle
//! before it arrives, so only the tail of that machine applies here.

use crate::error::{Error, ErrorKind, Result};
use crate::io::descriptor::{raw_read, raw_write, Descriptor};
use crate::io::{select2, Awaitable, Flag};
use crate::packet::PacketStream;
use parking_lot::{Condvar, Mutex};
use std::os::unix::io::RawFd;

/// Where a [`Connection`] sits in its forward-only lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Closing,
    Closed,
}

struct Inner {
    state: Mutex<ConnectionState>,
    outstanding: Mutex<usize>,
    quiescent: Condvar,
}

/// A descriptor wrapped so that any blocked `read`/`write` is woken the
/// instant another thread calls [`Connection::disconnect`], rather than
/// hanging until the peer does something.
pub struct Connection {
    fd: RawFd,
    data: Mutex<Descriptor>,
    shutdown: Flag,
    inner: Inner,
}

/// RAII guard: an in-flight operation holds one while it runs, so
/// `disconnect` knows when it is safe to close the descriptors.
struct OpGuard<'a> {
    inner: &'a Inner,
}

impl<'a> OpGuard<'a> {
    fn begin(inner: &'a Inner) -> Result<Self> {
        let state = inner.state.lock();
        if *state != ConnectionState::Connected {
            return Err(Error::io_error("Connection is closed", 0));
        }
        *inner.outstanding.lock() += 1;
        Ok(OpGuard { inner })
    }
}

impl<'a> Drop for OpGuard<'a> {
    fn drop(&mut self) {
        let mut count = self.inner.outstanding.lock();
        *count -= 1;
        if *count == 0 {
            self.inner.quiescent.notify_all();
        }
    }
}

impl Connection {
    /// Takes ownership of `data`, which must already be open and set
    /// non-blocking; `Connection` manages its own self-pipe.
    pub fn new(data: Descriptor) -> Result<Self> {
        data.set_blocking(false)?;
        let fd = data.raw();
        Ok(Connection {
            fd,
            data: Mutex::new(data),
            shutdown: Flag::new()?,
            inner: Inner {
                state: Mutex::new(ConnectionState::Connected),
                outstanding: Mutex::new(0),
                quiescent: Condvar::new(),
            },
        })
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock()
    }

    /// Writes all of `buf`, looping past `try-again` by selecting on the
    /// descriptor becoming writable or the connection starting to close.
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        let _guard = OpGuard::begin(&self.inner)?;
        let mut written = 0;
        while written < buf.len() {
            match raw_write(self.fd, &buf[written..]) {
                Ok(n) => written += n,
                Err(e) if e.kind() == ErrorKind::TryAgain => {
                    self.wait_writable_or_shutdown()?;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(written)
    }

    /// Reads into `buf`, looping past `try-again` symmetrically to
    /// [`Connection::write`].
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let _guard = OpGuard::begin(&self.inner)?;
        loop {
            match raw_read(self.fd, buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::TryAgain => {
                    self.wait_readable_or_shutdown()?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn wait_writable_or_shutdown(&self) -> Result<()> {
        let writable = Awaitable::from_readiness(crate::io::Readiness::writable(self.fd));
        let shutting = self.shutdown.wait_set();
        let (w, s) = select2(writable, shutting)?;
        if s.is_some() {
            return Err(Error::shutting_down("connection is closing"));
        }
        debug_assert!(w.is_some());
        Ok(())
    }

    fn wait_readable_or_shutdown(&self) -> Result<()> {
        let readable = Awaitable::from_readiness(crate::io::Readiness::readable(self.fd));
        let shutting = self.shutdown.wait_set();
        let (r, s) = select2(readable, shutting)?;
        if s.is_some() {
            return Err(Error::shutting_down("connection is closing"));
        }
        debug_assert!(r.is_some());
        Ok(())
    }

    /// Tears the connection down. Sets `closing`, which wakes any thread
    /// blocked in [`Connection::write`]/[`Connection::read`] with
    /// `shutting-down`; waits for those in-flight operations to return;
    /// then closes the data descriptor. Reentrant: a second call is a no-op.
    pub fn disconnect(&self) -> Result<()> {
        {
            let mut state = self.inner.state.lock();
            if *state != ConnectionState::Connected {
                return Ok(());
            }
            *state = ConnectionState::Closing;
        }
        crate::info_log!("connection fd={} closing", self.fd);
        self.shutdown.set()?;
        {
            let mut count = self.inner.outstanding.lock();
            while *count > 0 {
                self.inner.quiescent.wait(&mut count);
            }
        }
        self.data.lock().close();
        *self.inner.state.lock() = ConnectionState::Closed;
        Ok(())
    }
}

impl PacketStream for Connection {
    fn write_chunk(&self, buf: &[u8]) -> Result<usize> {
        self.write(buf)
    }

    fn read_chunk(&self, buf: &mut [u8]) -> Result<usize> {
        self.read(buf)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn writes_and_reads_round_trip() {
        let (r, w) = Descriptor::pipe_pair().unwrap();
        let write_conn = Connection::new(w).unwrap();
        let read_conn = Connection::new(r).unwrap();
        write_conn.write(b"hello").unwrap();
        let mut buf = [0u8; 5];
        read_conn.read(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn disconnect_is_reentrant() {
        let (r, _w) = Descriptor::pipe_pair().unwrap();
        let conn = Connection::new(r).unwrap();
        conn.disconnect().unwrap();
        conn.disconnect().unwrap();
        assert_eq!(conn.state(), ConnectionState::Closed);
    }

    #[test]
    fn operations_fail_after_disconnect() {
        let (r, _w) = Descriptor::pipe_pair().unwrap();
        let conn = Connection::new(r).unwrap();
        conn.disconnect().unwrap();
        let mut buf = [0u8; 1];
        let err = conn.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::IoError(0));
    }

    #[test]
    fn blocked_read_is_woken_by_disconnect() {
        let (r, _w) = Descriptor::pipe_pair().unwrap();
        let conn = Arc::new(Connection::new(r).unwrap());
        let reader = conn.clone();
        let handle = std::thread::spawn(move || {
            let mut buf = [0u8; 1];
            reader.read(&mut buf)
        });
        std::thread::sleep(Duration::from_millis(20));
        conn.disconnect().unwrap();
        let result = handle.join().unwrap();
        assert_eq!(result.unwrap_err().kind(), crate::error::ErrorKind::ShuttingDown);
    }
}

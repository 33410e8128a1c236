//! An owned, closable OS I/O handle.
//!
//! Grounded on `ash::channel` / `ash::posix::file_descriptor`
//! (`examples/original_source/src/ash/io.cpp`): a bare `RawFd` wrapper whose
//! destructor closes the handle, with `dup`, blocking-mode toggles, and a
//! `pipe_pair` constructor. Implemented directly against `libc` rather than
//! `std::fs`/`std::net` because the rest of the runtime needs the raw fd to
//! build `poll(2)` sets in [`crate::io::select`].

use crate::error::{Error, Result};
use crate::io::readiness::Readiness;
use std::os::unix::io::RawFd;

/// File open mode, mirroring `ash::posix::open_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    Append,
    ReadPlus,
    WritePlus,
    AppendPlus,
}

impl OpenMode {
    fn flags(self) -> libc::c_int {
        match self {
            OpenMode::Read => libc::O_RDONLY,
            OpenMode::Write => libc::O_WRONLY | libc::O_CREAT | libc::O_TRUNC,
            OpenMode::Append => libc::O_WRONLY | libc::O_CREAT | libc::O_APPEND,
            OpenMode::ReadPlus => libc::O_RDWR,
            OpenMode::WritePlus => libc::O_RDWR | libc::O_CREAT | libc::O_TRUNC,
            OpenMode::AppendPlus => libc::O_RDWR | libc::O_CREAT | libc::O_APPEND,
        }
    }
}

/// An owned OS descriptor. Invariant: a non-empty `Descriptor` always refers
/// to a resource owned by exactly one `Descriptor` value; `Drop` closes it.
#[derive(Debug)]
pub struct Descriptor {
    fd: RawFd,
}

impl Descriptor {
    /// An empty descriptor, owning nothing.
    pub const fn empty() -> Self {
        Descriptor { fd: -1 }
    }

    /// Takes ownership of a raw fd already obtained from the OS.
    ///
    /// # Safety
    /// `fd` must be a valid, currently-open descriptor not owned elsewhere.
    pub unsafe fn from_raw(fd: RawFd) -> Self {
        Descriptor { fd }
    }

    pub fn is_empty(&self) -> bool {
        self.fd < 0
    }

    pub fn raw(&self) -> RawFd {
        self.fd
    }

    /// Leaves `self` empty and returns the descriptor it used to own
    /// (the Rust expression of "move leaves the source empty").
    pub fn take(&mut self) -> Descriptor {
        let fd = self.fd;
        self.fd = -1;
        Descriptor { fd }
    }

    pub fn open(path: &str, mode: OpenMode) -> Result<Self> {
        let cpath = std::ffi::CString::new(path)
            .map_err(|_| Error::invalid_state("path contains a NUL byte"))?;
        let fd = unsafe { libc::open(cpath.as_ptr(), mode.flags(), 0o644) };
        if fd < 0 {
            return Err(Error::from_errno("error opening descriptor"));
        }
        Ok(Descriptor { fd })
    }

    /// Creates an anonymous pipe, returning `(read_end, write_end)`.
    pub fn pipe_pair() -> Result<(Descriptor, Descriptor)> {
        let mut fds = [0i32; 2];
        let rc = unsafe { libc::pipe(fds.as_mut_ptr()) };
        if rc != 0 {
            return Err(Error::from_errno("error creating pipe pair"));
        }
        Ok((Descriptor { fd: fds[0] }, Descriptor { fd: fds[1] }))
    }

    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.check_non_empty()?;
        raw_read(self.fd, buf)
    }

    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        self.check_non_empty()?;
        raw_write(self.fd, buf)
    }

    pub fn duplicate(&self) -> Result<Descriptor> {
        self.check_non_empty()?;
        let fd = unsafe { libc::dup(self.fd) };
        if fd < 0 {
            return Err(Error::from_errno("error duplicating descriptor"));
        }
        Ok(Descriptor { fd })
    }

    pub fn set_blocking(&self, blocking: bool) -> Result<()> {
        self.check_non_empty()?;
        let flags = unsafe { libc::fcntl(self.fd, libc::F_GETFL) };
        if flags < 0 {
            return Err(Error::from_errno("error reading descriptor flags"));
        }
        let new_flags = if blocking {
            flags & !libc::O_NONBLOCK
        } else {
            flags | libc::O_NONBLOCK
        };
        let rc = unsafe { libc::fcntl(self.fd, libc::F_SETFL, new_flags) };
        if rc < 0 {
            return Err(Error::from_errno("error setting descriptor flags"));
        }
        Ok(())
    }

    pub fn close(&mut self) {
        if self.fd >= 0 {
            unsafe {
                libc::close(self.fd);
            }
            self.fd = -1;
        }
    }

    pub fn readable(&self) -> Readiness {
        Readiness::readable(self.fd)
    }

    pub fn writable(&self) -> Readiness {
        Readiness::writable(self.fd)
    }

    fn check_non_empty(&self) -> Result<()> {
        if self.fd < 0 {
            return Err(Error::invalid_state("operation on an empty descriptor"));
        }
        Ok(())
    }
}

impl Drop for Descriptor {
    fn drop(&mut self) {
        self.close();
    }
}

// SAFETY: a `Descriptor` has exclusive ownership of its raw fd; the value
// carries no thread-local state, so moving it (and its sole owning
// reference) across threads is sound.
unsafe impl Send for Descriptor {}

/// Reads directly against a raw fd, without requiring ownership of a
/// [`Descriptor`]. Used by [`crate::transport::Connection`], which holds its
/// fds behind a lock for closing but must not hold that lock across a
/// blocking syscall.
pub(crate) fn raw_read(fd: RawFd, buf: &mut [u8]) -> Result<usize> {
    let n = unsafe { libc::read(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len()) };
    if n < 0 {
        return Err(Error::from_errno("error reading from descriptor"));
    }
    Ok(n as usize)
}

pub(crate) fn raw_write(fd: RawFd, buf: &[u8]) -> Result<usize> {
    let n = unsafe { libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
    if n < 0 {
        return Err(Error::from_errno("error writing to descriptor"));
    }
    Ok(n as usize)
}

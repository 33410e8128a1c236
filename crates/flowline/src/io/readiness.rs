//! Opaque readiness values, meaningful only to [`crate::io::select`].
//!
//! A `Readiness` is the Rust expression of `ash`'s `awaitable<void>`: it
//! names *what* to wait for (a descriptor direction, a deadline, or "always
//! ready") without doing any waiting itself. Cheap to copy, per spec.

use std::os::unix::io::RawFd;
use std::time::Instant;

/// What [`crate::io::select::select_ready`] should wait for.
#[derive(Debug, Clone, Copy)]
pub enum Readiness {
    /// Fires once `fd` has data available to read (or is at EOF).
    AwaitReadable(RawFd),
    /// Fires once `fd` can accept a write without blocking.
    AwaitWritable(RawFd),
    /// Fires once `Instant::now() >= deadline`.
    Timer(Instant),
    /// Always fires immediately.
    Always,
}

impl Readiness {
    pub fn readable(fd: RawFd) -> Self {
        Readiness::AwaitReadable(fd)
    }

    pub fn writable(fd: RawFd) -> Self {
        Readiness::AwaitWritable(fd)
    }

    pub fn timer(deadline: Instant) -> Self {
        Readiness::Timer(deadline)
    }

    pub fn timeout(duration: std::time::Duration) -> Self {
        Readiness::Timer(Instant::now() + duration)
    }

    pub fn always() -> Self {
        Readiness::Always
    }
}

/// A readiness primitive paired with an optional continuation, the Rust
/// expression of `awaitable<T>.then(fn)`. `select` (via [`super::select`])
/// applies `continuation` inline once the `readiness` fires; no executor or
/// runtime is required (`spec.md` §9).
pub struct Awaitable<T> {
    pub(crate) readiness: Readiness,
    pub(crate) continuation: Box<dyn FnOnce() -> crate::error::Result<T> + Send>,
}

impl Awaitable<()> {
    /// A bare readiness with no continuation: firing just yields `()`.
    pub fn from_readiness(readiness: Readiness) -> Self {
        Awaitable {
            readiness,
            continuation: Box::new(|| Ok(())),
        }
    }
}

impl<T> Awaitable<T> {
    pub fn new(
        readiness: Readiness,
        continuation: impl FnOnce() -> crate::error::Result<T> + Send + 'static,
    ) -> Self {
        Awaitable {
            readiness,
            continuation: Box::new(continuation),
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    /// `awaitable<T>.then(fn) -> awaitable<U>`: chains a further
    /// transformation onto the value this awaitable produces once it
    /// fires, without introducing a second wait.
    pub fn then<U>(
        self,
        f: impl FnOnce(T) -> crate::error::Result<U> + Send + 'static,
    ) -> Awaitable<U>
    where
        T: Send + 'static,
    {
        let continuation = self.continuation;
        Awaitable {
            readiness: self.readiness,
            continuation: Box::new(move || f(continuation()?)),
        }
    }

    pub(crate) fn fire(self) -> crate::error::Result<T> {
        (self.continuation)()
    }
}

//! A self-pipe-backed, select-compatible boolean signal.
//!
//! Grounded on `ash::flag` (`examples/original_source/src/ash/posix/flag.cpp`):
//! a one-byte pipe whose readable end becomes a `Readiness::AwaitReadable`,
//! so waiting for a flag composes with anything else `select` is waiting on
//! in the same call. Used directly by [`crate::sync::future`] and
//! [`crate::sync::queue`], and indirectly by [`super::select::Cancellation`]
//! and [`crate::transport::Connection`]'s shutdown pipe.

use crate::error::Result;
use crate::io::descriptor::Descriptor;
use crate::io::readiness::{Awaitable, Readiness};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct Inner {
    read_end: Descriptor,
    write_end: Descriptor,
    set: AtomicBool,
}

/// A cross-thread signal that can be waited on through [`crate::io::select`].
/// Cloning a `Flag` shares the same underlying pipe and state.
#[derive(Clone)]
pub struct Flag {
    inner: Arc<Inner>,
}

impl Flag {
    pub fn new() -> Result<Self> {
        let (read_end, write_end) = Descriptor::pipe_pair()?;
        read_end.set_blocking(false)?;
        Ok(Flag {
            inner: Arc::new(Inner {
                read_end,
                write_end,
                set: AtomicBool::new(false),
            }),
        })
    }

    /// Sets the flag. A no-op if it was already set.
    pub fn set(&self) -> Result<()> {
        if self
            .inner
            .set
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.inner.write_end.write(&[1u8])?;
        }
        Ok(())
    }

    /// Clears the flag, draining the self-pipe byte. A no-op if it was
    /// already clear.
    pub fn reset(&self) -> Result<()> {
        if self
            .inner
            .set
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let mut buf = [0u8; 1];
            loop {
                match self.inner.read_end.read(&mut buf) {
                    Ok(0) => break,
                    Ok(_) => continue,
                    Err(e) if e.kind() == crate::error::ErrorKind::TryAgain => break,
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }

    pub fn is_set(&self) -> bool {
        self.inner.set.load(Ordering::Acquire)
    }

    pub fn wait_set_readiness(&self) -> Readiness {
        self.inner.read_end.readable()
    }

    /// An awaitable that fires once the flag is set. Does not reset it;
    /// callers that want edge-triggered behavior call [`Flag::reset`]
    /// themselves once they've observed the wake.
    pub fn wait_set(&self) -> Awaitable<()> {
        Awaitable::from_readiness(self.wait_set_readiness())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_clear() {
        let f = Flag::new().unwrap();
        assert!(!f.is_set());
    }

    #[test]
    fn set_then_reset_round_trips() {
        let f = Flag::new().unwrap();
        f.set().unwrap();
        assert!(f.is_set());
        f.reset().unwrap();
        assert!(!f.is_set());
    }

    #[test]
    fn double_set_is_idempotent() {
        let f = Flag::new().unwrap();
        f.set().unwrap();
        f.set().unwrap();
        assert!(f.is_set());
    }

    #[test]
    fn wait_set_is_selectable_across_threads() {
        let f = Flag::new().unwrap();
        let f2 = f.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(10));
            f2.set().unwrap();
        });
        let fired =
            crate::io::select::select_ready(&[f.wait_set_readiness()]).unwrap();
        assert_eq!(fired, vec![true]);
        handle.join().unwrap();
    }
}

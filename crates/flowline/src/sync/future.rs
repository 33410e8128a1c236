//! A single-assignment, select-compatible future/promise pair.
//!
//! Grounded on `ash::future` (`examples/original_source/src/ash/posix/future.h`):
//! shared state behind a refcount, a [`crate::io::Flag`] signaling
//! "resolved", and reader/writer liveness bits so a writer dropped without
//! setting a value produces a "broken promise" error rather than a hang.

use crate::error::{Error, ErrorKind, Result};
use crate::io::{select1, Awaitable, Flag};
use parking_lot::Mutex;
use std::sync::Arc;

enum Slot<T> {
    Empty,
    Value(T),
    Error(Error),
}

struct Shared<T> {
    slot: Mutex<Slot<T>>,
    resolved: Flag,
    writer_alive: std::sync::atomic::AtomicBool,
}

/// The write side of a future. Exactly one of [`Promise::set_value`] /
/// [`Promise::set_error`] may be called; dropping a `Promise` without
/// calling either resolves the paired [`Future`] with an `invalid-state`
/// "broken promise" error.
pub struct Promise<T> {
    shared: Arc<Shared<T>>,
}

/// The read side of a future.
pub struct Future<T> {
    shared: Arc<Shared<T>>,
}

/// Creates a connected `(Future, Promise)` pair.
pub fn make_future<T>() -> Result<(Future<T>, Promise<T>)> {
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot::Empty),
        resolved: Flag::new()?,
        writer_alive: std::sync::atomic::AtomicBool::new(true),
    });
    Ok((
        Future {
            shared: shared.clone(),
        },
        Promise { shared },
    ))
}

impl<T> Promise<T> {
    pub fn set_value(self, value: T) -> Result<()> {
        self.resolve(Slot::Value(value))
    }

    pub fn set_error(self, error: Error) -> Result<()> {
        self.resolve(Slot::Error(error))
    }

    fn resolve(self, slot: Slot<T>) -> Result<()> {
        {
            let mut guard = self.shared.slot.lock();
            if !matches!(*guard, Slot::Empty) {
                return Err(Error::invalid_state("promise already resolved"));
            }
            *guard = slot;
        }
        self.shared
            .writer_alive
            .store(false, std::sync::atomic::Ordering::Release);
        self.shared.resolved.set()
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        let mut guard = self.shared.slot.lock();
        if matches!(*guard, Slot::Empty) {
            *guard = Slot::Error(Error::invalid_state("broken promise: dropped without a value"));
            drop(guard);
            self.shared
                .writer_alive
                .store(false, std::sync::atomic::Ordering::Release);
            let _ = self.shared.resolved.set();
        }
    }
}

impl<T: Send + 'static> Future<T> {
    /// Returns the value immediately if already resolved, propagating the
    /// stored error, or fails with try-again if the future is still unset.
    pub fn maybe_get(&self) -> Result<T> {
        if !self.shared.resolved.is_set() {
            return Err(Error::try_again("future not yet resolved"));
        }
        self.take()
    }

    /// An awaitable that fires once the future is resolved, yielding the
    /// value or propagating the stored error.
    pub fn async_get(self) -> Awaitable<T> {
        let readiness = self.shared.resolved.wait_set_readiness();
        Awaitable::new(readiness, move || self.take())
    }

    /// Blocks the calling thread until the future resolves.
    pub fn get(self) -> Result<T> {
        select1(self.async_get())
    }

    fn take(&self) -> Result<T> {
        let mut guard = self.shared.slot.lock();
        match std::mem::replace(&mut *guard, Slot::Empty) {
            Slot::Value(v) => Ok(v),
            Slot::Error(e) => Err(e),
            Slot::Empty => Err(Error::new(ErrorKind::InvalidState, "future not yet resolved")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_with_a_value() {
        let (future, promise) = make_future::<i32>().unwrap();
        promise.set_value(42).unwrap();
        assert_eq!(future.get().unwrap(), 42);
    }

    #[test]
    fn resolves_with_an_error() {
        let (future, promise) = make_future::<i32>().unwrap();
        promise.set_error(Error::out_of_range("too big")).unwrap();
        let err = future.get().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn dropped_promise_breaks_the_future() {
        let (future, promise) = make_future::<i32>().unwrap();
        drop(promise);
        let err = future.get().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
    }

    #[test]
    fn maybe_get_reflects_resolution() {
        let (future, promise) = make_future::<i32>().unwrap();
        assert_eq!(future.maybe_get().unwrap_err().kind(), ErrorKind::TryAgain);
        promise.set_value(1).unwrap();
        assert_eq!(future.maybe_get().unwrap(), 1);
    }

    #[test]
    fn resolves_from_another_thread() {
        let (future, promise) = make_future::<&'static str>().unwrap();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(10));
            promise.set_value("done").unwrap();
        });
        assert_eq!(future.get().unwrap(), "done");
        handle.join().unwrap();
    }
}

//! Quiescent teardown for objects other threads may be mid-call into.
//!
//! Grounded on `ash::usage_lock` (`examples/original_source/src/ash/usage_lock.h`):
//! a shared pointer plus a usage counter. `arm` installs the target and
//! future `get()` calls bump the counter for as long as the returned guard
//! lives; `disarm` clears the target and blocks until every outstanding
//! guard has dropped, so a caller can safely dismantle an RPC-registered
//! object without racing an in-flight dispatch.

use crate::error::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

struct State<T> {
    target: Option<Arc<T>>,
    outstanding: usize,
}

/// A teardown-safe holder for a shared object.
pub struct UsageLock<T> {
    state: Mutex<State<T>>,
    quiescent: Condvar,
}

/// A live handle obtained from [`UsageLock::get`]. While held, `disarm`
/// blocks waiting for it (and any siblings) to drop.
pub struct Usage<'a, T> {
    lock: &'a UsageLock<T>,
    target: Arc<T>,
}

impl<'a, T> std::ops::Deref for Usage<'a, T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.target
    }
}

impl<'a, T> Drop for Usage<'a, T> {
    fn drop(&mut self) {
        let mut state = self.lock.state.lock();
        state.outstanding -= 1;
        if state.outstanding == 0 {
            self.lock.quiescent.notify_all();
        }
    }
}

impl<T> Default for UsageLock<T> {
    fn default() -> Self {
        UsageLock {
            state: Mutex::new(State {
                target: None,
                outstanding: 0,
            }),
            quiescent: Condvar::new(),
        }
    }
}

impl<T> UsageLock<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `target`, making subsequent [`UsageLock::get`] calls succeed.
    pub fn arm(&self, target: Arc<T>) {
        self.state.lock().target = Some(target);
    }

    /// Returns a live handle to the target, or fails with `unavailable` if
    /// disarmed. Holding the handle keeps `disarm` blocked until it drops.
    pub fn get(&self) -> Result<Usage<'_, T>> {
        let mut state = self.state.lock();
        let target = state
            .target
            .clone()
            .ok_or_else(|| Error::unavailable("usage lock is disarmed"))?;
        state.outstanding += 1;
        Ok(Usage { lock: self, target })
    }

    /// Clears the target and blocks until every outstanding [`Usage`] guard
    /// has dropped.
    pub fn disarm(&self) {
        let mut state = self.state.lock();
        state.target = None;
        while state.outstanding > 0 {
            self.quiescent.wait(&mut state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_fails_before_arm() {
        let lock: UsageLock<i32> = UsageLock::new();
        assert_eq!(lock.get().unwrap_err().kind(), crate::error::ErrorKind::Unavailable);
    }

    #[test]
    fn get_succeeds_after_arm() {
        let lock = UsageLock::new();
        lock.arm(Arc::new(7));
        assert_eq!(*lock.get().unwrap(), 7);
    }

    #[test]
    fn disarm_waits_for_outstanding_usage() {
        let lock = Arc::new(UsageLock::new());
        lock.arm(Arc::new(1));
        let usage = lock.get().unwrap();
        let lock2 = lock.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(15));
            drop(usage);
        });
        lock2.disarm();
        handle.join().unwrap();
        assert_eq!(lock2.get().unwrap_err().kind(), crate::error::ErrorKind::Unavailable);
    }

    #[test]
    fn disarm_returns_immediately_with_no_outstanding_usage() {
        let lock = UsageLock::new();
        lock.arm(Arc::new(1));
        lock.disarm();
        assert_eq!(lock.get().unwrap_err().kind(), crate::error::ErrorKind::Unavailable);
    }
}

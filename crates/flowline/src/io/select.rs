//! Waits on a heterogeneous set of [`Readiness`] primitives.
//!
//! Grounded on the poll-based multiplexing `hdds::transport::tcp::io_thread`
//! performs with a long-lived `mio::Poll`
//! (`examples/hdds-team-hdds/crates/hdds/src/transport/tcp/io_thread.rs`).
//! This crate's `select` is a one-shot primitive invoked from arbitrary
//! threads at their individual waiting points (`spec.md` §5), rather than a
//! single reactor thread owning one descriptor table, so it is built
//! directly on a single blocking `libc::poll(2)` call per invocation instead
//! of a persistent `mio::Poll` instance.

use crate::error::{Error, Result};
use crate::io::flag::Flag;
use crate::io::readiness::{Awaitable, Readiness};
use std::time::Instant;

/// Waits until at least one of `awaitables` fires, returning which ones did.
///
/// Never returns an all-`false` vector: a poll that wakes with nothing
/// ready (a spurious wakeup, or another thread's event on a shared fd) is
/// silently re-entered, per `spec.md` §4.2 point 5.
pub fn select_ready(awaitables: &[Readiness]) -> Result<Vec<bool>> {
    select_ready_cancellable(awaitables, None)
}

/// As [`select_ready`], but also observes `cancel`. If `cancel`'s flag is
/// set, the call fails immediately with [`Error::cancelled`] instead of
/// returning readiness — this is how thread-context cancellation
/// (`spec.md` §5) surfaces through `select`.
pub fn select_ready_cancellable(
    awaitables: &[Readiness],
    cancel: Option<&Cancellation>,
) -> Result<Vec<bool>> {
    loop {
        let cancel_readiness = cancel.map(|c| c.flag.wait_set_readiness());
        let mut pollfds: Vec<libc::pollfd> = Vec::new();
        let mut slot_pollfd: Vec<Option<usize>> = Vec::with_capacity(awaitables.len() + 1);
        let mut timeout_ms: Option<i32> = None;
        let mut has_always = false;

        let mut push = |r: &Readiness, slot_pollfd: &mut Vec<Option<usize>>| match r {
            Readiness::Always => {
                has_always = true;
                slot_pollfd.push(None);
            }
            Readiness::Timer(deadline) => {
                let remaining_ms = ms_until(*deadline);
                timeout_ms = Some(match timeout_ms {
                    Some(cur) => cur.min(remaining_ms),
                    None => remaining_ms,
                });
                slot_pollfd.push(None);
            }
            Readiness::AwaitReadable(fd) => {
                slot_pollfd.push(Some(pollfds.len()));
                pollfds.push(libc::pollfd {
                    fd: *fd,
                    events: libc::POLLIN,
                    revents: 0,
                });
            }
            Readiness::AwaitWritable(fd) => {
                slot_pollfd.push(Some(pollfds.len()));
                pollfds.push(libc::pollfd {
                    fd: *fd,
                    events: libc::POLLOUT,
                    revents: 0,
                });
            }
        };

        for r in awaitables {
            push(r, &mut slot_pollfd);
        }
        if let Some(r) = &cancel_readiness {
            push(r, &mut slot_pollfd);
        }

        if has_always {
            timeout_ms = Some(0);
        }
        let timeout = timeout_ms.unwrap_or(-1).max(0).min(i32::MAX);
        let timeout = if timeout_ms.is_none() { -1 } else { timeout };

        let rc = unsafe {
            libc::poll(
                pollfds.as_mut_ptr(),
                pollfds.len() as libc::nfds_t,
                timeout,
            )
        };
        if rc < 0 {
            let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
            if errno == libc::EINTR {
                continue;
            }
            return Err(Error::from_errno("poll(2) failed"));
        }

        let now = Instant::now();
        let mut fired = vec![false; slot_pollfd.len()];
        let mut any = false;
        for (i, r) in awaitables.iter().chain(cancel_readiness.iter()).enumerate() {
            let hit = match r {
                Readiness::Always => true,
                Readiness::Timer(deadline) => now >= *deadline,
                Readiness::AwaitReadable(_) | Readiness::AwaitWritable(_) => {
                    let idx = slot_pollfd[i].expect("fd readiness always has a pollfd slot");
                    pollfds[idx].revents != 0
                }
            };
            fired[i] = hit;
            any |= hit;
        }

        if !any {
            continue;
        }

        if let Some(_) = cancel_readiness {
            let cancel_idx = awaitables.len();
            if fired[cancel_idx] {
                return Err(Error::cancelled("select interrupted by cancellation"));
            }
            fired.truncate(awaitables.len());
        }
        return Ok(fired);
    }
}

fn ms_until(deadline: Instant) -> i32 {
    let now = Instant::now();
    if deadline <= now {
        0
    } else {
        (deadline - now).as_millis().min(i32::MAX as u128) as i32
    }
}

/// Waits for a single awaitable and runs its continuation. Since a lone
/// awaitable is guaranteed to eventually fire (`select_ready` never returns
/// all-`false`), this always yields a value rather than an `Option`.
pub fn select1<T>(a: Awaitable<T>) -> Result<T> {
    let fired = select_ready(&[a.readiness()])?;
    debug_assert!(fired[0]);
    a.fire()
}

/// Waits on two differently-typed awaitables, firing whichever's
/// continuation(s) are ready. Mirrors
/// `select(slots_.can_get(), pending_.can_put())` from
/// `examples/original_source/src/lasr/executor.h`.
pub fn select2<A, B>(a: Awaitable<A>, b: Awaitable<B>) -> Result<(Option<A>, Option<B>)> {
    let fired = select_ready(&[a.readiness(), b.readiness()])?;
    let ra = if fired[0] { Some(a.fire()?) } else { None };
    let rb = if fired[1] { Some(b.fire()?) } else { None };
    Ok((ra, rb))
}

/// Three-way variant of [`select2`], for callers that need to wait on a
/// third condition (e.g. an optional deadline) alongside a data-ready and a
/// shutdown-pipe readiness in one poll call.
pub fn select3<A, B, C>(
    a: Awaitable<A>,
    b: Awaitable<B>,
    c: Awaitable<C>,
) -> Result<(Option<A>, Option<B>, Option<C>)> {
    let fired = select_ready(&[a.readiness(), b.readiness(), c.readiness()])?;
    let ra = if fired[0] { Some(a.fire()?) } else { None };
    let rb = if fired[1] { Some(b.fire()?) } else { None };
    let rc = if fired[2] { Some(c.fire()?) } else { None };
    Ok((ra, rb, rc))
}

/// A cooperative cancellation token: `cancel()` from any thread causes any
/// in-flight `select_ready_cancellable` call observing this token to fail
/// with [`Error::cancelled`]. Built on [`Flag`], the same self-pipe
/// primitive used everywhere else a cross-thread signal needs to be
/// select-compatible.
#[derive(Clone)]
pub struct Cancellation {
    flag: Flag,
}

impl Cancellation {
    pub fn new() -> Result<Self> {
        Ok(Cancellation { flag: Flag::new()? })
    }

    pub fn cancel(&self) -> Result<()> {
        self.flag.set()
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.is_set()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn timer_fires_after_deadline() {
        let start = Instant::now();
        let fired = select_ready(&[Readiness::timeout(Duration::from_millis(30))]).unwrap();
        assert_eq!(fired, vec![true]);
        assert!(start.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn always_fires_immediately() {
        let fired = select_ready(&[Readiness::always()]).unwrap();
        assert_eq!(fired, vec![true]);
    }

    #[test]
    fn pipe_readable_vs_timeout() {
        let (r, _w) = crate::io::descriptor::Descriptor::pipe_pair().unwrap();
        let fired = select_ready(&[r.readable(), Readiness::timeout(Duration::from_millis(50))])
            .unwrap();
        assert_eq!(fired, vec![false, true]);
    }

    #[test]
    fn cancellation_interrupts_a_blocked_select() {
        let cancel = Cancellation::new().unwrap();
        let c2 = cancel.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            c2.cancel().unwrap();
        });
        let result = select_ready_cancellable(
            &[Readiness::timeout(Duration::from_secs(5))],
            Some(&cancel),
        );
        assert!(matches!(
            result.unwrap_err().kind(),
            crate::error::ErrorKind::Cancelled
        ));
        handle.join().unwrap();
    }
}

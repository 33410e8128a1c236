//! A fixed-size worker pool fed by a bounded job queue.
//!
//! Grounded on `examples/original_source/src/lasr/executor.h`'s executor,
//! which admits work with `select(slots_.can_get(), pending_.can_put())` so
//! submission never stalls if the queue happens to be momentarily full
//! while a worker is about to free up. This crate's [`crate::io::select`]
//! always fires *every* readiness that is currently true rather than
//! arbitrarily picking one (see `spec.md` §4.2), so the original's
//! direct-handoff-or-enqueue race would double-dispatch a job whenever both
//! paths were ready at once. Submission here is therefore a single bounded
//! blocking enqueue onto `jobs` — the queue's capacity is still the
//! backpressure bound, and workers still drain it behind a `select` against
//! the shutdown flag; see `DESIGN.md` for the full writeup of this
//! deviation.

use crate::config::RuntimeConfig;
use crate::error::Result;
use crate::io::{select2, Flag};
use crate::sync::future::{make_future, Future};
use crate::sync::queue::Queue;
use parking_lot::Mutex;
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send>;

/// A pool of worker threads draining a shared, bounded job queue.
pub struct ThreadPool {
    jobs: Queue<Job>,
    shutdown: Flag,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl ThreadPool {
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let jobs: Queue<Job> = Queue::new(config.queue_capacity())?;
        let shutdown = Flag::new()?;
        let mut workers = Vec::with_capacity(config.worker_threads());
        for index in 0..config.worker_threads() {
            let jobs = jobs.clone();
            let shutdown = shutdown.clone();
            let handle = std::thread::Builder::new()
                .name(format!("flowline-worker-{index}"))
                .spawn(move || worker_loop(jobs, shutdown))
                .map_err(crate::error::Error::from)?;
            workers.push(handle);
        }
        Ok(ThreadPool {
            jobs,
            shutdown,
            workers: Mutex::new(workers),
        })
    }

    /// Enqueues `job`, blocking until the queue has room.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) -> Result<()> {
        self.jobs.put(Box::new(job))
    }

    /// Enqueues a fallible closure, returning a [`Future`] resolved with its
    /// result once a worker runs it.
    pub fn submit_with_result<T>(
        &self,
        f: impl FnOnce() -> Result<T> + Send + 'static,
    ) -> Result<Future<T>>
    where
        T: Send + 'static,
    {
        let (future, promise) = make_future()?;
        self.submit(move || match f() {
            Ok(value) => {
                let _ = promise.set_value(value);
            }
            Err(error) => {
                let _ = promise.set_error(error);
            }
        })?;
        Ok(future)
    }

    /// Signals every worker to stop once its current job finishes, then
    /// joins all of them. Jobs still sitting in the queue when this is
    /// called are never run.
    pub fn shutdown(&self) -> Result<()> {
        self.shutdown.set()?;
        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
        Ok(())
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        let _ = self.shutdown.set();
        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(jobs: Queue<Job>, shutdown: Flag) {
    loop {
        match select2(shutdown.wait_set(), jobs.async_get()) {
            Ok((Some(()), job)) => {
                if let Some(job) = job {
                    job();
                }
                return;
            }
            Ok((None, Some(job))) => job(),
            Ok((None, None)) => continue,
            Err(_) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_a_submitted_job() {
        let pool = ThreadPool::new(&RuntimeConfig::new().with_worker_threads(2)).unwrap();
        let future = pool
            .submit_with_result(|| Ok::<_, crate::error::Error>(2 + 2))
            .unwrap();
        assert_eq!(future.get().unwrap(), 4);
        pool.shutdown().unwrap();
    }

    #[test]
    fn runs_many_jobs_across_workers() {
        let pool = ThreadPool::new(
            &RuntimeConfig::new()
                .with_worker_threads(4)
                .with_queue_capacity(8),
        )
        .unwrap();
        let futures: Vec<_> = (0..20)
            .map(|i| pool.submit_with_result(move || Ok::<_, crate::error::Error>(i * 2)).unwrap())
            .collect();
        let results: Vec<i32> = futures.into_iter().map(|f| f.get().unwrap()).collect();
        assert_eq!(results.iter().sum::<i32>(), (0..20).map(|i| i * 2).sum());
        pool.shutdown().unwrap();
    }

    #[test]
    fn propagates_job_errors() {
        let pool = ThreadPool::new(&RuntimeConfig::new().with_worker_threads(1)).unwrap();
        let future =
            pool.submit_with_result(|| Err::<i32, _>(crate::error::Error::unavailable("nope"))).unwrap();
        let err = future.get().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Unavailable);
        pool.shutdown().unwrap();
    }
}

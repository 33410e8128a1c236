//! The concurrency core: futures/promises, a bounded queue, a worker pool,
//! and quiescent teardown, all built on [`crate::io`]'s descriptor/select
//! primitives rather than a separate async runtime.

pub mod future;
pub mod queue;
pub mod thread_pool;
pub mod usage_lock;

pub use future::{make_future, Future, Promise};
pub use queue::Queue;
pub use thread_pool::ThreadPool;
pub use usage_lock::{Usage, UsageLock};

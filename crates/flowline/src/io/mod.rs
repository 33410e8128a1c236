//! POSIX descriptor handling, readiness, `select`, and the self-pipe `Flag`.
//!
//! Layout follows `ash`'s split between a raw descriptor layer and the
//! readiness/waiting layer built atop it
//! (`examples/original_source/include/ash/posix/io.h`).

pub mod descriptor;
pub mod flag;
pub mod readiness;
pub mod select;

pub use descriptor::{Descriptor, OpenMode};
pub use flag::Flag;
pub use readiness::{Awaitable, Readiness};
pub use select::{select1, select2, select3, select_ready, select_ready_cancellable, Cancellation};

//! The interruptible connection used by both the server's accepted
//! connections and the client's outbound connection (`spec.md` §4.9).

pub mod connection;

pub use connection::{Connection, ConnectionState};

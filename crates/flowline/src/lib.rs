//! flowline: a same-process and cross-process RPC runtime built around a
//! custom binary wire codec.
//!
//! ```text
//!  rpc::{RpcClient, RpcServer, ServiceRegistry}   <- request/reply dispatch
//!          |
//!  packet::{serial_line, protected_stream}        <- framing (COBS+MAC, or length-prefixed)
//!          |
//!  codec::{Encode, Decode, Fingerprint}            <- the wire format
//!          |
//!  transport::Connection                           <- self-pipe-interruptible I/O
//!          |
//!  io::{Descriptor, select, Flag}   sync::{Future, Queue, ThreadPool}
//! ```
//!
//! Every layer only ever blocks at the suspension points `select` exposes
//! (a descriptor becoming ready, a deadline, or a `Flag`); there is no
//! hidden async runtime underneath any of it.
//!
//! # Quick start
//!
//! ```no_run
//! use flowline::codec::endian::{LittleEndianDecoder, LittleEndianEncoder};
//! use flowline::codec::{Decode, Encode};
//!
//! let mut enc = LittleEndianEncoder::new();
//! 42i32.encode(&mut enc).unwrap();
//! let mut dec = LittleEndianDecoder::new(enc.bytes());
//! assert_eq!(i32::decode(&mut dec).unwrap(), 42);
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod io;
pub mod packet;
pub mod rpc;
pub mod sync;
pub mod transport;

pub use config::RuntimeConfig;
pub use error::{Error, ErrorKind, Result};

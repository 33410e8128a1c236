//! Request-reply RPC built directly on the packet protocols and the wire
//! codec: no macro codegen, just the dispatch contract `spec.md` §1/§6 leave
//! as the seam a generated proxy/stub pair would normally fill.

pub mod client;
pub mod registry;
pub mod server;
pub mod types;

pub use client::RpcClient;
pub use registry::{ServiceObject, ServiceRegistry};
pub use server::RpcServer;
pub use types::{EncodedPayload, ReplyStatus, RequestHeader};

use crate::error::Result;
use crate::packet::mac::MacKey;
use crate::packet::{protected_stream, serial_line, PacketStream};

/// Which packet framing carries RPC messages over a given stream
/// (`spec.md` §4.8): a serial line needs MAC + COBS framing and a NUL
/// terminator; an already reliable, ordered transport only needs a length
/// prefix.
pub enum Framing {
    SerialLine(MacKey),
    ProtectedStream,
}

impl Framing {
    pub fn send<S: PacketStream + ?Sized>(&self, stream: &S, payload: &[u8]) -> Result<()> {
        match self {
            Framing::SerialLine(key) => serial_line::send(stream, key, payload),
            Framing::ProtectedStream => protected_stream::send(stream, payload),
        }
    }

    pub fn receive<S: PacketStream + ?Sized>(
        &self,
        stream: &S,
        max_packet_size: usize,
    ) -> Result<Vec<u8>> {
        match self {
            Framing::SerialLine(key) => serial_line::receive(stream, key, max_packet_size),
            Framing::ProtectedStream => protected_stream::receive(stream, max_packet_size),
        }
    }
}

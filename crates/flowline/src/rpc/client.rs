//! The RPC client half: encodes a request, frames it onto a stream, and
//! decodes the status-tagged reply.
//!
//! Grounded on `hdds::rpc`'s client-side call shape
//! (`examples/hdds-team-hdds/crates/hdds/src/rpc/mod.rs`), adapted from
//! `hdds`'s DDS-request/reply correlation to the simpler one-call-at-a-time
//! shape `spec.md` §6 describes (no concurrent-call multiplexing over a
//! single stream — one `RpcClient` serves one in-flight call at a time).

use super::types::{ReplyStatus, RequestHeader};
use super::Framing;
use crate::codec::endian::{LittleEndianDecoder, LittleEndianEncoder};
use crate::codec::{Decode, Encode};
use crate::error::{Error, ErrorKind, Result};
use crate::packet::PacketStream;

pub struct RpcClient<'s, S: PacketStream + ?Sized> {
    stream: &'s S,
    framing: Framing,
    max_packet_size: usize,
}

impl<'s, S: PacketStream + ?Sized> RpcClient<'s, S> {
    pub fn new(stream: &'s S, framing: Framing, max_packet_size: usize) -> Self {
        RpcClient { stream, framing, max_packet_size }
    }

    /// Calls `method_ordinal` on the object registered as `object_name`,
    /// writing `args` as the request's argument tuple. On an `ok` reply,
    /// decodes and returns `Resp`; on an `error` reply, reconstructs an
    /// [`Error`] from the wire's portable error class name and message.
    pub fn call<Args: Encode, Resp: Decode>(
        &self,
        object_name: &str,
        method_ordinal: u32,
        args: &Args,
    ) -> Result<Resp> {
        let mut enc = LittleEndianEncoder::new();
        let header = RequestHeader {
            object_name: object_name.to_string(),
            method_ordinal,
        };
        header.write(&mut enc)?;
        args.encode(&mut enc)?;
        self.framing.send(self.stream, enc.bytes())?;

        let reply_bytes = self.framing.receive(self.stream, self.max_packet_size)?;
        let mut dec = LittleEndianDecoder::new(&reply_bytes);
        match ReplyStatus::read(&mut dec)? {
            ReplyStatus::Ok => Resp::decode(&mut dec),
            ReplyStatus::Error => {
                let error_class_name = String::decode(&mut dec)?;
                let message = String::decode(&mut dec)?;
                Err(Error::new(ErrorKind::from_portable_name(&error_class_name), message))
            }
        }
    }
}

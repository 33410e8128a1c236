//! The RPC server half: reads one framed request, dispatches it through the
//! [`ServiceRegistry`], and writes back a status-tagged reply.
//!
//! Grounded on `hdds::rpc`'s server-side dispatch loop
//! (`examples/hdds-team-hdds/crates/hdds/src/rpc/mod.rs`): look the target
//! object up by name, hand the decoder to its `dispatch`, wrap whatever
//! comes back (or whatever error it raises) in the reply envelope.

use super::registry::ServiceRegistry;
use super::types::{ReplyStatus, RequestHeader};
use super::Framing;
use crate::codec::endian::{LittleEndianDecoder, LittleEndianEncoder};
use crate::codec::{Encode, Encoder};
use crate::error::Result;
use crate::packet::PacketStream;

pub struct RpcServer<'s, S: PacketStream + ?Sized> {
    stream: &'s S,
    framing: Framing,
    max_packet_size: usize,
    registry: &'s ServiceRegistry,
}

impl<'s, S: PacketStream + ?Sized> RpcServer<'s, S> {
    /// Serves requests against the process-wide [`ServiceRegistry::global`].
    pub fn new(stream: &'s S, framing: Framing, max_packet_size: usize) -> Self {
        RpcServer::with_registry(stream, framing, max_packet_size, ServiceRegistry::global())
    }

    /// Serves requests against a specific registry, for tests and for
    /// processes that keep more than one isolated object namespace.
    pub fn with_registry(
        stream: &'s S,
        framing: Framing,
        max_packet_size: usize,
        registry: &'s ServiceRegistry,
    ) -> Self {
        RpcServer { stream, framing, max_packet_size, registry }
    }

    /// Services exactly one request: blocks until one arrives, dispatches
    /// it, and writes exactly one reply before returning. Callers loop this
    /// — typically handed to a [`crate::sync::ThreadPool`] worker, one
    /// `serve_one` call per iteration, one connection per thread.
    pub fn serve_one(&self) -> Result<()> {
        let request_bytes = self.framing.receive(self.stream, self.max_packet_size)?;
        let mut dec = LittleEndianDecoder::new(&request_bytes);
        let header = RequestHeader::read(&mut dec)?;

        let mut enc = LittleEndianEncoder::new();
        match self
            .registry
            .lookup(&header.object_name)
            .and_then(|object| object.dispatch(header.method_ordinal, &mut dec))
        {
            Ok(payload) => {
                ReplyStatus::Ok.write(&mut enc)?;
                enc.write_bytes(&payload)?;
            }
            Err(error) => {
                crate::warn_log!(
                    "RPC dispatch failed for {}#{}: {}",
                    header.object_name,
                    header.method_ordinal,
                    error
                );
                ReplyStatus::Error.write(&mut enc)?;
                error.kind().portable_name().to_string().encode(&mut enc)?;
                error.message().to_string().encode(&mut enc)?;
            }
        }
        self.framing.send(self.stream, enc.bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::registry::ServiceObject;
    use crate::rpc::EncodedPayload;
    use crate::error::Error;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MemoryStream {
        buf: Mutex<VecDeque<u8>>,
    }

    impl PacketStream for MemoryStream {
        fn write_chunk(&self, buf: &[u8]) -> Result<usize> {
            self.buf.lock().unwrap().extend(buf.iter().copied());
            Ok(buf.len())
        }
        fn read_chunk(&self, buf: &mut [u8]) -> Result<usize> {
            let mut q = self.buf.lock().unwrap();
            if q.is_empty() {
                return Err(Error::eof("no more bytes"));
            }
            let n = buf.len().min(q.len());
            for slot in buf.iter_mut().take(n) {
                *slot = q.pop_front().unwrap();
            }
            Ok(n)
        }
    }

    struct AlwaysFails;
    impl ServiceObject for AlwaysFails {
        fn dispatch(&self, _ordinal: u32, _decoder: &mut dyn crate::codec::Decoder) -> Result<EncodedPayload> {
            Err(Error::unavailable("object is not ready"))
        }
    }

    #[test]
    fn unregistered_object_name_yields_an_error_reply() {
        let stream = MemoryStream::default();
        let registry = ServiceRegistry::default();

        let mut request = LittleEndianEncoder::new();
        RequestHeader { object_name: "Ghost".to_string(), method_ordinal: 0 }
            .write(&mut request)
            .unwrap();
        protected_stream_send(&stream, request.bytes());

        let server = RpcServer::with_registry(&stream, super::Framing::ProtectedStream, 1 << 16, &registry);
        server.serve_one().unwrap();

        let reply = protected_stream_receive(&stream);
        let mut dec = LittleEndianDecoder::new(&reply);
        assert_eq!(ReplyStatus::read(&mut dec).unwrap(), ReplyStatus::Error);
        assert_eq!(String::decode(&mut dec).unwrap(), "key-error");
    }

    #[test]
    fn a_failing_service_object_still_yields_a_well_formed_reply() {
        let stream = MemoryStream::default();
        let registry = ServiceRegistry::default();
        registry.register("Broken", Arc::new(AlwaysFails));

        let mut request = LittleEndianEncoder::new();
        RequestHeader { object_name: "Broken".to_string(), method_ordinal: 7 }
            .write(&mut request)
            .unwrap();
        protected_stream_send(&stream, request.bytes());

        let server = RpcServer::with_registry(&stream, super::Framing::ProtectedStream, 1 << 16, &registry);
        server.serve_one().unwrap();

        let reply = protected_stream_receive(&stream);
        let mut dec = LittleEndianDecoder::new(&reply);
        assert_eq!(ReplyStatus::read(&mut dec).unwrap(), ReplyStatus::Error);
        assert_eq!(String::decode(&mut dec).unwrap(), "unavailable");
        assert_eq!(String::decode(&mut dec).unwrap(), "object is not ready");
    }

    use crate::codec::Decode;

    fn protected_stream_send(stream: &MemoryStream, payload: &[u8]) {
        crate::packet::protected_stream::send(stream, payload).unwrap();
    }

    fn protected_stream_receive(stream: &MemoryStream) -> Vec<u8> {
        crate::packet::protected_stream::receive(stream, 1 << 16).unwrap()
    }
}

//! Protected-stream packet framing: a varint length prefix followed by the
//! payload bytes, for a transport that already guarantees reliable,
//! in-order delivery (e.g. TCP) and so needs no zero-byte escaping
//! (`spec.md` §4.8). The length prefix is a plain varint regardless of
//! which binary encoder endianness the caller chose for the payload itself
//! — varint's continuation-bit encoding has no byte-order variant to
//! select.

use super::PacketStream;
use crate::codec::varint;
use crate::error::{Error, Result};

pub fn send<S: PacketStream + ?Sized>(stream: &S, payload: &[u8]) -> Result<()> {
    let mut len_prefix = Vec::new();
    varint::write_varint(&mut len_prefix, payload.len() as u64);
    stream.write_all(&len_prefix)?;
    stream.write_all(payload)?;
    stream.flush()
}

pub fn receive<S: PacketStream + ?Sized>(stream: &S, max_packet_size: usize) -> Result<Vec<u8>> {
    let len = varint::read_varint(|| stream.read_byte())? as usize;
    if len > max_packet_size {
        return Err(Error::out_of_range(
            "protected-stream packet length exceeds the configured maximum",
        ));
    }
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload)?;
    Ok(payload)
}

//! Serial-line packet framing: `MAC(payload)` then COBS-stuffed then a NUL
//! terminator, so a byte stream with no inherent framing (a UART) can still
//! carry discrete packets (`spec.md` §4.8).

use super::cobs;
use super::mac::{self, MacKey};
use super::PacketStream;
use crate::error::{Error, Result};

/// MAC-encodes, COBS-encodes, writes the frame, writes a trailing `\0`,
/// then flushes.
pub fn send<S: PacketStream + ?Sized>(stream: &S, key: &MacKey, payload: &[u8]) -> Result<()> {
    let maced = mac::encode(key, payload);
    let framed = cobs::encode(&maced);
    stream.write_all(&framed)?;
    stream.write_all(&[0u8])?;
    stream.flush()
}

/// Reads up to the next `\0`, COBS-decodes, then MAC-decodes. Fails with
/// `out-of-range` if a frame grows past `max_packet_size` before its
/// terminator appears.
pub fn receive<S: PacketStream + ?Sized>(
    stream: &S,
    key: &MacKey,
    max_packet_size: usize,
) -> Result<Vec<u8>> {
    let mut framed = Vec::new();
    loop {
        let byte = stream.read_byte()?;
        if byte == 0 {
            break;
        }
        if framed.len() >= max_packet_size {
            return Err(Error::out_of_range(
                "serial-line packet exceeded the configured maximum size",
            ));
        }
        framed.push(byte);
    }
    let maced = cobs::decode(&framed)?;
    mac::decode(key, &maced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct MemoryStream {
        buf: RefCell<std::collections::VecDeque<u8>>,
    }

    impl MemoryStream {
        fn new() -> Self {
            MemoryStream { buf: RefCell::new(std::collections::VecDeque::new()) }
        }
    }

    impl PacketStream for MemoryStream {
        fn write_chunk(&self, buf: &[u8]) -> Result<usize> {
            self.buf.borrow_mut().extend(buf.iter().copied());
            Ok(buf.len())
        }

        fn read_chunk(&self, buf: &mut [u8]) -> Result<usize> {
            let mut b = self.buf.borrow_mut();
            if b.is_empty() {
                return Err(Error::eof("no more bytes"));
            }
            let n = buf.len().min(b.len());
            for slot in buf.iter_mut().take(n) {
                *slot = b.pop_front().unwrap();
            }
            Ok(n)
        }
    }

    #[test]
    fn round_trips_a_packet() {
        let stream = MemoryStream::new();
        let key = MacKey::default();
        send(&stream, &key, b"hello over the wire").unwrap();
        let received = receive(&stream, &key, 1024).unwrap();
        assert_eq!(received, b"hello over the wire");
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let stream = MemoryStream::new();
        let key = MacKey::default();
        send(&stream, &key, &vec![1u8; 100]).unwrap();
        let err = receive(&stream, &key, 4).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::OutOfRange);
    }

    #[test]
    fn two_packets_back_to_back() {
        let stream = MemoryStream::new();
        let key = MacKey::default();
        send(&stream, &key, b"first").unwrap();
        send(&stream, &key, b"second").unwrap();
        assert_eq!(receive(&stream, &key, 1024).unwrap(), b"first");
        assert_eq!(receive(&stream, &key, 1024).unwrap(), b"second");
    }
}

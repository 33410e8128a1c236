//! Packet codecs (MAC, COBS) and the two packet framing protocols built on
//! top of them. See `spec.md` §4.7–§4.8.

pub mod cobs;
pub mod mac;
pub mod protected_stream;
pub mod serial_line;

pub use mac::MacKey;

use crate::error::{Error, Result};
use crate::io::Descriptor;

/// The stream abstraction packet protocols are polymorphic over
/// (`spec.md` §4.8: "either protocol is polymorphic over the underlying
/// `input_stream`/`output_stream` abstraction"). Implemented directly by
/// [`Descriptor`] and by [`crate::transport::Connection`].
pub trait PacketStream {
    fn write_chunk(&self, buf: &[u8]) -> Result<usize>;
    fn read_chunk(&self, buf: &mut [u8]) -> Result<usize>;

    /// Flushing is a no-op for every stream this crate talks to directly
    /// (raw descriptors, connections) — there is no userspace buffering to
    /// push out. Kept as a method so a buffered stream adapter could
    /// override it.
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn write_all(&self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            let n = self.write_chunk(buf)?;
            if n == 0 {
                return Err(Error::io_error("write_chunk returned zero bytes", 0));
            }
            buf = &buf[n..];
        }
        Ok(())
    }

    fn read_exact(&self, mut buf: &mut [u8]) -> Result<()> {
        while !buf.is_empty() {
            let n = self.read_chunk(buf)?;
            if n == 0 {
                return Err(Error::eof("stream closed mid-read"));
            }
            buf = &mut buf[n..];
        }
        Ok(())
    }

    fn read_byte(&self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.read_exact(&mut b)?;
        Ok(b[0])
    }
}

impl PacketStream for Descriptor {
    fn write_chunk(&self, buf: &[u8]) -> Result<usize> {
        self.write(buf)
    }

    fn read_chunk(&self, buf: &mut [u8]) -> Result<usize> {
        self.read(buf)
    }
}

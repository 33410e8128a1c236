//! Little-endian, big-endian, and size-only codec backends.
//!
//! Grounded on `lasr::binary_codecs` (`examples/original_source/src/lasr/binary_codecs.cpp`):
//! `binary_encoder<Impl, Output, IsBigEndian>` parameterizes a shared set of
//! write rules over byte order and an output sink; `binary_sizer` reuses the
//! exact same rules over a sink that only counts bytes. Rust has no
//! template parameter for "big-endian or not", so the same split is
//! expressed as three concrete structs behind one `Encoder` trait, with the
//! byte-order-dependent primitives implemented once as trait default
//! methods driven by `is_big_endian()`.

use crate::error::{Error, Result};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use super::varint;

/// Per-top-level-call bookkeeping an [`Encoder`] needs for shared pointers
/// (`spec.md` §4.6 "seen-object table") and dynamic records (portable class
/// name → id).
#[derive(Default)]
pub struct EncodeTables {
    shared_by_ptr: HashMap<usize, u64>,
    next_shared_id: u64,
    class_id_by_name: HashMap<&'static str, u64>,
    next_class_id: u64,
}

impl EncodeTables {
    /// Returns `(id, is_first_occurrence)` for the shared pointer identified
    /// by `ptr`, assigning a fresh id starting at 1 the first time it is
    /// seen in this call.
    pub fn assign_shared_id(&mut self, ptr: usize) -> (u64, bool) {
        if let Some(&id) = self.shared_by_ptr.get(&ptr) {
            return (id, false);
        }
        self.next_shared_id += 1;
        let id = self.next_shared_id;
        self.shared_by_ptr.insert(ptr, id);
        (id, true)
    }

    /// Returns `(id, is_first_occurrence)` for a dynamic record's portable
    /// class name.
    pub fn assign_class_id(&mut self, name: &'static str) -> (u64, bool) {
        if let Some(&id) = self.class_id_by_name.get(name) {
            return (id, false);
        }
        self.next_class_id += 1;
        let id = self.next_class_id;
        self.class_id_by_name.insert(name, id);
        (id, true)
    }
}

/// Byte-sink side of the codec, implemented once per byte order.
pub trait Encoder {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;
    fn is_big_endian(&self) -> bool;
    fn tables_mut(&mut self) -> &mut EncodeTables;

    fn write_bool(&mut self, v: bool) -> Result<()> {
        self.write_bytes(&[v as u8])
    }
    fn write_u8(&mut self, v: u8) -> Result<()> {
        self.write_bytes(&[v])
    }
    fn write_i8(&mut self, v: i8) -> Result<()> {
        self.write_bytes(&[v as u8])
    }
    fn write_u16(&mut self, v: u16) -> Result<()> {
        let b = if self.is_big_endian() { v.to_be_bytes() } else { v.to_le_bytes() };
        self.write_bytes(&b)
    }
    fn write_i16(&mut self, v: i16) -> Result<()> {
        self.write_u16(v as u16)
    }
    fn write_u32(&mut self, v: u32) -> Result<()> {
        let b = if self.is_big_endian() { v.to_be_bytes() } else { v.to_le_bytes() };
        self.write_bytes(&b)
    }
    fn write_i32(&mut self, v: i32) -> Result<()> {
        self.write_u32(v as u32)
    }
    fn write_u64(&mut self, v: u64) -> Result<()> {
        let b = if self.is_big_endian() { v.to_be_bytes() } else { v.to_le_bytes() };
        self.write_bytes(&b)
    }
    fn write_i64(&mut self, v: i64) -> Result<()> {
        self.write_u64(v as u64)
    }
    fn write_f32(&mut self, v: f32) -> Result<()> {
        self.write_u32(v.to_bits())
    }
    fn write_f64(&mut self, v: f64) -> Result<()> {
        self.write_u64(v.to_bits())
    }
    fn write_varint(&mut self, value: u64) -> Result<()> {
        let mut buf = Vec::new();
        varint::write_varint(&mut buf, value);
        self.write_bytes(&buf)
    }
}

/// Byte-source side of the codec.
pub trait Decoder {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()>;
    fn is_big_endian(&self) -> bool;
    fn shared_table_mut(&mut self) -> &mut HashMap<u64, Arc<dyn Any + Send + Sync>>;
    fn class_table_mut(&mut self) -> &mut HashMap<u64, String>;

    fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }
    fn read_u8(&mut self) -> Result<u8> {
        let mut b = [0u8; 1];
        self.read_exact(&mut b)?;
        Ok(b[0])
    }
    fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }
    fn read_u16(&mut self) -> Result<u16> {
        let mut b = [0u8; 2];
        self.read_exact(&mut b)?;
        Ok(if self.is_big_endian() { u16::from_be_bytes(b) } else { u16::from_le_bytes(b) })
    }
    fn read_i16(&mut self) -> Result<i16> {
        Ok(self.read_u16()? as i16)
    }
    fn read_u32(&mut self) -> Result<u32> {
        let mut b = [0u8; 4];
        self.read_exact(&mut b)?;
        Ok(if self.is_big_endian() { u32::from_be_bytes(b) } else { u32::from_le_bytes(b) })
    }
    fn read_i32(&mut self) -> Result<i32> {
        Ok(self.read_u32()? as i32)
    }
    fn read_u64(&mut self) -> Result<u64> {
        let mut b = [0u8; 8];
        self.read_exact(&mut b)?;
        Ok(if self.is_big_endian() { u64::from_be_bytes(b) } else { u64::from_le_bytes(b) })
    }
    fn read_i64(&mut self) -> Result<i64> {
        Ok(self.read_u64()? as i64)
    }
    fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }
    fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }
    fn read_varint(&mut self) -> Result<u64> {
        varint::read_varint(|| self.read_u8())
    }
}

macro_rules! byte_buf_encoder {
    ($name:ident, $is_big_endian:expr) => {
        #[derive(Default)]
        pub struct $name {
            buf: Vec<u8>,
            tables: EncodeTables,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn into_bytes(self) -> Vec<u8> {
                self.buf
            }

            pub fn bytes(&self) -> &[u8] {
                &self.buf
            }
        }

        impl Encoder for $name {
            fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
                self.buf.extend_from_slice(bytes);
                Ok(())
            }

            fn is_big_endian(&self) -> bool {
                $is_big_endian
            }

            fn tables_mut(&mut self) -> &mut EncodeTables {
                &mut self.tables
            }
        }
    };
}

byte_buf_encoder!(LittleEndianEncoder, false);
byte_buf_encoder!(BigEndianEncoder, true);

/// Counts bytes without allocating a payload buffer; grounded on
/// `lasr::binary_sizer`. Used to pre-size a buffer before the real encode
/// pass, or to bound a packet to [`crate::config::RuntimeConfig::max_packet_size`]
/// before committing to writing it.
#[derive(Default)]
pub struct SizeEncoder {
    size: usize,
    tables: EncodeTables,
}

impl SizeEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl Encoder for SizeEncoder {
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.size += bytes.len();
        Ok(())
    }

    fn is_big_endian(&self) -> bool {
        false
    }

    fn tables_mut(&mut self) -> &mut EncodeTables {
        &mut self.tables
    }
}

macro_rules! slice_decoder {
    ($name:ident, $is_big_endian:expr) => {
        pub struct $name<'a> {
            bytes: &'a [u8],
            pos: usize,
            shared: HashMap<u64, Arc<dyn Any + Send + Sync>>,
            classes: HashMap<u64, String>,
        }

        impl<'a> $name<'a> {
            pub fn new(bytes: &'a [u8]) -> Self {
                $name {
                    bytes,
                    pos: 0,
                    shared: HashMap::new(),
                    classes: HashMap::new(),
                }
            }

            pub fn position(&self) -> usize {
                self.pos
            }

            pub fn remaining(&self) -> usize {
                self.bytes.len() - self.pos
            }
        }

        impl<'a> Decoder for $name<'a> {
            fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
                if self.remaining() < buf.len() {
                    return Err(Error::eof("decoder ran out of input"));
                }
                buf.copy_from_slice(&self.bytes[self.pos..self.pos + buf.len()]);
                self.pos += buf.len();
                Ok(())
            }

            fn is_big_endian(&self) -> bool {
                $is_big_endian
            }

            fn shared_table_mut(&mut self) -> &mut HashMap<u64, Arc<dyn Any + Send + Sync>> {
                &mut self.shared
            }

            fn class_table_mut(&mut self) -> &mut HashMap<u64, String> {
                &mut self.classes
            }
        }
    };
}

slice_decoder!(LittleEndianDecoder, false);
slice_decoder!(BigEndianDecoder, true);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_endian_u32_round_trips() {
        let mut enc = LittleEndianEncoder::new();
        enc.write_u32(0x01020304).unwrap();
        assert_eq!(enc.bytes(), &[0x04, 0x03, 0x02, 0x01]);
        let mut dec = LittleEndianDecoder::new(enc.bytes());
        assert_eq!(dec.read_u32().unwrap(), 0x01020304);
    }

    #[test]
    fn big_endian_u32_round_trips() {
        let mut enc = BigEndianEncoder::new();
        enc.write_u32(0x01020304).unwrap();
        assert_eq!(enc.bytes(), &[0x01, 0x02, 0x03, 0x04]);
        let mut dec = BigEndianDecoder::new(enc.bytes());
        assert_eq!(dec.read_u32().unwrap(), 0x01020304);
    }

    #[test]
    fn sizer_never_allocates_a_payload() {
        let mut sizer = SizeEncoder::new();
        sizer.write_u64(1).unwrap();
        sizer.write_varint(300).unwrap();
        assert_eq!(sizer.size(), 8 + 2);
    }

    #[test]
    fn decoder_reports_eof_past_the_end() {
        let mut dec = LittleEndianDecoder::new(&[1, 2]);
        assert!(dec.read_u32().is_err());
    }

    #[test]
    fn float_round_trips_bit_for_bit() {
        let mut enc = LittleEndianEncoder::new();
        enc.write_f64(std::f64::consts::PI).unwrap();
        let mut dec = LittleEndianDecoder::new(enc.bytes());
        assert_eq!(dec.read_f64().unwrap(), std::f64::consts::PI);
    }
}

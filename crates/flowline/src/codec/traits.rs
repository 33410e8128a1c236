//! `Encode`/`Decode`: the per-type wire rules from `spec.md` §4.6, built on
//! top of the byte-order-agnostic [`super::endian::Encoder`]/[`super::endian::Decoder`]
//! primitives. Every impl here corresponds to one bullet of that section;
//! see each impl's doc comment for which.

use super::endian::{Decoder, Encoder};
use super::fingerprint::{Fingerprint, WireChar};
use crate::error::{Error, Result};
use std::sync::{Arc, Weak};

/// A type whose values can be written to an [`Encoder`]. Requires
/// [`Fingerprint`] because every top-level `encode` call is preceded by the
/// type's schema hash (`spec.md` §4.6 "Schema hash").
pub trait Encode: Fingerprint {
    fn encode(&self, enc: &mut dyn Encoder) -> Result<()>;
}

/// A type whose values can be read back from a [`Decoder`].
pub trait Decode: Fingerprint + Sized {
    fn decode(dec: &mut dyn Decoder) -> Result<Self>;
}

/// Writes the schema fingerprint of `T` in `enc`'s byte order, then `value`.
/// This is the top-level call boundary `spec.md` §4.6 describes; nested
/// fields never re-emit the fingerprint.
pub fn encode_with_fingerprint<T: Encode>(value: &T, enc: &mut dyn Encoder) -> Result<()> {
    enc.write_u32(super::fingerprint::fingerprint_of::<T>())?;
    value.encode(enc)
}

/// Reads a schema fingerprint and checks it against `T`'s before decoding
/// the payload, failing fast with `data-mismatch` on any disagreement.
pub fn decode_with_fingerprint<T: Decode>(dec: &mut dyn Decoder) -> Result<T> {
    let wire_fingerprint = dec.read_u32()?;
    let expected = super::fingerprint::fingerprint_of::<T>();
    if wire_fingerprint != expected {
        return Err(Error::data_mismatch(format!(
            "schema fingerprint mismatch: wire {wire_fingerprint:#010x}, expected {expected:#010x}"
        )));
    }
    T::decode(dec)
}

macro_rules! impl_scalar_codec {
    ($($t:ty => $w:ident, $r:ident;)*) => {
        $(
            impl Encode for $t {
                fn encode(&self, enc: &mut dyn Encoder) -> Result<()> {
                    enc.$w(*self)
                }
            }
            impl Decode for $t {
                fn decode(dec: &mut dyn Decoder) -> Result<Self> {
                    dec.$r()
                }
            }
        )*
    };
}

impl_scalar_codec! {
    bool => write_bool, read_bool;
    u8 => write_u8, read_u8;
    u16 => write_u16, read_u16;
    u32 => write_u32, read_u32;
    u64 => write_u64, read_u64;
    i8 => write_i8, read_i8;
    i16 => write_i16, read_i16;
    i32 => write_i32, read_i32;
    i64 => write_i64, read_i64;
    f32 => write_f32, read_f32;
    f64 => write_f64, read_f64;
}

/// `char`: one byte, endianness-independent (`spec.md` §4.6).
impl Encode for WireChar {
    fn encode(&self, enc: &mut dyn Encoder) -> Result<()> {
        enc.write_bytes(&[self.0])
    }
}
impl Decode for WireChar {
    fn decode(dec: &mut dyn Decoder) -> Result<Self> {
        let mut b = [0u8; 1];
        dec.read_exact(&mut b)?;
        Ok(WireChar(b[0]))
    }
}

/// Sequence with dynamic size: varint length, then elements.
impl Encode for String {
    fn encode(&self, enc: &mut dyn Encoder) -> Result<()> {
        enc.write_varint(self.len() as u64)?;
        enc.write_bytes(self.as_bytes())
    }
}
impl Decode for String {
    fn decode(dec: &mut dyn Decoder) -> Result<Self> {
        let len = dec.read_varint()? as usize;
        let mut buf = vec![0u8; len];
        dec.read_exact(&mut buf)?;
        String::from_utf8(buf).map_err(|_| Error::data_mismatch("decoded string was not valid UTF-8"))
    }
}

/// Sequence with dynamic size.
impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, enc: &mut dyn Encoder) -> Result<()> {
        enc.write_varint(self.len() as u64)?;
        for item in self {
            item.encode(enc)?;
        }
        Ok(())
    }
}
impl<T: Decode> Decode for Vec<T> {
    fn decode(dec: &mut dyn Decoder) -> Result<Self> {
        let len = dec.read_varint()? as usize;
        let mut out = Vec::with_capacity(len.min(1 << 20));
        for _ in 0..len {
            out.push(T::decode(dec)?);
        }
        Ok(out)
    }
}

/// Ordered associative set: varint length, then elements in ascending key
/// order (`BTreeSet`'s iteration order), so the wire form is deterministic.
impl<T: Encode> Encode for std::collections::BTreeSet<T> {
    fn encode(&self, enc: &mut dyn Encoder) -> Result<()> {
        enc.write_varint(self.len() as u64)?;
        for item in self {
            item.encode(enc)?;
        }
        Ok(())
    }
}
impl<T: Decode + Ord> Decode for std::collections::BTreeSet<T> {
    fn decode(dec: &mut dyn Decoder) -> Result<Self> {
        let len = dec.read_varint()? as usize;
        let mut out = std::collections::BTreeSet::new();
        for _ in 0..len {
            out.insert(T::decode(dec)?);
        }
        Ok(out)
    }
}

/// Ordered associative map: varint length, then key/value pairs in
/// ascending key order.
impl<K: Encode, V: Encode> Encode for std::collections::BTreeMap<K, V> {
    fn encode(&self, enc: &mut dyn Encoder) -> Result<()> {
        enc.write_varint(self.len() as u64)?;
        for (key, value) in self {
            key.encode(enc)?;
            value.encode(enc)?;
        }
        Ok(())
    }
}
impl<K: Decode + Ord, V: Decode> Decode for std::collections::BTreeMap<K, V> {
    fn decode(dec: &mut dyn Decoder) -> Result<Self> {
        let len = dec.read_varint()? as usize;
        let mut out = std::collections::BTreeMap::new();
        for _ in 0..len {
            let key = K::decode(dec)?;
            let value = V::decode(dec)?;
            out.insert(key, value);
        }
        Ok(out)
    }
}

/// Sequence with static size N: N elements back to back, no length prefix.
impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode(&self, enc: &mut dyn Encoder) -> Result<()> {
        for item in self {
            item.encode(enc)?;
        }
        Ok(())
    }
}
impl<T: Decode, const N: usize> Decode for [T; N] {
    fn decode(dec: &mut dyn Decoder) -> Result<Self> {
        let items: Vec<T> = (0..N).map(|_| T::decode(dec)).collect::<Result<_>>()?;
        items
            .try_into()
            .map_err(|_| Error::invalid_state("static array length mismatch during decode"))
    }
}

/// Optional: one presence byte, payload follows if set.
impl<T: Encode> Encode for Option<T> {
    fn encode(&self, enc: &mut dyn Encoder) -> Result<()> {
        match self {
            Some(value) => {
                enc.write_bool(true)?;
                value.encode(enc)
            }
            None => enc.write_bool(false),
        }
    }
}
impl<T: Decode> Decode for Option<T> {
    fn decode(dec: &mut dyn Decoder) -> Result<Self> {
        if dec.read_bool()? {
            Ok(Some(T::decode(dec)?))
        } else {
            Ok(None)
        }
    }
}

/// Pair: elements concatenated in declaration order, no length prefix.
impl<U: Encode, V: Encode> Encode for (U, V) {
    fn encode(&self, enc: &mut dyn Encoder) -> Result<()> {
        self.0.encode(enc)?;
        self.1.encode(enc)
    }
}
impl<U: Decode, V: Decode> Decode for (U, V) {
    fn decode(dec: &mut dyn Decoder) -> Result<Self> {
        Ok((U::decode(dec)?, V::decode(dec)?))
    }
}

/// Unique pointer: presence byte, then payload. `Box<T>` cannot be null in
/// Rust, so decode treats a clear presence bit as `data-mismatch` rather
/// than the encode-time `invalid-state` `spec.md` §4.6 assigns to cycles —
/// pair with `Option<Box<T>>` for a wire-nullable unique pointer.
impl<T: Encode> Encode for Box<T> {
    fn encode(&self, enc: &mut dyn Encoder) -> Result<()> {
        enc.write_bool(true)?;
        self.as_ref().encode(enc)
    }
}
impl<T: Decode> Decode for Box<T> {
    fn decode(dec: &mut dyn Decoder) -> Result<Self> {
        if !dec.read_bool()? {
            return Err(Error::data_mismatch(
                "unique pointer was absent where a value was required",
            ));
        }
        Ok(Box::new(T::decode(dec)?))
    }
}

fn encode_shared<T: Encode + Send + Sync + 'static>(
    value: &Arc<T>,
    enc: &mut dyn Encoder,
) -> Result<()> {
    let ptr = Arc::as_ptr(value) as *const () as usize;
    let (id, first) = enc.tables_mut().assign_shared_id(ptr);
    enc.write_varint(id)?;
    if first {
        value.as_ref().encode(enc)?;
    }
    Ok(())
}

fn decode_shared<T: Decode + Send + Sync + 'static>(
    dec: &mut dyn Decoder,
) -> Result<Option<Arc<T>>> {
    let id = dec.read_varint()?;
    if id == 0 {
        return Ok(None);
    }
    if let Some(existing) = dec.shared_table_mut().get(&id) {
        let arc = existing
            .clone()
            .downcast::<T>()
            .map_err(|_| Error::data_mismatch("shared pointer id reused with a different type"))?;
        return Ok(Some(arc));
    }
    let value = Arc::new(T::decode(dec)?);
    dec.shared_table_mut().insert(id, value.clone());
    Ok(Some(value))
}

/// Shared pointer: varint reference id. Id 0 is null; a fresh positive id
/// on first occurrence is followed inline by the value, later occurrences
/// repeat the id with no payload.
impl<T: Encode + Send + Sync + 'static> Encode for Arc<T> {
    fn encode(&self, enc: &mut dyn Encoder) -> Result<()> {
        encode_shared(self, enc)
    }
}
impl<T: Decode + Send + Sync + 'static> Decode for Arc<T> {
    fn decode(dec: &mut dyn Decoder) -> Result<Self> {
        decode_shared::<T>(dec)?
            .ok_or_else(|| Error::invalid_state("null shared pointer decoded into a non-optional Arc"))
    }
}

/// Weak pointer: written as the shared pointer it locks to; null if
/// expired.
impl<T: Encode + Send + Sync + 'static> Encode for Weak<T> {
    fn encode(&self, enc: &mut dyn Encoder) -> Result<()> {
        match self.upgrade() {
            Some(arc) => encode_shared(&arc, enc),
            None => enc.write_varint(0),
        }
    }
}
impl<T: Decode + Send + Sync + 'static> Decode for Weak<T> {
    fn decode(dec: &mut dyn Decoder) -> Result<Self> {
        Ok(match decode_shared::<T>(dec)? {
            Some(arc) => Arc::downgrade(&arc),
            None => Weak::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::endian::{LittleEndianDecoder, LittleEndianEncoder};

    fn round_trip<T: Encode + Decode + PartialEq + std::fmt::Debug>(value: T) {
        let mut enc = LittleEndianEncoder::new();
        value.encode(&mut enc).unwrap();
        let mut dec = LittleEndianDecoder::new(enc.bytes());
        assert_eq!(T::decode(&mut dec).unwrap(), value);
    }

    #[test]
    fn scalars_round_trip() {
        round_trip(42u32);
        round_trip(-7i64);
        round_trip(true);
        round_trip(2.5f64);
    }

    #[test]
    fn strings_and_vecs_round_trip() {
        round_trip("hello flowline".to_string());
        round_trip(vec![1i32, 2, 3, 4]);
    }

    #[test]
    fn static_arrays_have_no_length_prefix() {
        let mut enc = LittleEndianEncoder::new();
        [1u8, 2, 3].encode(&mut enc).unwrap();
        assert_eq!(enc.bytes(), &[1, 2, 3]);
    }

    #[test]
    fn option_some_and_none_round_trip() {
        round_trip(Some(5i32));
        round_trip(None::<i32>);
    }

    #[test]
    fn pair_round_trips() {
        round_trip((3i32, "x".to_string()));
    }

    #[test]
    fn set_and_map_round_trip_in_key_order() {
        let set: std::collections::BTreeSet<i32> = [3, 1, 2].into_iter().collect();
        round_trip(set);

        let map: std::collections::BTreeMap<i32, String> =
            [(2, "b".to_string()), (1, "a".to_string())].into_iter().collect();
        round_trip(map);
    }

    #[test]
    fn shared_pointer_deduplicates_repeated_occurrences() {
        let shared = Arc::new(99i32);
        let pair = (shared.clone(), shared.clone());
        let mut enc = LittleEndianEncoder::new();
        pair.0.encode(&mut enc).unwrap();
        pair.1.encode(&mut enc).unwrap();
        // id(=1) + full payload, then id(=1) alone: 1 + 4 + 1 bytes.
        assert_eq!(enc.bytes().len(), 1 + 4 + 1);

        let mut dec = LittleEndianDecoder::new(enc.bytes());
        let a = Arc::<i32>::decode(&mut dec).unwrap();
        let b = Arc::<i32>::decode(&mut dec).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*a, 99);
    }

    #[test]
    fn weak_pointer_round_trips_through_its_shared_owner() {
        let shared = Arc::new(7i32);
        let weak = Arc::downgrade(&shared);
        let mut enc = LittleEndianEncoder::new();
        weak.encode(&mut enc).unwrap();
        let mut dec = LittleEndianDecoder::new(enc.bytes());
        let decoded = Weak::<i32>::decode(&mut dec).unwrap();
        assert_eq!(*decoded.upgrade().unwrap(), 7);
    }

    #[test]
    fn expired_weak_pointer_encodes_as_null() {
        let weak: Weak<i32> = Weak::new();
        let mut enc = LittleEndianEncoder::new();
        weak.encode(&mut enc).unwrap();
        assert_eq!(enc.bytes(), &[0]);
        let mut dec = LittleEndianDecoder::new(enc.bytes());
        assert!(Weak::<i32>::decode(&mut dec).unwrap().upgrade().is_none());
    }

    #[test]
    fn box_requires_presence_on_decode() {
        let mut dec = LittleEndianDecoder::new(&[0]);
        let err = Box::<i32>::decode(&mut dec).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::DataMismatch);
    }

    #[test]
    fn fingerprint_gate_rejects_a_mismatched_schema() {
        let mut enc = LittleEndianEncoder::new();
        super::encode_with_fingerprint(&5i32, &mut enc).unwrap();
        let mut dec = LittleEndianDecoder::new(enc.bytes());
        let err = super::decode_with_fingerprint::<i64>(&mut dec).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::DataMismatch);
    }

    #[test]
    fn fingerprint_gate_accepts_a_matching_schema() {
        let mut enc = LittleEndianEncoder::new();
        super::encode_with_fingerprint(&5i32, &mut enc).unwrap();
        let mut dec = LittleEndianDecoder::new(enc.bytes());
        assert_eq!(super::decode_with_fingerprint::<i32>(&mut dec).unwrap(), 5);
    }
}

//! The binary wire codec: byte-order-aware encoders/decoders, the per-type
//! `Encode`/`Decode` rules, structural schema fingerprinting, and dynamic
//! (polymorphic) record dispatch. See `spec.md` §4.6 for the normative wire
//! rules this module implements.

pub mod dynamic;
pub mod endian;
pub mod fingerprint;
pub mod traits;
pub mod varint;

pub use dynamic::{decode_dynamic, encode_dynamic, DynamicClassRegistry, DynamicRecord};
pub use endian::{
    BigEndianDecoder, BigEndianEncoder, Decoder, EncodeTables, Encoder, LittleEndianDecoder,
    LittleEndianEncoder, SizeEncoder,
};
pub use fingerprint::{
    compose_record, compose_type, fingerprint_of, Fingerprint, SeenTypes, Ticks, TimePointTicks,
    TypeFamily, WireChar,
};
pub use traits::{decode_with_fingerprint, encode_with_fingerprint, Decode, Encode};

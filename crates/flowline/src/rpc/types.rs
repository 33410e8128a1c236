//! The RPC wire shapes from `spec.md` §6's "RPC call shape (informative)":
//! request header, reply status tag, and the payload type services hand
//! back already encoded.

use crate::codec::{Decode, Decoder, Encode, Encoder};
use crate::error::{Error, Result};

/// A return value (or dynamic-record body) already serialized by the callee,
/// opaque to everything that merely forwards it — the server writes it
/// straight onto the wire after the reply status tag.
pub type EncodedPayload = Vec<u8>;

/// `(object_name: string, method_ordinal: varint)`, the header every request
/// carries ahead of its argument tuple (`spec.md` §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHeader {
    pub object_name: String,
    pub method_ordinal: u32,
}

impl RequestHeader {
    pub fn write(&self, enc: &mut dyn Encoder) -> Result<()> {
        self.object_name.encode(enc)?;
        enc.write_varint(self.method_ordinal as u64)
    }

    pub fn read(dec: &mut dyn Decoder) -> Result<Self> {
        let object_name = String::decode(dec)?;
        let method_ordinal = dec.read_varint()? as u32;
        Ok(RequestHeader { object_name, method_ordinal })
    }
}

/// One-byte enum tagging a reply as success or failure, ahead of the body
/// (`spec.md` §6: `(status: enum{ok, error}, body)`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Ok,
    Error,
}

impl ReplyStatus {
    pub fn write(&self, enc: &mut dyn Encoder) -> Result<()> {
        enc.write_u8(match self {
            ReplyStatus::Ok => 0,
            ReplyStatus::Error => 1,
        })
    }

    pub fn read(dec: &mut dyn Decoder) -> Result<Self> {
        match dec.read_u8()? {
            0 => Ok(ReplyStatus::Ok),
            1 => Ok(ReplyStatus::Error),
            other => Err(Error::data_mismatch(format!(
                "unrecognized reply status tag {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::endian::{LittleEndianDecoder, LittleEndianEncoder};

    #[test]
    fn request_header_round_trips() {
        let header = RequestHeader {
            object_name: "Greeter".to_string(),
            method_ordinal: 3,
        };
        let mut enc = LittleEndianEncoder::new();
        header.write(&mut enc).unwrap();
        let mut dec = LittleEndianDecoder::new(enc.bytes());
        assert_eq!(RequestHeader::read(&mut dec).unwrap(), header);
    }

    #[test]
    fn reply_status_round_trips_both_variants() {
        for status in [ReplyStatus::Ok, ReplyStatus::Error] {
            let mut enc = LittleEndianEncoder::new();
            status.write(&mut enc).unwrap();
            let mut dec = LittleEndianDecoder::new(enc.bytes());
            assert_eq!(ReplyStatus::read(&mut dec).unwrap(), status);
        }
    }

    #[test]
    fn unrecognized_status_tag_is_a_data_mismatch() {
        let mut enc = LittleEndianEncoder::new();
        enc.write_u8(2).unwrap();
        let mut dec = LittleEndianDecoder::new(enc.bytes());
        let err = ReplyStatus::read(&mut dec).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::DataMismatch);
    }
}

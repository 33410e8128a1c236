//! Keyed message authentication, grounded on `lasr::mac_codec`
//! (`examples/original_source/src/lasr/packet_codecs.h`): a 256-bit shared
//! key, an appended authenticator, verify-and-strip on decode. The original
//! uses HighwayHash; this crate uses BLAKE3's keyed mode instead (see
//! `DESIGN.md`), which takes the same 256-bit key and gives a MAC with
//! equivalent properties.
//!
//! Provides integrity only, by design — no confidentiality, no replay
//! protection (`spec.md` §4.7 Non-goals).

use crate::error::{Error, Result};

/// Length in bytes of the appended authenticator.
pub const TAG_LEN: usize = 8;

/// A 256-bit shared key, stored as four 64-bit words to match
/// `spec.md`'s "four 64-bit words" framing and
/// [`crate::config::DEFAULT_MAC_KEY`].
#[derive(Clone, Copy)]
pub struct MacKey([u64; 4]);

impl MacKey {
    pub fn new(words: [u64; 4]) -> Self {
        MacKey(words)
    }

    fn as_blake3_key(&self) -> [u8; 32] {
        let mut key = [0u8; 32];
        for (i, word) in self.0.iter().enumerate() {
            key[i * 8..i * 8 + 8].copy_from_slice(&word.to_le_bytes());
        }
        key
    }
}

impl Default for MacKey {
    fn default() -> Self {
        MacKey(crate::config::DEFAULT_MAC_KEY)
    }
}

fn tag_for(key: &MacKey, payload: &[u8]) -> [u8; TAG_LEN] {
    let full = blake3::keyed_hash(&key.as_blake3_key(), payload);
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&full.as_bytes()[..TAG_LEN]);
    tag
}

/// Appends an 8-byte authenticator computed over `payload`.
pub fn encode(key: &MacKey, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + TAG_LEN);
    out.extend_from_slice(payload);
    out.extend_from_slice(&tag_for(key, payload));
    out
}

/// Verifies and strips the trailing authenticator, failing with
/// `data-mismatch` on any tag mismatch (including truncated input).
pub fn decode(key: &MacKey, framed: &[u8]) -> Result<Vec<u8>> {
    if framed.len() < TAG_LEN {
        return Err(Error::data_mismatch("MAC frame shorter than the tag"));
    }
    let split = framed.len() - TAG_LEN;
    let (payload, tag) = framed.split_at(split);
    let expected = tag_for(key, payload);
    // Constant-time comparison: a MAC codec exists precisely to defend
    // against a forging attacker, so tag comparison must not leak timing.
    if !constant_time_eq(tag, &expected) {
        return Err(Error::data_mismatch("MAC tag verification failed"));
    }
    Ok(payload.to_vec())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

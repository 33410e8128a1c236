//! Dynamic (polymorphic) records: instances whose concrete type is decided
//! at decode time by a portable class name carried on the wire.
//!
//! Grounded on `lasr::dynamic_object_registry`-style factories implied by
//! `spec.md` §4.6's "Dynamic record" rule, and on `hdds`'s process-wide
//! `ServiceRegistry` pattern (`examples/hdds-team-hdds/crates/hdds/src/rpc/mod.rs`)
//! for the registration/lookup shape: a `RwLock<HashMap<name, factory>>`
//! behind a lazily-initialized global.

use super::endian::{Decoder, Encoder};
use super::traits::{Decode, Encode};
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// A record type participating in dynamic (by-name) dispatch. Implemented
/// by hand alongside `Encode`/`Decode` for the concrete type, since the
/// macro-generated proxy/registration boilerplate real RPC frameworks emit
/// is out of scope here (see `spec.md`'s Non-goals).
pub trait DynamicRecord: Encode + Send + Sync + 'static {
    /// The name this type is registered under in [`DynamicClassRegistry`].
    /// Stable across processes and languages; this is what crosses the
    /// wire, not a language-specific type name.
    fn portable_class_name(&self) -> &'static str;
}

type DecodeFn = fn(&mut dyn Decoder) -> Result<Arc<dyn DynamicRecord>>;

/// Process-wide map from portable class name to a decode factory for that
/// type. A single instance is shared by the whole process
/// ([`DynamicClassRegistry::global`]); nothing here is per-connection.
#[derive(Default)]
pub struct DynamicClassRegistry {
    factories: RwLock<HashMap<&'static str, DecodeFn>>,
}

impl DynamicClassRegistry {
    pub fn global() -> &'static DynamicClassRegistry {
        static REGISTRY: OnceLock<DynamicClassRegistry> = OnceLock::new();
        REGISTRY.get_or_init(DynamicClassRegistry::default)
    }

    /// Registers `name` so that a wire-encountered instance of it can be
    /// decoded via `factory`. Typically called once per type during process
    /// startup.
    pub fn register(&self, name: &'static str, factory: DecodeFn) {
        self.factories.write().insert(name, factory);
    }

    fn decode_by_name(&self, name: &str, dec: &mut dyn Decoder) -> Result<Arc<dyn DynamicRecord>> {
        let factory = *self
            .factories
            .read()
            .get(name)
            .ok_or_else(|| Error::key_error(format!("unregistered dynamic class: {name}")))?;
        factory(dec)
    }
}

/// Encodes a dynamic record's envelope (class name or id) followed by its
/// body. First occurrence in a call writes id `0` then the class name
/// string; later occurrences of the same class write only its assigned id.
pub fn encode_dynamic(record: &Arc<dyn DynamicRecord>, enc: &mut dyn Encoder) -> Result<()> {
    let name = record.portable_class_name();
    let (id, first) = enc.tables_mut().assign_class_id(name);
    if first {
        enc.write_varint(0)?;
        name.to_string().encode(enc)?;
    } else {
        enc.write_varint(id)?;
    }
    record.encode(enc)
}

/// Decodes a dynamic record's envelope, resolves its class through
/// [`DynamicClassRegistry::global`], then decodes its body.
pub fn decode_dynamic(dec: &mut dyn Decoder) -> Result<Arc<dyn DynamicRecord>> {
    let id = dec.read_varint()?;
    let name = if id == 0 {
        let name = String::decode(dec)?;
        let next_id = dec.class_table_mut().len() as u64 + 1;
        dec.class_table_mut().insert(next_id, name.clone());
        name
    } else {
        dec.class_table_mut()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::data_mismatch("unknown dynamic class id"))?
    };
    DynamicClassRegistry::global().decode_by_name(&name, dec)
}

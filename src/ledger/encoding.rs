//! Canonical MessagePack encoding and hashing primitives.
//!
//! The ledger hashes and signs the exact bytes produced here, so the encoding
//! must be canonical: map keys sorted, empty values omitted, integers in their
//! most compact form.

use rmpv::Value;
use sha2::{Digest, Sha512_256};

/// Domain separation prefix for transaction ids and signatures.
pub const TX_PREFIX: &[u8] = b"TX";

/// Domain separation prefix for group ids.
pub const GROUP_PREFIX: &[u8] = b"TG";

/// SHA-512/256 digest.
pub fn sha512_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha512_256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash `prefix ‖ data`.
pub fn hash_with_prefix(prefix: &[u8], data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha512_256::new();
    hasher.update(prefix);
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Builder for a canonical map. Zero values are dropped on insert.
#[derive(Debug, Clone, Default)]
pub struct CanonicalMap {
    entries: Vec<(&'static str, Value)>,
}

impl CanonicalMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uint(mut self, key: &'static str, value: u64) -> Self {
        if value != 0 {
            self.entries.push((key, Value::from(value)));
        }
        self
    }

    pub fn bytes(mut self, key: &'static str, value: &[u8]) -> Self {
        if !value.is_empty() {
            self.entries.push((key, Value::Binary(value.to_vec())));
        }
        self
    }

    pub fn opt_bytes(self, key: &'static str, value: Option<&[u8]>) -> Self {
        match value {
            Some(v) => self.bytes(key, v),
            None => self,
        }
    }

    pub fn string(mut self, key: &'static str, value: &str) -> Self {
        if !value.is_empty() {
            self.entries.push((key, Value::from(value)));
        }
        self
    }

    pub fn boolean(mut self, key: &'static str, value: bool) -> Self {
        if value {
            self.entries.push((key, Value::Boolean(true)));
        }
        self
    }

    pub fn array(mut self, key: &'static str, values: Vec<Value>) -> Self {
        if !values.is_empty() {
            self.entries.push((key, Value::Array(values)));
        }
        self
    }

    pub fn map(mut self, key: &'static str, value: CanonicalMap) -> Self {
        if !value.is_empty() {
            self.entries.push((key, value.into_value()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sort keys and convert to a MessagePack value.
    pub fn into_value(mut self) -> Value {
        self.entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
        Value::Map(
            self.entries
                .into_iter()
                .map(|(k, v)| (Value::from(k), v))
                .collect(),
        )
    }

    pub fn encode(self) -> Vec<u8> {
        encode_value(&self.into_value())
    }
}

/// Serialize a MessagePack value.
pub fn encode_value(value: &Value) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    // io::Write for Vec<u8> never fails.
    let _ = rmpv::encode::write_value(&mut buf, value);
    buf
}

//! Ledger account addresses.
//!
//! An address is the 32-byte ed25519 public key. Its text form is the
//! unpadded base32 of `key ‖ checksum`, where the checksum is the last four
//! bytes of SHA-512/256(key).

use data_encoding::BASE32_NOPAD;
use std::fmt;
use std::str::FromStr;

use crate::ledger::encoding::sha512_256;
use crate::ledger::types::LedgerError;

const CHECKSUM_LEN: usize = 4;

/// Length of the text form of an address.
pub const ADDRESS_LEN: usize = 58;

/// An account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 32]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; 32]);

    pub fn from_public_key(key: [u8; 32]) -> Self {
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    fn checksum(&self) -> [u8; CHECKSUM_LEN] {
        let digest = sha512_256(&self.0);
        let mut out = [0u8; CHECKSUM_LEN];
        out.copy_from_slice(&digest[32 - CHECKSUM_LEN..]);
        out
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut raw = Vec::with_capacity(32 + CHECKSUM_LEN);
        raw.extend_from_slice(&self.0);
        raw.extend_from_slice(&self.checksum());
        f.write_str(&BASE32_NOPAD.encode(&raw))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != ADDRESS_LEN {
            return Err(LedgerError::Address(format!(
                "expected {} characters, got {}",
                ADDRESS_LEN,
                s.len()
            )));
        }

        let raw = BASE32_NOPAD
            .decode(s.as_bytes())
            .map_err(|e| LedgerError::Address(format!("invalid base32: {}", e)))?;
        if raw.len() != 32 + CHECKSUM_LEN {
            return Err(LedgerError::Address(format!("decoded to {} bytes", raw.len())));
        }

        let mut key = [0u8; 32];
        key.copy_from_slice(&raw[..32]);
        let address = Address(key);
        if raw[32..] != address.checksum() {
            return Err(LedgerError::Address("checksum mismatch".to_string()));
        }
        Ok(address)
    }
}

//! Account keys.
//!
//! # Security
//! - Seeds are loaded ONLY from environment variables or generated locally
//! - Keys are never logged or serialized

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

use crate::ledger::address::Address;
use crate::ledger::signer::{sign, SignedTransaction};
use crate::ledger::transaction::Transaction;
use crate::ledger::types::{LedgerError, LedgerResult};

/// Environment variable holding the creator's hex-encoded 32-byte seed.
pub const CREATOR_SEED_ENV_VAR: &str = "ATOMIC_CREATOR_SEED";

/// A signing identity.
#[derive(Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    address: Address,
}

impl Wallet {
    /// Generate a fresh random account.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed))
    }

    /// Create a wallet from a hex-encoded seed (with or without 0x prefix).
    pub fn from_seed_hex(seed_hex: &str) -> LedgerResult<Self> {
        let seed_hex = seed_hex.trim();
        let seed_hex = seed_hex.strip_prefix("0x").unwrap_or(seed_hex);

        let bytes = hex::decode(seed_hex)
            .map_err(|e| LedgerError::Wallet(format!("Invalid seed format: {}", e)))?;
        let seed: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            LedgerError::Wallet(format!("Invalid seed length: {} bytes", b.len()))
        })?;

        let wallet = Self::from_seed(&seed);
        tracing::info!(address = %wallet.address, "Wallet initialized");
        Ok(wallet)
    }

    /// Load wallet from environment variable.
    ///
    /// Reads `ATOMIC_CREATOR_SEED` from environment.
    pub fn from_env() -> LedgerResult<Self> {
        let seed = std::env::var(CREATOR_SEED_ENV_VAR).map_err(|_| {
            LedgerError::Wallet(format!(
                "Environment variable {} not set",
                CREATOR_SEED_ENV_VAR
            ))
        })?;

        Self::from_seed_hex(&seed)
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = Address::from_public_key(signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            address,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Sign `tx` with this wallet's key.
    pub fn sign(&self, tx: &Transaction) -> SignedTransaction {
        sign(tx, self)
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

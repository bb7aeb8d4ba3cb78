//! Transaction signing.
//!
//! The signature covers `"TX" ‖ encoding`, group id included. The signer
//! does not check that the key belongs to the record's sender: a mismatch
//! produces a well-formed [`SignedTransaction`] that the node rejects at
//! submission time. Use [`SignedTransaction::is_signed_by_sender`] to catch
//! it earlier.

use ed25519_dalek::{Signature, Signer, Verifier, VerifyingKey};

use crate::ledger::address::Address;
use crate::ledger::encoding::CanonicalMap;
use crate::ledger::transaction::Transaction;
use crate::ledger::types::TxId;
use crate::ledger::wallet::Wallet;

/// A transaction record with the signature of one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    txn: Transaction,
    signature: [u8; 64],
    signer: Address,
}

/// Sign `tx` with `wallet`. The record is not modified.
pub fn sign(tx: &Transaction, wallet: &Wallet) -> SignedTransaction {
    let signature = wallet.signing_key().sign(&tx.bytes_to_sign());
    SignedTransaction {
        txn: tx.clone(),
        signature: signature.to_bytes(),
        signer: wallet.address(),
    }
}

impl SignedTransaction {
    pub fn transaction(&self) -> &Transaction {
        &self.txn
    }

    pub fn signature(&self) -> &[u8; 64] {
        &self.signature
    }

    pub fn signer(&self) -> Address {
        self.signer
    }

    pub fn id(&self) -> TxId {
        self.txn.id()
    }

    pub fn is_signed_by_sender(&self) -> bool {
        self.signer == self.txn.sender()
    }

    /// Check the signature against the signing identity.
    pub fn verify(&self) -> bool {
        let Ok(key) = VerifyingKey::from_bytes(self.signer.as_bytes()) else {
            return false;
        };
        let signature = Signature::from_bytes(&self.signature);
        key.verify(&self.txn.bytes_to_sign(), &signature).is_ok()
    }

    /// Wire encoding: `{ "sgnr"?, "sig", "txn" }`.
    ///
    /// `sgnr` is only written when the signer is not the sender.
    pub fn encode(&self) -> Vec<u8> {
        let signer = if self.is_signed_by_sender() {
            None
        } else {
            Some(self.signer.as_bytes().as_slice())
        };

        CanonicalMap::new()
            .opt_bytes("sgnr", signer)
            .bytes("sig", &self.signature)
            .map("txn", self.txn.to_canonical_map(true))
            .encode()
    }
}

//! Transaction records and their builder.
//!
//! # Responsibilities
//! - Build records from a [`NetworkParams`] snapshot with the right fee
//! - Canonical encoding, transaction id and bytes-to-sign
//! - Local validation before anything touches the network
//!
//! Records expose no setters. Once [`assemble_group`](crate::ledger::group::assemble_group)
//! stamps a group id the record is sealed; rebuilding it through
//! [`TransactionBuilder::from_transaction`] keeps the stamp, so the change is
//! caught by [`verify_group`](crate::ledger::group::verify_group).

use crate::ledger::address::Address;
use crate::ledger::encoding::{hash_with_prefix, CanonicalMap, TX_PREFIX};
use crate::ledger::types::{GroupId, LedgerError, LedgerResult, NetworkParams, TxId};

/// Maximum note length accepted by the ledger.
pub const MAX_NOTE_BYTES: usize = 1024;

/// Bytes a signature adds to the encoded record, used for fee estimation.
const SIGNATURE_OVERHEAD: usize = 75;

/// Operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxKind {
    Payment,
    AssetTransfer,
    AssetCreate,
}

impl TxKind {
    /// Wire name of the kind.
    pub fn wire_type(&self) -> &'static str {
        match self {
            TxKind::Payment => "pay",
            TxKind::AssetTransfer => "axfer",
            TxKind::AssetCreate => "acfg",
        }
    }
}

/// Parameters of a newly created asset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AssetParams {
    /// Total base units in existence.
    pub total: u64,
    pub decimals: u32,
    pub default_frozen: bool,
    pub unit_name: String,
    pub asset_name: String,
    pub url: String,
    pub metadata_hash: Option<[u8; 32]>,
    pub manager: Option<Address>,
    pub reserve: Option<Address>,
    pub freeze: Option<Address>,
    pub clawback: Option<Address>,
}

impl AssetParams {
    fn to_canonical_map(&self) -> CanonicalMap {
        CanonicalMap::new()
            .string("an", &self.asset_name)
            .string("au", &self.url)
            .opt_bytes("am", self.metadata_hash.as_ref().map(|h| h.as_slice()))
            .opt_bytes("c", self.clawback.as_ref().map(|a| a.as_bytes().as_slice()))
            .uint("dc", u64::from(self.decimals))
            .boolean("df", self.default_frozen)
            .opt_bytes("f", self.freeze.as_ref().map(|a| a.as_bytes().as_slice()))
            .opt_bytes("m", self.manager.as_ref().map(|a| a.as_bytes().as_slice()))
            .opt_bytes("r", self.reserve.as_ref().map(|a| a.as_bytes().as_slice()))
            .uint("t", self.total)
            .string("un", &self.unit_name)
    }
}

/// One intended ledger operation plus its validity parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    kind: TxKind,
    sender: Address,
    receiver: Option<Address>,
    amount: u64,
    asset_id: Option<u64>,
    asset_params: Option<AssetParams>,
    fee: u64,
    first_valid: u64,
    last_valid: u64,
    genesis_hash: [u8; 32],
    genesis_id: String,
    note: Vec<u8>,
    group: Option<GroupId>,
}

impl Transaction {
    pub fn kind(&self) -> TxKind {
        self.kind
    }

    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn receiver(&self) -> Option<Address> {
        self.receiver
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn asset_id(&self) -> Option<u64> {
        self.asset_id
    }

    pub fn asset_params(&self) -> Option<&AssetParams> {
        self.asset_params.as_ref()
    }

    pub fn fee(&self) -> u64 {
        self.fee
    }

    pub fn first_valid(&self) -> u64 {
        self.first_valid
    }

    pub fn last_valid(&self) -> u64 {
        self.last_valid
    }

    pub fn genesis_hash(&self) -> &[u8; 32] {
        &self.genesis_hash
    }

    pub fn genesis_id(&self) -> &str {
        &self.genesis_id
    }

    pub fn note(&self) -> &[u8] {
        &self.note
    }

    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    pub(crate) fn with_group(mut self, group: Option<GroupId>) -> Self {
        self.group = group;
        self
    }

    pub(crate) fn to_canonical_map(&self, include_group: bool) -> CanonicalMap {
        let group = if include_group {
            self.group.as_ref().map(|g| g.as_bytes().as_slice())
        } else {
            None
        };

        let mut map = CanonicalMap::new()
            .uint("fee", self.fee)
            .uint("fv", self.first_valid)
            .string("gen", &self.genesis_id)
            .bytes("gh", &self.genesis_hash)
            .opt_bytes("grp", group)
            .uint("lv", self.last_valid)
            .bytes("note", &self.note)
            .bytes("snd", self.sender.as_bytes())
            .string("type", self.kind.wire_type());

        let receiver = self.receiver.as_ref().map(|a| a.as_bytes().as_slice());
        map = match self.kind {
            TxKind::Payment => map.uint("amt", self.amount).opt_bytes("rcv", receiver),
            TxKind::AssetTransfer => map
                .uint("aamt", self.amount)
                .opt_bytes("arcv", receiver)
                .uint("xaid", self.asset_id.unwrap_or_default()),
            TxKind::AssetCreate => match &self.asset_params {
                Some(params) => map.map("apar", params.to_canonical_map()),
                None => map,
            },
        };
        map
    }

    /// Canonical encoding, including the group id if stamped.
    pub fn encode(&self) -> Vec<u8> {
        self.to_canonical_map(true).encode()
    }

    /// Bytes covered by the signature.
    pub fn bytes_to_sign(&self) -> Vec<u8> {
        let mut bytes = TX_PREFIX.to_vec();
        bytes.extend_from_slice(&self.encode());
        bytes
    }

    /// Raw transaction hash.
    pub fn raw_id(&self) -> [u8; 32] {
        hash_with_prefix(TX_PREFIX, &self.encode())
    }

    /// Raw hash with the group field cleared; input to the group id.
    pub(crate) fn raw_id_ungrouped(&self) -> [u8; 32] {
        hash_with_prefix(TX_PREFIX, &self.to_canonical_map(false).encode())
    }

    pub fn id(&self) -> TxId {
        TxId::from_raw(&self.raw_id())
    }

    /// Size of the signed encoding, approximately.
    pub fn estimated_signed_size(&self) -> usize {
        self.encode().len() + SIGNATURE_OVERHEAD
    }

    /// Check the record is well-formed for its kind.
    pub fn validate(&self) -> LedgerResult<()> {
        if self.first_valid > self.last_valid {
            return Err(LedgerError::Validation(format!(
                "first valid round {} is after last valid round {}",
                self.first_valid, self.last_valid
            )));
        }
        if self.note.len() > MAX_NOTE_BYTES {
            return Err(LedgerError::Validation(format!(
                "note is {} bytes, limit is {}",
                self.note.len(),
                MAX_NOTE_BYTES
            )));
        }

        match self.kind {
            TxKind::Payment => {
                if self.receiver.is_none() {
                    return Err(LedgerError::Validation("payment has no receiver".into()));
                }
            }
            TxKind::AssetTransfer => {
                if self.asset_id.unwrap_or_default() == 0 {
                    return Err(LedgerError::Validation(
                        "asset transfer has no asset id".into(),
                    ));
                }
                if self.receiver.is_none() {
                    return Err(LedgerError::Validation(
                        "asset transfer has no receiver".into(),
                    ));
                }
            }
            TxKind::AssetCreate => match &self.asset_params {
                Some(params) if params.total > 0 => {}
                Some(_) => {
                    return Err(LedgerError::Validation("asset total must be positive".into()))
                }
                None => {
                    return Err(LedgerError::Validation(
                        "asset create has no parameters".into(),
                    ))
                }
            },
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum FeeMode {
    PerByte { per_byte: u64, min_fee: u64 },
    Flat(u64),
}

/// Builder for [`Transaction`].
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    tx: Transaction,
    fee_mode: FeeMode,
}

impl TransactionBuilder {
    fn base(kind: TxKind, params: &NetworkParams, sender: Address) -> Self {
        let fee_mode = if params.flat_fee {
            FeeMode::Flat(params.fee_per_byte)
        } else {
            FeeMode::PerByte {
                per_byte: params.fee_per_byte,
                min_fee: params.min_fee,
            }
        };

        Self {
            tx: Transaction {
                kind,
                sender,
                receiver: None,
                amount: 0,
                asset_id: None,
                asset_params: None,
                fee: 0,
                first_valid: params.first_valid(),
                last_valid: params.last_valid(),
                genesis_hash: params.genesis_hash,
                genesis_id: params.genesis_id.clone(),
                note: Vec::new(),
                group: None,
            },
            fee_mode,
        }
    }

    /// Transfer of the native currency, in base units.
    pub fn payment(params: &NetworkParams, sender: Address, receiver: Address, amount: u64) -> Self {
        let mut builder = Self::base(TxKind::Payment, params, sender);
        builder.tx.receiver = Some(receiver);
        builder.tx.amount = amount;
        builder
    }

    /// Transfer of `amount` base units of an asset.
    pub fn asset_transfer(
        params: &NetworkParams,
        sender: Address,
        receiver: Address,
        asset_id: u64,
        amount: u64,
    ) -> Self {
        let mut builder = Self::base(TxKind::AssetTransfer, params, sender);
        builder.tx.receiver = Some(receiver);
        builder.tx.asset_id = Some(asset_id);
        builder.tx.amount = amount;
        builder
    }

    /// Zero-amount transfer to self, which lets `account` hold the asset.
    pub fn asset_opt_in(params: &NetworkParams, account: Address, asset_id: u64) -> Self {
        Self::asset_transfer(params, account, account, asset_id, 0)
    }

    pub fn asset_create(params: &NetworkParams, creator: Address, asset: AssetParams) -> Self {
        let mut builder = Self::base(TxKind::AssetCreate, params, creator);
        builder.tx.asset_params = Some(asset);
        builder
    }

    /// Start from an existing record. Keeps its fee and group id.
    pub fn from_transaction(tx: &Transaction) -> Self {
        Self {
            tx: tx.clone(),
            fee_mode: FeeMode::Flat(tx.fee),
        }
    }

    pub fn note(mut self, note: impl Into<Vec<u8>>) -> Self {
        self.tx.note = note.into();
        self
    }

    pub fn amount(mut self, amount: u64) -> Self {
        self.tx.amount = amount;
        self
    }

    pub fn receiver(mut self, receiver: Address) -> Self {
        self.tx.receiver = Some(receiver);
        self
    }

    pub fn validity(mut self, first_valid: u64, last_valid: u64) -> Self {
        self.tx.first_valid = first_valid;
        self.tx.last_valid = last_valid;
        self
    }

    pub fn flat_fee(mut self, fee: u64) -> Self {
        self.fee_mode = FeeMode::Flat(fee);
        self
    }

    pub fn build(mut self) -> LedgerResult<Transaction> {
        self.tx.fee = match self.fee_mode {
            FeeMode::Flat(fee) => fee,
            FeeMode::PerByte { per_byte, min_fee } => {
                let size = self.tx.estimated_signed_size() as u64;
                per_byte.saturating_mul(size).max(min_fee)
            }
        };
        self.tx.validate()?;
        Ok(self.tx)
    }
}

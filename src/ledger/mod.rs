//! Ledger transaction subsystem.
//!
//! # Data Flow
//! ```text
//! NetworkParams (one snapshot per group)
//!     → transaction.rs (build records, fee and validity window)
//!     → group.rs (stamp the shared group id)
//!     → signer.rs (one signature per record, per its sender)
//!     → submit.rs (validate, encode, one atomic POST)
//!     → confirmation.rs (round-by-round wait for a terminal outcome)
//! ```
//!
//! # Security Constraints
//! - Signing keys ONLY from environment variables or generated in memory
//! - Never log signing keys or seeds
//! - Every node call has a timeout

pub mod address;
pub mod amount;
pub mod client;
pub mod confirmation;
pub mod encoding;
pub mod group;
pub mod signer;
pub mod submit;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use address::Address;
pub use amount::percent_of;
pub use client::NodeClient;
pub use confirmation::{await_confirmation, ConfirmationWaiter};
pub use group::{assemble_group, compute_group_id, verify_group, MAX_GROUP_SIZE};
pub use signer::{sign, SignedTransaction};
pub use submit::Submitter;
pub use transaction::{AssetParams, Transaction, TransactionBuilder, TxKind};
pub use types::{
    AccountInfo, ConfirmationResult, ErrorKind, FailureReason, GroupId, LedgerError, LedgerResult,
    NetworkParams, NodeStatus, Outcome, TxId, TxStatus,
};
pub use wallet::Wallet;

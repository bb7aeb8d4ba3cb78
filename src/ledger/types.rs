//! Ledger types and error definitions.

use data_encoding::{BASE32_NOPAD, BASE64};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// Re-export NodeConfig from config module to avoid duplication
pub use crate::config::schema::NodeConfig;

/// Transaction id: base32 of the transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl TxId {
    pub fn from_raw(raw: &[u8; 32]) -> Self {
        Self(BASE32_NOPAD.encode(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TxId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Digest binding an ordered set of transactions into one atomic unit.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub [u8; 32]);

impl GroupId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&BASE64.encode(&self.0))
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({})", self)
    }
}

/// Point-in-time snapshot of the parameters needed to build valid transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkParams {
    /// Fee per encoded byte (ignored when `flat_fee` is set).
    pub fee_per_byte: u64,
    /// Minimum fee per transaction.
    pub min_fee: u64,
    /// Treat `fee_per_byte` as the absolute fee.
    pub flat_fee: bool,
    /// Latest round known to the node.
    pub last_round: u64,
    pub genesis_hash: [u8; 32],
    pub genesis_id: String,
    pub consensus_version: String,
}

impl NetworkParams {
    /// Validity window length used for new transactions.
    pub const VALIDITY_ROUNDS: u64 = 1000;

    pub fn first_valid(&self) -> u64 {
        self.last_round
    }

    pub fn last_valid(&self) -> u64 {
        self.last_round + Self::VALIDITY_ROUNDS
    }
}

/// Latest round reported by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatus {
    #[serde(rename = "last-round")]
    pub last_round: u64,
}

/// Status of a submission as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum TxStatus {
    /// Neither in the pending pool nor in recent history.
    NotFound,
    /// In the pending pool.
    Pending,
    /// Included in a block.
    Confirmed { round: u64, asset_index: Option<u64> },
    /// Evicted from the pool with an error.
    Rejected { reason: String },
}

/// Asset holding of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetHolding {
    #[serde(rename = "asset-id")]
    pub asset_id: u64,
    pub amount: u64,
    #[serde(rename = "is-frozen", default)]
    pub is_frozen: bool,
}

/// Account state as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: String,
    pub amount: u64,
    #[serde(rename = "min-balance", default)]
    pub min_balance: u64,
    #[serde(default)]
    pub assets: Vec<AssetHolding>,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed transaction or bundle, detected locally.
    #[error("Invalid transaction: {0}")]
    Validation(String),

    /// Bundle members do not carry one consistent group id.
    #[error("Group mismatch: {0}")]
    GroupMismatch(String),

    /// Address text could not be parsed.
    #[error("Invalid address: {0}")]
    Address(String),

    /// Node refused the submission.
    #[error("Rejected by node: {0}")]
    Rejected(String),

    /// Node does not know the requested object.
    #[error("Not found: {0}")]
    NotFound(String),

    /// API token missing or wrong.
    #[error("Node refused credentials (HTTP {0})")]
    Unauthorized(u16),

    /// Connection refused, reset or node-side 5xx.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Caller deadline expired or shutdown was requested.
    #[error("Operation cancelled")]
    Cancelled,

    /// Key loading error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Node response could not be decoded.
    #[error("Unexpected node response: {0}")]
    Decode(String),
}

/// Category of a [`LedgerError`], for callers deciding whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fix the input; no network call was made.
    Validation,
    /// Re-sign with the correct identity.
    Authorization,
    /// Rebuild the transaction.
    Rejected,
    /// Safe to retry the same call.
    Transient,
    Cancelled,
    /// Configuration or protocol problem.
    Fatal,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Validation(_) | LedgerError::GroupMismatch(_) | LedgerError::Address(_) => {
                ErrorKind::Validation
            }
            LedgerError::Rejected(message) if is_authorization_message(message) => {
                ErrorKind::Authorization
            }
            LedgerError::Rejected(_) => ErrorKind::Rejected,
            LedgerError::Transport(_) | LedgerError::Timeout(_) => ErrorKind::Transient,
            LedgerError::Cancelled => ErrorKind::Cancelled,
            LedgerError::NotFound(_)
            | LedgerError::Unauthorized(_)
            | LedgerError::Wallet(_)
            | LedgerError::Decode(_) => ErrorKind::Fatal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

fn is_authorization_message(message: &str) -> bool {
    message.contains("should have been authorized by")
        || message.contains("signature didn't pass verification")
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Why a submission did not confirm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The node evicted the submission; it will never apply.
    Rejected(String),
    /// Not resolved within the round budget; it may still confirm.
    Timeout { rounds: u64 },
    /// Caller deadline or shutdown; status unknown.
    Cancelled,
    /// The node could not be reached; status unknown.
    Transport(String),
    /// The node answered with an error that retrying will not fix, such as
    /// a refused token or an undecodable response; status unknown.
    Node(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Rejected(reason) => write!(f, "rejected: {}", reason),
            FailureReason::Timeout { rounds } => {
                write!(f, "not confirmed after {} rounds; status unknown", rounds)
            }
            FailureReason::Cancelled => f.write_str("wait cancelled; status unknown"),
            FailureReason::Transport(reason) => {
                write!(f, "node unreachable while waiting ({}); status unknown", reason)
            }
            FailureReason::Node(reason) => {
                write!(f, "node error while waiting ({}); status unknown", reason)
            }
        }
    }
}

/// Terminal outcome of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Confirmed { round: u64, asset_index: Option<u64> },
    Failed(FailureReason),
}

/// Result of waiting for a submission. Never pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationResult {
    pub txid: TxId,
    pub outcome: Outcome,
}

impl ConfirmationResult {
    pub fn is_confirmed(&self) -> bool {
        matches!(self.outcome, Outcome::Confirmed { .. })
    }

    pub fn confirmed_round(&self) -> Option<u64> {
        match self.outcome {
            Outcome::Confirmed { round, .. } => Some(round),
            Outcome::Failed(_) => None,
        }
    }

    pub fn asset_index(&self) -> Option<u64> {
        match self.outcome {
            Outcome::Confirmed { asset_index, .. } => asset_index,
            Outcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.outcome {
            Outcome::Failed(reason) => Some(reason),
            Outcome::Confirmed { .. } => None,
        }
    }

    /// The submission may still confirm later.
    pub fn is_status_unknown(&self) -> bool {
        matches!(
            self.outcome,
            Outcome::Failed(FailureReason::Timeout { .. })
                | Outcome::Failed(FailureReason::Cancelled)
                | Outcome::Failed(FailureReason::Transport(_))
                | Outcome::Failed(FailureReason::Node(_))
        )
    }
}

impl fmt::Display for ConfirmationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Outcome::Confirmed { round, .. } => {
                write!(f, "transaction {} confirmed in round {}", self.txid, round)
            }
            Outcome::Failed(reason) => write!(f, "transaction {} {}", self.txid, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NodeConfig::default();
        assert_eq!(config.url, "http://localhost:4001");
        assert_eq!(config.rpc_timeout_secs, 10);
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");

        let err = LedgerError::Rejected("overspend".into());
        assert!(err.to_string().contains("overspend"));
    }

    #[test]
    fn test_error_kinds() {
        assert!(LedgerError::Transport("reset".into()).is_retryable());
        assert!(LedgerError::Timeout(5).is_retryable());
        assert!(!LedgerError::Rejected("fee too small".into()).is_retryable());
        assert_eq!(
            LedgerError::GroupMismatch("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            LedgerError::Rejected(
                "transaction ABC: should have been authorized by X but was actually authorized by Y"
                    .into()
            )
            .kind(),
            ErrorKind::Authorization
        );
        assert_eq!(
            LedgerError::Rejected("below min fee".into()).kind(),
            ErrorKind::Rejected
        );
    }

    #[test]
    fn test_validity_window() {
        let params = NetworkParams {
            fee_per_byte: 0,
            min_fee: 1000,
            flat_fee: false,
            last_round: 500,
            genesis_hash: [0u8; 32],
            genesis_id: "testnet-v1.0".into(),
            consensus_version: String::new(),
        };
        assert_eq!(params.first_valid(), 500);
        assert_eq!(params.last_valid(), 1500);
    }

    #[test]
    fn test_timeout_is_status_unknown() {
        let result = ConfirmationResult {
            txid: TxId("ABC".into()),
            outcome: Outcome::Failed(FailureReason::Timeout { rounds: 4 }),
        };
        assert!(result.is_status_unknown());
        assert!(result.to_string().contains("status unknown"));

        let rejected = ConfirmationResult {
            txid: TxId("ABC".into()),
            outcome: Outcome::Failed(FailureReason::Rejected("overspend".into())),
        };
        assert!(!rejected.is_status_unknown());
        assert_eq!(rejected.confirmed_round(), None);
    }

    #[test]
    fn test_node_error_is_not_reported_as_unreachable() {
        let result = ConfirmationResult {
            txid: TxId("ABC".into()),
            outcome: Outcome::Failed(FailureReason::Node(
                LedgerError::Unauthorized(401).to_string(),
            )),
        };
        assert!(result.is_status_unknown());
        let text = result.to_string();
        assert!(text.contains("HTTP 401"));
        assert!(!text.contains("unreachable"));
    }
}

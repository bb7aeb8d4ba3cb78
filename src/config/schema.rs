//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Ledger node connection.
    pub node: NodeConfig,

    /// Confirmation wait settings.
    pub confirmation: ConfirmationConfig,

    /// Retry configuration for transient node errors.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Parameters of the atomic sale run by the main binary.
    pub sale: SaleConfig,
}

/// Ledger node connection settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct NodeConfig {
    /// Node REST endpoint (e.g., "http://localhost:4001").
    pub url: String,

    /// Failover endpoints, tried in order when the primary is unreachable.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// API token sent as `X-Algo-API-Token`.
    pub token: String,

    /// Per-request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Timeout for the blocking wait-for-next-round call, in seconds.
    pub wait_timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:4001".to_string(),
            failover_urls: Vec::new(),
            // Local sandbox token.
            token: "a".repeat(64),
            rpc_timeout_secs: 10,
            wait_timeout_secs: 30,
        }
    }
}

/// Confirmation wait settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Rounds to wait before reporting a timeout.
    pub max_rounds: u64,

    /// Wall-clock limit, in seconds, for each parameter fetch, submission and
    /// confirmation wait. None = rounds only.
    pub deadline_secs: Option<u64>,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            max_rounds: 4,
            deadline_secs: None,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Retry transient node errors.
    pub enabled: bool,

    /// Total attempts per call, including the first.
    pub max_attempts: u32,

    /// Base delay for exponential backoff.
    pub base_delay_ms: u64,

    /// Upper bound on a single backoff delay.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 2_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

/// Atomic sale parameters. Amounts are in base units.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SaleConfig {
    /// Price the buyer pays the creator.
    pub price: u64,

    /// Share of the price forwarded to the artist, in basis points.
    pub royalty_bps: u64,

    /// Amount the creator sends the buyer before the sale.
    pub buyer_funding: u64,

    /// Amount the creator sends the artist before the sale.
    pub artist_funding: u64,

    pub asset_name: String,
    pub unit_name: String,
    pub asset_url: String,
}

impl Default for SaleConfig {
    fn default() -> Self {
        Self {
            price: 1_000_000,
            royalty_bps: 1_000, // 10%
            buyer_funding: 10_000_000,
            artist_funding: 1_000_000,
            asset_name: "nftASA".to_string(),
            unit_name: "nft".to_string(),
            asset_url: "ipfs://cid".to_string(),
        }
    }
}

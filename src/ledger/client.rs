//! Ledger node REST client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the node's REST endpoint (with ordered failovers)
//! - Fetch network parameters, node status, pending transaction status
//! - Submit raw signed bundles
//! - Map HTTP failures onto [`LedgerError`] categories

use data_encoding::BASE64;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

use crate::ledger::address::Address;
use crate::ledger::types::{
    AccountInfo, LedgerError, LedgerResult, NetworkParams, NodeConfig, NodeStatus, TxId, TxStatus,
};
use crate::observability::metrics;
use crate::resilience::timeouts::with_timeout;

/// Header carrying the node API token.
pub const TOKEN_HEADER: &str = "X-Algo-API-Token";

/// Ledger node client. Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct NodeClient {
    http: reqwest::Client,
    /// Endpoint base URLs (primary + failovers), without trailing slash.
    endpoints: Vec<String>,
    config: NodeConfig,
    timeout_duration: Duration,
    wait_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ParamsResponse {
    #[serde(rename = "consensus-version", default)]
    consensus_version: String,
    fee: u64,
    #[serde(rename = "genesis-hash")]
    genesis_hash: String,
    #[serde(rename = "genesis-id")]
    genesis_id: String,
    #[serde(rename = "last-round")]
    last_round: u64,
    #[serde(rename = "min-fee")]
    min_fee: u64,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    #[serde(rename = "txId")]
    tx_id: String,
}

#[derive(Debug, Deserialize)]
struct PendingResponse {
    #[serde(rename = "confirmed-round", default)]
    confirmed_round: Option<u64>,
    #[serde(rename = "pool-error", default)]
    pool_error: String,
    #[serde(rename = "asset-index", default)]
    asset_index: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl PendingResponse {
    fn into_status(self) -> TxStatus {
        match self.confirmed_round {
            Some(round) if round > 0 => TxStatus::Confirmed {
                round,
                asset_index: self.asset_index.filter(|i| *i > 0),
            },
            _ if !self.pool_error.is_empty() => TxStatus::Rejected {
                reason: self.pool_error,
            },
            _ => TxStatus::Pending,
        }
    }
}

impl ParamsResponse {
    fn into_params(self) -> LedgerResult<NetworkParams> {
        let hash = BASE64
            .decode(self.genesis_hash.as_bytes())
            .map_err(|e| LedgerError::Decode(format!("genesis hash: {}", e)))?;
        let genesis_hash: [u8; 32] = hash.try_into().map_err(|b: Vec<u8>| {
            LedgerError::Decode(format!("genesis hash is {} bytes", b.len()))
        })?;

        Ok(NetworkParams {
            fee_per_byte: self.fee,
            min_fee: self.min_fee,
            flat_fee: false,
            last_round: self.last_round,
            genesis_hash,
            genesis_id: self.genesis_id,
            consensus_version: self.consensus_version,
        })
    }
}

impl NodeClient {
    /// Create a new node client.
    ///
    /// No request is made; an unreachable node surfaces on first use.
    pub fn new(config: NodeConfig) -> LedgerResult<Self> {
        let mut endpoints = Vec::new();

        // 1. Add primary endpoint
        let primary: url::Url = config.url.parse().map_err(|e| {
            LedgerError::Validation(format!("Invalid node URL '{}': {}", config.url, e))
        })?;
        endpoints.push(primary.as_str().trim_end_matches('/').to_string());

        // 2. Add failover endpoints
        for url_str in &config.failover_urls {
            match url_str.parse::<url::Url>() {
                Ok(url) => endpoints.push(url.as_str().trim_end_matches('/').to_string()),
                Err(_) => tracing::warn!(url = %url_str, "Ignoring invalid failover node URL"),
            }
        }

        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| LedgerError::Transport(format!("HTTP client: {}", e)))?;

        tracing::info!(
            node_url = %config.url,
            endpoints = endpoints.len(),
            "Node client initialized"
        );

        Ok(Self {
            http,
            endpoints,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            wait_timeout: Duration::from_secs(config.wait_timeout_secs),
            config,
        })
    }

    /// Run `call` against each endpoint in order until one answers.
    ///
    /// Only transient failures move on to the next endpoint.
    async fn with_failover<T, F, Fut>(&self, operation: &'static str, call: F) -> LedgerResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = LedgerResult<T>>,
    {
        let mut last_error = None;
        for (i, base) in self.endpoints.iter().enumerate() {
            match call(base.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() => {
                    metrics::record_rpc_error(operation);
                    tracing::warn!(provider_idx = i, operation, error = %e, "Node error, trying next endpoint");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_error.unwrap_or_else(|| LedgerError::Transport("No node endpoints".into())))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        limit: Duration,
    ) -> LedgerResult<T> {
        with_timeout(limit, async move {
            let response = request
                .header(TOKEN_HEADER, &self.config.token)
                .send()
                .await
                .map_err(|e| LedgerError::Transport(e.to_string()))?;
            let response = check_status(response).await?;
            response
                .json::<T>()
                .await
                .map_err(|e| LedgerError::Decode(e.to_string()))
        })
        .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        limit: Duration,
    ) -> LedgerResult<T> {
        self.with_failover(operation, |base| async move {
            let request = self.http.get(format!("{}{}", base, path));
            self.send_json(request, limit).await
        })
        .await
    }

    /// Fetch a fresh parameter snapshot.
    pub async fn suggested_params(&self) -> LedgerResult<NetworkParams> {
        let response: ParamsResponse = self
            .get_json("suggested_params", "/v2/transactions/params", self.timeout_duration)
            .await?;
        response.into_params()
    }

    /// Submit an encoded bundle; returns the id of its first transaction.
    pub async fn send_raw(&self, payload: &[u8]) -> LedgerResult<TxId> {
        let response: SubmitResponse = self
            .with_failover("send_raw", |base| async move {
                let request = self
                    .http
                    .post(format!("{}/v2/transactions", base))
                    .header(reqwest::header::CONTENT_TYPE, "application/x-binary")
                    .body(payload.to_vec());
                self.send_json(request, self.timeout_duration).await
            })
            .await?;
        Ok(TxId(response.tx_id))
    }

    /// Status of a submission.
    pub async fn pending_status(&self, txid: &TxId) -> LedgerResult<TxStatus> {
        let path = format!("/v2/transactions/pending/{}", txid);
        match self
            .get_json::<PendingResponse>("pending_status", &path, self.timeout_duration)
            .await
        {
            Ok(response) => Ok(response.into_status()),
            Err(LedgerError::NotFound(_)) => Ok(TxStatus::NotFound),
            Err(e) => Err(e),
        }
    }

    /// Latest round.
    pub async fn status(&self) -> LedgerResult<NodeStatus> {
        self.get_json("status", "/v2/status", self.timeout_duration).await
    }

    /// Block until the node has seen a round after `round`.
    pub async fn wait_for_block_after(&self, round: u64) -> LedgerResult<NodeStatus> {
        let path = format!("/v2/status/wait-for-block-after/{}", round);
        self.get_json("wait_for_block_after", &path, self.wait_timeout)
            .await
    }

    /// Balance and holdings of an account.
    pub async fn account_information(&self, address: &Address) -> LedgerResult<AccountInfo> {
        let path = format!("/v2/accounts/{}", address);
        self.get_json("account_information", &path, self.timeout_duration)
            .await
    }

    /// Check if the node is reachable.
    pub async fn is_healthy(&self) -> bool {
        self.status().await.is_ok()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }
}

/// Map non-success HTTP statuses onto ledger errors.
async fn check_status(response: reqwest::Response) -> LedgerResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let code = status.as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or(body);

    Err(match code {
        401 | 403 => LedgerError::Unauthorized(code),
        404 => LedgerError::NotFound(message),
        400..=499 => LedgerError::Rejected(message),
        _ => LedgerError::Transport(format!("HTTP {}: {}", code, message)),
    })
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClient")
            .field("endpoints", &self.endpoints)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> NodeConfig {
        NodeConfig {
            // Nothing listens on port 1.
            url: "http://127.0.0.1:1".to_string(),
            failover_urls: Vec::new(),
            token: "test-token".to_string(),
            rpc_timeout_secs: 2,
            wait_timeout_secs: 2,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = NodeClient::new(test_config()).unwrap();
        assert_eq!(client.endpoints, vec!["http://127.0.0.1:1".to_string()]);
    }

    #[test]
    fn test_invalid_url_rejected() {
        let mut config = test_config();
        config.url = "not a url".into();
        let err = NodeClient::new(config).unwrap_err();
        assert!(err.to_string().contains("Invalid node URL"));
    }

    #[test]
    fn test_invalid_failover_ignored() {
        let mut config = test_config();
        config.failover_urls = vec!["::".into(), "http://127.0.0.1:2/".into()];
        let client = NodeClient::new(config).unwrap();
        assert_eq!(client.endpoints.len(), 2);
        assert_eq!(client.endpoints[1], "http://127.0.0.1:2");
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transient() {
        let mut config = test_config();
        config.failover_urls.push("http://127.0.0.1:2".to_string());
        let client = NodeClient::new(config).unwrap();

        let err = client.status().await.unwrap_err();
        assert!(err.is_retryable());
        assert!(!client.is_healthy().await);
    }

    #[test]
    fn test_pending_response_mapping() {
        let confirmed: PendingResponse =
            serde_json::from_str(r#"{"confirmed-round": 12, "pool-error": "", "asset-index": 99}"#)
                .unwrap();
        assert_eq!(
            confirmed.into_status(),
            TxStatus::Confirmed {
                round: 12,
                asset_index: Some(99)
            }
        );

        let rejected: PendingResponse =
            serde_json::from_str(r#"{"pool-error": "overspend"}"#).unwrap();
        assert_eq!(
            rejected.into_status(),
            TxStatus::Rejected {
                reason: "overspend".into()
            }
        );

        let pending: PendingResponse =
            serde_json::from_str(r#"{"confirmed-round": 0, "pool-error": ""}"#).unwrap();
        assert_eq!(pending.into_status(), TxStatus::Pending);
    }

    #[test]
    fn test_params_decoding() {
        let response: ParamsResponse = serde_json::from_str(
            r#"{
                "consensus-version": "future",
                "fee": 0,
                "genesis-hash": "SGO1GKSzyE7IEPItTxCByw9x8FmnrCDexi9/cOUJOiI=",
                "genesis-id": "testnet-v1.0",
                "last-round": 42,
                "min-fee": 1000
            }"#,
        )
        .unwrap();
        let params = response.into_params().unwrap();
        assert_eq!(params.last_round, 42);
        assert_eq!(params.min_fee, 1000);
        assert_eq!(params.genesis_id, "testnet-v1.0");
        assert!(!params.flat_fee);
    }

    #[test]
    fn test_bad_genesis_hash() {
        let response = ParamsResponse {
            consensus_version: String::new(),
            fee: 0,
            genesis_hash: "AAAA".into(),
            genesis_id: "x".into(),
            last_round: 1,
            min_fee: 1000,
        };
        assert!(matches!(response.into_params(), Err(LedgerError::Decode(_))));
    }
}

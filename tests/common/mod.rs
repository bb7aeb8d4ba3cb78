//! In-process mock ledger node for integration tests.
//!
//! Accepts signed bundles, checks signatures and group stamps the way a real
//! node does, and advances one round per `wait-for-block-after` call.
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use data_encoding::{BASE32_NOPAD, BASE64};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use rmpv::Value;
use serde_json::json;
use tokio::net::TcpListener;

use atomic_transfer::config::NodeConfig;
use atomic_transfer::ledger::encoding::{encode_value, hash_with_prefix, GROUP_PREFIX, TX_PREFIX};
use atomic_transfer::ledger::{Address, NodeClient, TxId};

pub const GENESIS_HASH: [u8; 32] = [7; 32];
pub const GENESIS_ID: &str = "mocknet-v1";
pub const MIN_FEE: u64 = 1000;
pub const START_ROUND: u64 = 500;
pub const FIRST_ASSET_INDEX: u64 = 1000;

/// Knobs for injecting node behaviour.
#[derive(Debug, Clone)]
pub struct Behaviour {
    /// Include accepted transactions in the next round.
    pub confirm: bool,
    /// Evict accepted transactions with this pool error.
    pub pool_error: Option<String>,
    /// Answer this many submissions with 503 before accepting.
    pub submit_failures: u32,
    /// Delay before a wait-for-block call returns.
    pub block_delay_ms: u64,
    /// Rounds a wait-for-block call moves past the requested round.
    pub round_step: u64,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            confirm: true,
            pool_error: None,
            submit_failures: 0,
            block_delay_ms: 10,
            round_step: 1,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    confirm_round: Option<u64>,
    pool_error: Option<String>,
    asset_index: Option<u64>,
}

#[derive(Debug)]
struct NodeState {
    round: u64,
    token: String,
    behaviour: Behaviour,
    entries: HashMap<String, Entry>,
    next_asset_index: u64,
    submit_attempts: u32,
    bundles_accepted: u32,
    pending_queries: u32,
}

type Shared = Arc<Mutex<NodeState>>;
type Reply = (StatusCode, Json<serde_json::Value>);

/// Handle to a running mock node.
pub struct MockNode {
    addr: SocketAddr,
    state: Shared,
}

impl MockNode {
    pub async fn start() -> Self {
        Self::start_with(Behaviour::default()).await
    }

    pub async fn start_with(behaviour: Behaviour) -> Self {
        let state = Arc::new(Mutex::new(NodeState {
            round: START_ROUND,
            token: NodeConfig::default().token,
            behaviour,
            entries: HashMap::new(),
            next_asset_index: FIRST_ASSET_INDEX,
            submit_attempts: 0,
            bundles_accepted: 0,
            pending_queries: 0,
        }));

        let app = Router::new()
            .route("/v2/transactions/params", get(params))
            .route("/v2/transactions", post(submit))
            .route("/v2/transactions/pending/{txid}", get(pending))
            .route("/v2/status", get(status))
            .route("/v2/status/wait-for-block-after/{round}", get(wait_for_block))
            .route("/v2/accounts/{address}", get(account))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn config(&self) -> NodeConfig {
        NodeConfig {
            url: self.url(),
            rpc_timeout_secs: 2,
            wait_timeout_secs: 2,
            ..NodeConfig::default()
        }
    }

    pub fn client(&self) -> NodeClient {
        NodeClient::new(self.config()).unwrap()
    }

    pub fn update(&self, f: impl FnOnce(&mut Behaviour)) {
        f(&mut self.state.lock().unwrap().behaviour);
    }

    pub fn round(&self) -> u64 {
        self.state.lock().unwrap().round
    }

    pub fn knows(&self, txid: &TxId) -> bool {
        self.state.lock().unwrap().entries.contains_key(txid.as_str())
    }

    pub fn submit_attempts(&self) -> u32 {
        self.state.lock().unwrap().submit_attempts
    }

    pub fn bundles_accepted(&self) -> u32 {
        self.state.lock().unwrap().bundles_accepted
    }

    pub fn pending_queries(&self) -> u32 {
        self.state.lock().unwrap().pending_queries
    }
}

/// Node config whose primary endpoint refuses connections.
pub fn dead_endpoint_config() -> NodeConfig {
    NodeConfig {
        url: "http://127.0.0.1:1".into(),
        rpc_timeout_secs: 1,
        wait_timeout_secs: 1,
        ..NodeConfig::default()
    }
}

fn error(code: StatusCode, message: impl Into<String>) -> Reply {
    (code, Json(json!({ "message": message.into() })))
}

fn authorize(state: &NodeState, headers: &HeaderMap) -> Result<(), Reply> {
    let token = headers
        .get("X-Algo-API-Token")
        .and_then(|v| v.to_str().ok());
    if token == Some(state.token.as_str()) {
        Ok(())
    } else {
        Err(error(StatusCode::UNAUTHORIZED, "Invalid API Token"))
    }
}

async fn params(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let state = state.lock().unwrap();
    if let Err(reply) = authorize(&state, &headers) {
        return reply;
    }
    (
        StatusCode::OK,
        Json(json!({
            "consensus-version": "mock-consensus-v1",
            "fee": 0,
            "genesis-hash": BASE64.encode(&GENESIS_HASH),
            "genesis-id": GENESIS_ID,
            "last-round": state.round,
            "min-fee": MIN_FEE,
        })),
    )
}

async fn status(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let state = state.lock().unwrap();
    if let Err(reply) = authorize(&state, &headers) {
        return reply;
    }
    (StatusCode::OK, Json(json!({ "last-round": state.round })))
}

async fn wait_for_block(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(round): Path<u64>,
) -> Reply {
    let (delay, step) = {
        let state = state.lock().unwrap();
        if let Err(reply) = authorize(&state, &headers) {
            return reply;
        }
        (state.behaviour.block_delay_ms, state.behaviour.round_step.max(1))
    };
    tokio::time::sleep(Duration::from_millis(delay)).await;

    let mut state = state.lock().unwrap();
    state.round = state.round.max(round.saturating_add(step));
    (StatusCode::OK, Json(json!({ "last-round": state.round })))
}

async fn pending(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(txid): Path<String>,
) -> Reply {
    let mut state = state.lock().unwrap();
    if let Err(reply) = authorize(&state, &headers) {
        return reply;
    }
    state.pending_queries += 1;
    let Some(entry) = state.entries.get(&txid) else {
        return error(StatusCode::NOT_FOUND, "txn does not exist");
    };

    if let Some(reason) = &entry.pool_error {
        return (
            StatusCode::OK,
            Json(json!({ "confirmed-round": 0, "pool-error": reason })),
        );
    }
    match entry.confirm_round {
        Some(round) if state.round >= round => (
            StatusCode::OK,
            Json(json!({
                "confirmed-round": round,
                "pool-error": "",
                "asset-index": entry.asset_index,
            })),
        ),
        _ => (StatusCode::OK, Json(json!({ "pool-error": "" }))),
    }
}

async fn account(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(address): Path<String>,
) -> Reply {
    let state = state.lock().unwrap();
    if let Err(reply) = authorize(&state, &headers) {
        return reply;
    }
    if address.parse::<Address>().is_err() {
        return error(StatusCode::BAD_REQUEST, "failed to parse the address");
    }
    (
        StatusCode::OK,
        Json(json!({ "address": address, "amount": 0, "min-balance": 100000, "assets": [] })),
    )
}

fn field<'a>(map: &'a [(Value, Value)], key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .map(|(_, v)| v)
}

fn as_array<const N: usize>(value: Option<&Value>) -> Option<[u8; N]> {
    value?.as_slice()?.try_into().ok()
}

struct Decoded {
    txid: String,
    ungrouped_id: [u8; 32],
    group: Option<[u8; 32]>,
    creates_asset: bool,
}

/// Check one signed record and compute its ids.
fn check_signed(signed: &Value) -> Result<Decoded, String> {
    let Value::Map(outer) = signed else {
        return Err("signed transaction is not a map".into());
    };
    let Some(Value::Map(txn)) = field(outer, "txn") else {
        return Err("missing txn".into());
    };

    let sender: [u8; 32] = as_array(field(txn, "snd")).ok_or("missing sender")?;
    let signer: [u8; 32] = as_array(field(outer, "sgnr")).unwrap_or(sender);
    let sig: [u8; 64] = as_array(field(outer, "sig")).ok_or("missing signature")?;
    let genesis: [u8; 32] = as_array(field(txn, "gh")).ok_or("missing genesis hash")?;

    if genesis != GENESIS_HASH {
        return Err("genesis hash mismatch".into());
    }
    if signer != sender {
        return Err(format!(
            "transaction should have been authorized by {} but was actually authorized by {}",
            Address::from_public_key(sender),
            Address::from_public_key(signer)
        ));
    }

    let encoded = encode_value(&Value::Map(txn.clone()));
    let key = VerifyingKey::from_bytes(&signer).map_err(|e| e.to_string())?;
    let mut message = TX_PREFIX.to_vec();
    message.extend_from_slice(&encoded);
    if key.verify(&message, &Signature::from_bytes(&sig)).is_err() {
        return Err("At least one signature didn't pass verification".into());
    }

    let ungrouped: Vec<(Value, Value)> = txn
        .iter()
        .filter(|(k, _)| k.as_str() != Some("grp"))
        .cloned()
        .collect();

    Ok(Decoded {
        txid: BASE32_NOPAD.encode(&hash_with_prefix(TX_PREFIX, &encoded)),
        ungrouped_id: hash_with_prefix(TX_PREFIX, &encode_value(&Value::Map(ungrouped))),
        group: as_array(field(txn, "grp")),
        creates_asset: field(txn, "type").and_then(Value::as_str) == Some("acfg"),
    })
}

fn check_group(records: &[Decoded]) -> Result<(), String> {
    if records.len() < 2 {
        return Ok(());
    }
    let txlist = records
        .iter()
        .map(|r| Value::Binary(r.ungrouped_id.to_vec()))
        .collect();
    let body = Value::Map(vec![(Value::from("txlist"), Value::Array(txlist))]);
    let expected = hash_with_prefix(GROUP_PREFIX, &encode_value(&body));
    if records.iter().all(|r| r.group == Some(expected)) {
        Ok(())
    } else {
        Err("incomplete group: group id does not match its members".into())
    }
}

async fn submit(State(state): State<Shared>, headers: HeaderMap, body: Bytes) -> Reply {
    let mut state = state.lock().unwrap();
    if let Err(reply) = authorize(&state, &headers) {
        return reply;
    }
    state.submit_attempts += 1;
    if state.behaviour.submit_failures > 0 {
        state.behaviour.submit_failures -= 1;
        return error(StatusCode::SERVICE_UNAVAILABLE, "node is catching up");
    }

    let mut cursor: &[u8] = &body;
    let mut records = Vec::new();
    while !cursor.is_empty() {
        let value = match rmpv::decode::read_value(&mut cursor) {
            Ok(value) => value,
            Err(e) => return error(StatusCode::BAD_REQUEST, format!("decode: {}", e)),
        };
        match check_signed(&value) {
            Ok(decoded) => records.push(decoded),
            Err(message) => return error(StatusCode::BAD_REQUEST, message),
        }
    }
    if records.is_empty() {
        return error(StatusCode::BAD_REQUEST, "empty bundle");
    }
    if let Err(message) = check_group(&records) {
        return error(StatusCode::BAD_REQUEST, message);
    }

    let confirm_round = state.behaviour.confirm.then_some(state.round + 1);
    let pool_error = state.behaviour.pool_error.clone();
    for record in &records {
        let asset_index = if record.creates_asset {
            let index = state.next_asset_index;
            state.next_asset_index += 1;
            Some(index)
        } else {
            None
        };
        state.entries.insert(
            record.txid.clone(),
            Entry {
                confirm_round,
                pool_error: pool_error.clone(),
                asset_index,
            },
        );
    }
    state.bundles_accepted += 1;

    (StatusCode::OK, Json(json!({ "txId": records[0].txid })))
}

//! Bundle submission.
//!
//! # Responsibilities
//! - Fail fast on malformed bundles before any network call
//! - Encode the bundle in wire order as one atomic payload
//! - Retry transport failures until a submission id is received
//! - Give up with [`LedgerError::Cancelled`] at the caller's time limit or on
//!   shutdown
//!
//! Node rejections (bad signature, overspend, fee too low, expired window)
//! are returned as [`LedgerError::Rejected`] for the whole bundle and are
//! never retried.

use tokio::time::{Duration, Instant};

use crate::ledger::client::NodeClient;
use crate::ledger::group::verify_group;
use crate::ledger::signer::SignedTransaction;
use crate::ledger::transaction::Transaction;
use crate::ledger::types::{LedgerError, LedgerResult, TxId};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::resilience::retries::{retry_transient, RetryPolicy};
use crate::resilience::timeouts::cancellable;

/// Sends signed bundles through an explicit node handle.
#[derive(Debug, Clone)]
pub struct Submitter {
    client: NodeClient,
    retry: RetryPolicy,
    limit: Option<Duration>,
    shutdown: Option<Shutdown>,
}

impl Submitter {
    pub fn new(client: NodeClient, retry: RetryPolicy) -> Self {
        Self {
            client,
            retry,
            limit: None,
            shutdown: None,
        }
    }

    /// Bound each submission, retries included, to `limit`.
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Abandon in-flight submissions when `shutdown` fires.
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Local checks a bundle must pass before it is sent.
    ///
    /// Bundles of more than one record must all carry the group id their
    /// records hash to.
    pub fn validate_bundle(bundle: &[SignedTransaction]) -> LedgerResult<()> {
        if bundle.is_empty() {
            return Err(LedgerError::Validation("bundle is empty".into()));
        }

        for signed in bundle {
            signed.transaction().validate()?;
        }

        if bundle.len() > 1 {
            let first = bundle[0].transaction().group();
            if first.is_none() {
                return Err(LedgerError::GroupMismatch(
                    "multi-record bundle is not grouped".into(),
                ));
            }
            if let Some(i) = bundle
                .iter()
                .position(|s| s.transaction().group() != first)
            {
                return Err(LedgerError::GroupMismatch(format!(
                    "member {} carries a different group id than member 0",
                    i
                )));
            }

            let records: Vec<Transaction> =
                bundle.iter().map(|s| s.transaction().clone()).collect();
            verify_group(&records)?;
        }
        Ok(())
    }

    /// Concatenated wire encodings, in bundle order.
    pub fn encode_bundle(bundle: &[SignedTransaction]) -> Vec<u8> {
        bundle.iter().flat_map(|s| s.encode()).collect()
    }

    /// Submit `bundle` as one atomic unit.
    pub async fn submit(&self, bundle: &[SignedTransaction]) -> LedgerResult<TxId> {
        Self::validate_bundle(bundle)?;

        let payload = Self::encode_bundle(bundle);
        let deadline = self.limit.map(|limit| Instant::now() + limit);
        let mut stop = self.shutdown.as_ref().map(Shutdown::subscribe);

        let (client, body) = (&self.client, payload.as_slice());
        let result = cancellable(
            retry_transient(&self.retry, "submit", move || client.send_raw(body)),
            deadline,
            stop.as_mut(),
        )
        .await;

        match result {
            Ok(txid) => {
                metrics::record_submission(bundle.len());
                tracing::info!(
                    txid = %txid,
                    size = bundle.len(),
                    bytes = payload.len(),
                    "Bundle submitted"
                );
                Ok(txid)
            }
            Err(e) => {
                if let LedgerError::Rejected(_) = e {
                    metrics::record_rejection();
                }
                tracing::warn!(size = bundle.len(), error = %e, "Bundle submission failed");
                Err(e)
            }
        }
    }

    /// Submit a single signed record.
    pub async fn submit_one(&self, signed: &SignedTransaction) -> LedgerResult<TxId> {
        self.submit(std::slice::from_ref(signed)).await
    }
}

//! Confirmation monitoring.
//!
//! # State Machine
//! ```text
//! Pending ── confirmed(round) ──▶ Confirmed
//!    │──── rejected(reason) ────▶ Failed(Rejected)
//!    │──── rounds exhausted ────▶ Failed(Timeout)
//!    │──── deadline/shutdown ───▶ Failed(Cancelled)
//!    └──── node unreachable ────▶ Failed(Transport)
//!
//! not-found / pending: stay Pending until the node reports the next round
//! ```
//!
//! One status query per round. Between queries the waiter blocks on the
//! node's wait-for-block call instead of polling inside a round.

use tokio::sync::broadcast;
use tokio::time::{Duration, Instant};

use crate::ledger::client::NodeClient;
use crate::ledger::types::{
    ConfirmationResult, FailureReason, LedgerError, Outcome, TxId, TxStatus,
};
use crate::observability::metrics;
use crate::resilience::retries::{retry_transient, RetryPolicy};
use crate::resilience::timeouts::cancellable;

#[derive(Debug, Clone, PartialEq, Eq)]
enum WaitState {
    Pending,
    Done(Outcome),
}

impl WaitState {
    /// Apply one status observation. Terminal states never change.
    fn observe(self, status: TxStatus) -> Self {
        match (self, status) {
            (WaitState::Pending, TxStatus::Confirmed { round, asset_index }) => {
                WaitState::Done(Outcome::Confirmed { round, asset_index })
            }
            (WaitState::Pending, TxStatus::Rejected { reason }) => {
                WaitState::Done(Outcome::Failed(FailureReason::Rejected(reason)))
            }
            (WaitState::Pending, TxStatus::NotFound | TxStatus::Pending) => WaitState::Pending,
            (done @ WaitState::Done(_), _) => done,
        }
    }
}

fn failure_from(error: LedgerError) -> Outcome {
    let reason = match error {
        LedgerError::Cancelled => FailureReason::Cancelled,
        e if e.is_retryable() => FailureReason::Transport(e.to_string()),
        e => FailureReason::Node(e.to_string()),
    };
    Outcome::Failed(reason)
}

fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Confirmed { .. } => "confirmed",
        Outcome::Failed(FailureReason::Rejected(_)) => "rejected",
        Outcome::Failed(FailureReason::Timeout { .. }) => "timeout",
        Outcome::Failed(FailureReason::Cancelled) => "cancelled",
        Outcome::Failed(FailureReason::Transport(_)) => "transport",
        Outcome::Failed(FailureReason::Node(_)) => "node_error",
    }
}

/// Waits for one submission to reach a terminal state.
///
/// Each waiter owns its polling state; run as many as needed concurrently.
#[derive(Debug)]
pub struct ConfirmationWaiter {
    client: NodeClient,
    retry: RetryPolicy,
    deadline: Option<Instant>,
    shutdown: Option<broadcast::Receiver<()>>,
}

impl ConfirmationWaiter {
    pub fn new(client: NodeClient) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
            deadline: None,
            shutdown: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Give up with a cancelled result at `deadline`.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, limit: Duration) -> Self {
        self.with_deadline(Instant::now() + limit)
    }

    /// Give up with a cancelled result when `shutdown` fires.
    pub fn with_shutdown(mut self, shutdown: broadcast::Receiver<()>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Wait up to `max_rounds` rounds for `txid` to confirm or be rejected.
    ///
    /// `max_rounds = 0` reports a timeout without querying the node.
    pub async fn await_confirmation(&mut self, txid: &TxId, max_rounds: u64) -> ConfirmationResult {
        let outcome = self.run(txid, max_rounds).await;
        metrics::record_confirmation(outcome_label(&outcome));

        match &outcome {
            Outcome::Confirmed { round, asset_index } => tracing::info!(
                txid = %txid,
                round = round,
                asset_index = ?asset_index,
                "Transaction confirmed"
            ),
            Outcome::Failed(reason) => tracing::warn!(
                txid = %txid,
                reason = %reason,
                "Transaction not confirmed"
            ),
        }

        ConfirmationResult {
            txid: txid.clone(),
            outcome,
        }
    }

    async fn run(&mut self, txid: &TxId, max_rounds: u64) -> Outcome {
        if max_rounds == 0 {
            return Outcome::Failed(FailureReason::Timeout { rounds: 0 });
        }

        let client = &self.client;
        let retry = &self.retry;
        let deadline = self.deadline;
        let shutdown = &mut self.shutdown;

        let status = match cancellable(
            retry_transient(retry, "status", move || client.status()),
            deadline,
            shutdown.as_mut(),
        )
        .await
        {
            Ok(status) => status,
            Err(e) => return failure_from(e),
        };

        // Budget counts rounds the node reports, not loop iterations.
        let start = status.last_round.saturating_add(1);
        let mut current = start;
        let mut state = WaitState::Pending;

        while current - start < max_rounds {
            match cancellable(client.pending_status(txid), deadline, shutdown.as_mut()).await {
                Ok(observed) => {
                    tracing::debug!(txid = %txid, round = current, status = ?observed, "Polled submission");
                    state = match state.observe(observed) {
                        WaitState::Done(outcome) => return outcome,
                        pending => pending,
                    };
                }
                Err(LedgerError::Cancelled) => return Outcome::Failed(FailureReason::Cancelled),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(txid = %txid, round = current, error = %e, "Status query failed, waiting for next round");
                }
                Err(e) => return failure_from(e),
            }

            let waited = cancellable(
                retry_transient(retry, "wait_for_block_after", move || {
                    client.wait_for_block_after(current)
                }),
                deadline,
                shutdown.as_mut(),
            )
            .await;
            current = match waited {
                Ok(status) => status.last_round.max(current.saturating_add(1)),
                Err(e) => return failure_from(e),
            };
        }

        Outcome::Failed(FailureReason::Timeout { rounds: max_rounds })
    }
}

/// Wait for `txid` with default retries and no deadline.
pub async fn await_confirmation(client: &NodeClient, txid: &TxId, max_rounds: u64) -> ConfirmationResult {
    ConfirmationWaiter::new(client.clone())
        .await_confirmation(txid, max_rounds)
        .await
}

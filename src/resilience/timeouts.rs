//! Timeout and cancellation enforcement.
//!
//! # Responsibilities
//! - Wrap node calls with a per-request timeout
//! - Abort a call when the caller's deadline passes or shutdown is triggered
//!
//! Timeout errors are transient ([`LedgerError::Timeout`]); cancellation is
//! not ([`LedgerError::Cancelled`]).

use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{sleep_until, timeout, Instant};

use crate::ledger::types::{LedgerError, LedgerResult};

/// Fail with [`LedgerError::Timeout`] if `fut` takes longer than `duration`.
pub async fn with_timeout<T, F>(duration: Duration, fut: F) -> LedgerResult<T>
where
    F: Future<Output = LedgerResult<T>>,
{
    match timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(LedgerError::Timeout(duration.as_secs())),
    }
}

/// Race `fut` against an optional deadline and an optional shutdown signal.
pub async fn cancellable<T, F>(
    fut: F,
    deadline: Option<Instant>,
    shutdown: Option<&mut broadcast::Receiver<()>>,
) -> LedgerResult<T>
where
    F: Future<Output = LedgerResult<T>>,
{
    let expired = async {
        match deadline {
            Some(at) => sleep_until(at).await,
            None => std::future::pending::<()>().await,
        }
    };

    let stopped = async {
        match shutdown {
            Some(rx) => match rx.recv().await {
                Ok(()) | Err(RecvError::Lagged(_)) => {}
                // Coordinator dropped without triggering.
                Err(RecvError::Closed) => std::future::pending::<()>().await,
            },
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = fut => result,
        _ = expired => Err(LedgerError::Cancelled),
        _ = stopped => Err(LedgerError::Cancelled),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;

    #[tokio::test]
    async fn test_timeout_maps_to_error() {
        let result: LedgerResult<()> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(LedgerError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_fast_future_wins() {
        let result = cancellable(async { Ok(3) }, None, None).await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_deadline_cancels() {
        let deadline = Instant::now() + Duration::from_millis(20);
        let result: LedgerResult<()> = cancellable(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
            Some(deadline),
            None,
        )
        .await;
        assert!(matches!(result, Err(LedgerError::Cancelled)));
    }

    #[tokio::test]
    async fn test_shutdown_cancels() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.trigger();
        });

        let result: LedgerResult<()> = cancellable(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
            None,
            Some(&mut rx),
        )
        .await;
        assert!(matches!(result, Err(LedgerError::Cancelled)));
    }

    #[tokio::test]
    async fn test_dropped_coordinator_does_not_cancel() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        drop(shutdown);

        let result = cancellable(
            async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(1)
            },
            None,
            Some(&mut rx),
        )
        .await;
        assert_eq!(result.unwrap(), 1);
    }
}

//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to ledger node:
//!     → timeouts.rs (enforce per-request timeout, caller deadline, shutdown)
//!     → On transient failure: retries.rs (retry with backoff)
//!     → backoff.rs (exponential delay with jitter)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every node call has a deadline
//! - Only transient errors are retried; rejections never are
//! - A submission is only retried until a submission id is received

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::{retry_transient, RetryPolicy};
pub use timeouts::{cancellable, with_timeout};

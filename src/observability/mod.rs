//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (submission and confirmation counters)
//! ```
//!
//! # Design Decisions
//! - Structured fields (txid, round, group size) on every ledger event
//! - Metrics go through the `metrics` facade; the host installs a recorder

pub mod logging;
pub mod metrics;

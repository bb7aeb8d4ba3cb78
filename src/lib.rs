//! Atomic ledger transfers.
//!
//! Builds groups of ledger transactions that apply all-or-nothing, signs each
//! member with its sender's key, submits the group as one bundle and waits
//! for a terminal outcome.

pub mod config;
pub mod ledger;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::AppConfig;
pub use ledger::{ConfirmationWaiter, NodeClient, Submitter, Wallet};
pub use lifecycle::Shutdown;

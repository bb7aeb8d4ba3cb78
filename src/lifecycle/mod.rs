//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Init logging → Build node client
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Pending confirmation waits return Cancelled → Exit
//!
//! Signals (signals.rs):
//!     SIGINT (Ctrl-C) → Trigger shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{start, AppContext, StartupError};

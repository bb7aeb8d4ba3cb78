//! Startup orchestration.
//!
//! Fail fast: any configuration or client construction error is fatal.

use std::path::Path;
use thiserror::Error;

use crate::config::loader::{load_or_default, ConfigError};
use crate::config::AppConfig;
use crate::ledger::{LedgerError, NodeClient};
use crate::lifecycle::Shutdown;
use crate::observability::logging::init_logging;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("node client: {0}")]
    Ledger(#[from] LedgerError),
}

/// Everything a pipeline needs, constructed once and passed down explicitly.
#[derive(Debug)]
pub struct AppContext {
    pub config: AppConfig,
    pub client: NodeClient,
    pub shutdown: Shutdown,
}

/// Load configuration, initialize logging and build the node client.
pub fn start(config_path: Option<&Path>) -> Result<AppContext, StartupError> {
    let config = load_or_default(config_path)?;
    init_logging(&config.observability);

    tracing::info!(
        node_url = %config.node.url,
        failover_urls = config.node.failover_urls.len(),
        max_rounds = config.confirmation.max_rounds,
        retries = config.retries.max_attempts,
        "Configuration loaded"
    );

    let client = NodeClient::new(config.node.clone())?;

    Ok(AppContext {
        config,
        client,
        shutdown: Shutdown::new(),
    })
}

//! Configuration validation.
//!
//! Returns every problem found, not just the first. Runs before the
//! configuration is used.

use std::fmt;

use crate::config::schema::AppConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check value ranges and URLs.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = url::Url::parse(&config.node.url) {
        errors.push(ValidationError::new("node.url", format!("invalid URL: {}", e)));
    }
    for failover in &config.node.failover_urls {
        if url::Url::parse(failover).is_err() {
            errors.push(ValidationError::new(
                "node.failover_urls",
                format!("invalid URL '{}'", failover),
            ));
        }
    }
    if config.node.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("node.rpc_timeout_secs", "must be positive"));
    }
    if config.node.wait_timeout_secs == 0 {
        errors.push(ValidationError::new("node.wait_timeout_secs", "must be positive"));
    }

    if config.confirmation.deadline_secs == Some(0) {
        errors.push(ValidationError::new(
            "confirmation.deadline_secs",
            "must be positive when set",
        ));
    }

    if config.retries.enabled {
        if config.retries.max_attempts == 0 {
            errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
        }
        if config.retries.base_delay_ms > config.retries.max_delay_ms {
            errors.push(ValidationError::new(
                "retries.base_delay_ms",
                "must not exceed retries.max_delay_ms",
            ));
        }
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if config.sale.royalty_bps > 10_000 {
        errors.push(ValidationError::new("sale.royalty_bps", "must be at most 10000"));
    }
    if config.sale.price == 0 {
        errors.push(ValidationError::new("sale.price", "must be positive"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Node endpoint host, e.g. "http://localhost".
pub const SERVER_ENV_VAR: &str = "ALGOD_SERVER";
/// Node endpoint port, appended to the server when set.
pub const PORT_ENV_VAR: &str = "ALGOD_PORT";
/// Node API token.
pub const TOKEN_ENV_VAR: &str = "ALGOD_TOKEN";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse configuration text without validating it.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;
    apply_env_overrides(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load from `path` when given, otherwise start from defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let mut config = AppConfig::default();
            apply_env_overrides(&mut config);
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

/// Apply `ALGOD_SERVER`, `ALGOD_PORT` and `ALGOD_TOKEN`.
pub fn apply_env_overrides(config: &mut AppConfig) {
    apply_overrides(
        config,
        std::env::var(SERVER_ENV_VAR).ok(),
        std::env::var(PORT_ENV_VAR).ok(),
        std::env::var(TOKEN_ENV_VAR).ok(),
    );
}

fn apply_overrides(
    config: &mut AppConfig,
    server: Option<String>,
    port: Option<String>,
    token: Option<String>,
) {
    if let Some(server) = server.filter(|s| !s.is_empty()) {
        let server = server.trim_end_matches('/');
        config.node.url = match port.filter(|p| !p.is_empty()) {
            Some(port) => format!("{}:{}", server, port),
            None => server.to_string(),
        };
    }
    if let Some(token) = token {
        config.node.token = token;
    }
}

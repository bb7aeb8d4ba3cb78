//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → node section handed to NodeClient, the rest to the pipeline
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty file (or none) is valid
//! - Node endpoint and token can come from ALGOD_SERVER / ALGOD_PORT / ALGOD_TOKEN
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::AppConfig;
pub use schema::ConfirmationConfig;
pub use schema::NodeConfig;
pub use schema::RetryConfig;
pub use schema::SaleConfig;

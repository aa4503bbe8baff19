//! Configuration management for Simplex.
//!
//! TOML configuration with `${VAR_NAME}` substitution, `SIMPLEX_*`
//! environment overrides, defaults for optional settings and validation on
//! load.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use simplex::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("simplex.toml")?;
//! println!("Terminology server: {}", config.terminology.base_url);
//! println!("Content job workers: {}", config.jobs.concurrency);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [terminology]
//! base_url = "https://snowstorm.example.com/snowstorm/snomed-ct"
//! username = "simplex"
//! password = "${SIMPLEX_TERMINOLOGY_PASSWORD}"
//!
//! [validation_service]
//! base_url = "https://rvf.example.com/api"
//!
//! [jobs]
//! concurrency = 4
//! expiry_days = 7
//!
//! [monitor]
//! initial_delay_seconds = 15
//! period_seconds = 5
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, Environment, JobsConfig, LoggingConfig, MonitorConfig,
    ReleaseServiceConfig, RetryConfig, ServiceConfig, SimplexConfig, TerminologyConfig,
    TranslationConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};

//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::cli::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "simplex.toml")]
    pub output: String,

    /// Include the optional service sections with comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Simplex configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Create a .env file with your credentials:");
                println!("     - Set SIMPLEX_TERMINOLOGY_USERNAME and SIMPLEX_TERMINOLOGY_PASSWORD");
                println!("  3. Validate configuration: simplex validate-config");
                println!("  4. Start the schedulers: simplex serve");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Simplex Configuration File

environment = "development"

[application]
log_level = "info"

[terminology]
base_url = "http://localhost:8080/snowstorm/snomed-ct"
username = "${SIMPLEX_TERMINOLOGY_USERNAME}"
password = "${SIMPLEX_TERMINOLOGY_PASSWORD}"
tls_verify = true
timeout_seconds = 60

[jobs]
concurrency = 4
expiry_days = 7

[monitor]
initial_delay_seconds = 15
period_seconds = 5

[logging]
local_enabled = false
local_path = "/var/log/simplex"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with every section and comments
    fn generate_config_with_examples() -> String {
        r#"# Simplex Configuration File
#
# ${VAR} references are replaced from the environment (and .env) when the
# file is loaded. SIMPLEX_* environment variables override file values.

# Runtime environment (development, staging, production)
# TLS verification cannot be disabled in production.
environment = "development"

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Terminology Server
# ============================================================================
[terminology]
# Base URL of the terminology server REST API
base_url = "http://localhost:8080/snowstorm/snomed-ct"

# Service account, used for scheduled work without a caller credential
username = "${SIMPLEX_TERMINOLOGY_USERNAME}"
password = "${SIMPLEX_TERMINOLOGY_PASSWORD}"

tls_verify = true
timeout_seconds = 60

# Poll interval while waiting for bulk member updates
bulk_poll_interval_ms = 1000

# Retries for idempotent reads
[terminology.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

# ============================================================================
# Release Service (release candidate and publish jobs)
# ============================================================================
[release_service]
base_url = "http://localhost:8081/release"
username = "${SIMPLEX_RELEASE_USERNAME}"
password = "${SIMPLEX_RELEASE_PASSWORD}"
release_center = "international"
timeout_seconds = 60

# ============================================================================
# Validation Service (validation jobs)
# ============================================================================
[validation_service]
base_url = "http://localhost:8082/validation"
timeout_seconds = 60

# ============================================================================
# Translation Platform (language initialisation jobs)
# ============================================================================
# [translation]
# base_url = "http://localhost:8083/api"
# token = "${SIMPLEX_TRANSLATION_TOKEN}"
# timeout_seconds = 60

# ============================================================================
# Jobs
# ============================================================================
[jobs]
# Content jobs run at the same time (1-64)
concurrency = 4

# Jobs older than this many days are dropped
expiry_days = 7
expiry_interval_seconds = 3600

# Serialize reconciliation runs on the same refset
serialize_refset_updates = true

# Directory for uploaded payload copies (system temp dir when unset)
# temp_dir = "/var/tmp/simplex"

# ============================================================================
# External Operation Monitor
# ============================================================================
[monitor]
initial_delay_seconds = 15
period_seconds = 5

# ============================================================================
# Logging
# ============================================================================
[logging]
# JSON log files next to the console output
local_enabled = false
local_path = "/var/log/simplex"

# Log rotation (daily or hourly)
local_rotation = "daily"
"#
        .to_string()
    }
}

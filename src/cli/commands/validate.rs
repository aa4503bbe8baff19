//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Simplex configuration file.

use crate::cli::{EXIT_CONFIG, EXIT_OK};
use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    ///
    /// Loading already validates; every failure is a configuration error.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(EXIT_CONFIG);
            }
        };

        let configured = |present: bool| if present { "configured" } else { "not configured" };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Terminology Server: {}", config.terminology.base_url);
        println!(
            "  Release Service: {}",
            configured(config.release_service.is_some())
        );
        println!(
            "  Validation Service: {}",
            configured(config.validation_service.is_some())
        );
        println!(
            "  Translation Platform: {}",
            configured(config.translation.is_some())
        );
        println!("  Job Concurrency: {}", config.jobs.concurrency);
        println!("  Job Expiry: {} days", config.jobs.expiry_days);
        println!(
            "  Monitor: first sweep after {}s, then every {}s",
            config.monitor.initial_delay_seconds, config.monitor.period_seconds
        );
        println!();
        Ok(EXIT_OK)
    }
}

//! Configuration schema types
//!
//! This module defines the configuration structure for Simplex.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};

/// Runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

/// Main Simplex configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimplexConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,

    /// Terminology server connection
    pub terminology: TerminologyConfig,

    /// Release build service (required for release candidate and publish jobs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_service: Option<ReleaseServiceConfig>,

    /// Validation service (required for validation jobs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_service: Option<ServiceConfig>,

    /// Translation platform (required for language initialisation jobs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationConfig>,

    /// Job executor and registry settings
    #[serde(default)]
    pub jobs: JobsConfig,

    /// External operation monitor settings
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimplexConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.terminology.validate(&self.environment)?;
        if let Some(release) = &self.release_service {
            release.validate()?;
        }
        if let Some(validation) = &self.validation_service {
            validation.validate("validation_service")?;
        }
        if let Some(translation) = &self.translation {
            translation.validate()?;
        }
        self.jobs.validate()?;
        self.monitor.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Retry configuration for idempotent reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Terminology server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminologyConfig {
    /// Base URL of the terminology server REST API
    pub base_url: String,

    /// Service account username, used when a job carries no caller credential
    #[serde(default)]
    pub username: Option<String>,

    /// Service account password
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,

    /// TLS certificate verification enabled
    ///
    /// Disabling verification is rejected in production environments.
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Poll interval while waiting for a bulk member job
    #[serde(default = "default_bulk_poll_interval_ms")]
    pub bulk_poll_interval_ms: u64,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl TerminologyConfig {
    fn validate(&self, environment: &Environment) -> Result<(), String> {
        use secrecy::ExposeSecret;

        validate_base_url("terminology", &self.base_url)?;

        if self.username.as_deref().is_some_and(|u| !u.is_empty())
            && self
                .password
                .as_ref()
                .map(|p| p.expose_secret().is_empty())
                .unwrap_or(true)
        {
            return Err(
                "terminology.password cannot be empty when terminology.username is set"
                    .to_string(),
            );
        }

        if *environment == Environment::Production && !self.tls_verify {
            return Err(
                "TLS certificate verification cannot be disabled in production environments"
                    .to_string(),
            );
        }

        if self.timeout_seconds == 0 {
            return Err("terminology.timeout_seconds must be > 0".to_string());
        }

        if self.bulk_poll_interval_ms == 0 {
            return Err("terminology.bulk_poll_interval_ms must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for TerminologyConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/snowstorm/snomed-ct".to_string(),
            username: None,
            password: None,
            tls_verify: true,
            timeout_seconds: default_timeout_seconds(),
            bulk_poll_interval_ms: default_bulk_poll_interval_ms(),
            retry: RetryConfig::default(),
        }
    }
}

/// Connection settings shared by the HTTP services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the service
    pub base_url: String,

    /// Service account username
    #[serde(default)]
    pub username: Option<String>,

    /// Service account password
    #[serde(default)]
    pub password: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl ServiceConfig {
    fn validate(&self, section: &str) -> Result<(), String> {
        validate_base_url(section, &self.base_url)?;
        if self.timeout_seconds == 0 {
            return Err(format!("{section}.timeout_seconds must be > 0"));
        }
        Ok(())
    }
}

/// Release build service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseServiceConfig {
    #[serde(flatten)]
    pub service: ServiceConfig,

    /// Release center that owns the products built for code systems
    #[serde(default = "default_release_center")]
    pub release_center: String,
}

impl ReleaseServiceConfig {
    fn validate(&self) -> Result<(), String> {
        self.service.validate("release_service")?;
        if self.release_center.trim().is_empty() {
            return Err("release_service.release_center cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Translation platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Base URL of the translation platform API
    pub base_url: String,

    /// API token
    #[serde(default)]
    pub token: Option<SecretString>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl TranslationConfig {
    fn validate(&self) -> Result<(), String> {
        validate_base_url("translation", &self.base_url)?;
        if self.timeout_seconds == 0 {
            return Err("translation.timeout_seconds must be > 0".to_string());
        }
        Ok(())
    }
}

/// Job executor and registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Number of content jobs run at the same time
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Jobs older than this are dropped from the registry
    #[serde(default = "default_expiry_days")]
    pub expiry_days: u32,

    /// How often the expiry sweep runs
    #[serde(default = "default_expiry_interval_seconds")]
    pub expiry_interval_seconds: u64,

    /// Serialize reconciliation runs that target the same refset
    #[serde(default = "default_true")]
    pub serialize_refset_updates: bool,

    /// Directory for job payload copies (system temp dir when unset)
    #[serde(default)]
    pub temp_dir: Option<String>,
}

impl JobsConfig {
    fn validate(&self) -> Result<(), String> {
        if !(1..=64).contains(&self.concurrency) {
            return Err(format!(
                "jobs.concurrency must be between 1 and 64, got {}",
                self.concurrency
            ));
        }
        if self.expiry_days == 0 {
            return Err("jobs.expiry_days must be > 0".to_string());
        }
        if self.expiry_interval_seconds == 0 {
            return Err("jobs.expiry_interval_seconds must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            expiry_days: default_expiry_days(),
            expiry_interval_seconds: default_expiry_interval_seconds(),
            serialize_refset_updates: true,
            temp_dir: None,
        }
    }
}

/// External operation monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Delay before the first sweep
    #[serde(default = "default_initial_delay_seconds")]
    pub initial_delay_seconds: u64,

    /// Time between sweeps
    #[serde(default = "default_period_seconds")]
    pub period_seconds: u64,
}

impl MonitorConfig {
    fn validate(&self) -> Result<(), String> {
        if self.period_seconds == 0 {
            return Err("monitor.period_seconds must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            initial_delay_seconds: default_initial_delay_seconds(),
            period_seconds: default_period_seconds(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily or hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

fn validate_base_url(section: &str, base_url: &str) -> Result<(), String> {
    if base_url.is_empty() {
        return Err(format!("{section}.base_url cannot be empty"));
    }
    let parsed = url::Url::parse(base_url)
        .map_err(|e| format!("{section}.base_url is not a valid URL: {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(format!("{section}.base_url must start with http:// or https://"));
    }
    Ok(())
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_bulk_poll_interval_ms() -> u64 {
    1000
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_retries() -> usize {
    3
}

fn default_release_center() -> String {
    "simplex".to_string()
}

fn default_concurrency() -> usize {
    4
}

fn default_expiry_days() -> u32 {
    7
}

fn default_expiry_interval_seconds() -> u64 {
    3600
}

fn default_initial_delay_seconds() -> u64 {
    15
}

fn default_period_seconds() -> u64 {
    5
}

fn default_local_path() -> String {
    "/var/log/simplex".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

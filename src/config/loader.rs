//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::SimplexConfig;
use super::secret::secret_string;
use crate::domain::errors::SimplexError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into SimplexConfig
/// 4. Applies environment variable overrides (SIMPLEX_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`SimplexError::Configuration`] if the file is missing or
/// unreadable, a referenced variable is unset, parsing fails, or validation
/// fails.
///
/// # Examples
///
/// ```no_run
/// use simplex::config::loader::load_config;
///
/// let config = load_config("simplex.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SimplexConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SimplexError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SimplexError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(contents: &str) -> Result<SimplexConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: SimplexConfig = toml::from_str(&contents)
        .map_err(|e| SimplexError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        SimplexError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| SimplexError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(SimplexError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Applies environment variable overrides using SIMPLEX_* prefix
///
/// Environment variables follow the pattern: SIMPLEX_<SECTION>_<KEY>
/// For example: SIMPLEX_TERMINOLOGY_BASE_URL, SIMPLEX_JOBS_CONCURRENCY.
/// Values that fail to parse are ignored.
fn apply_env_overrides(config: &mut SimplexConfig) {
    if let Ok(val) = std::env::var("SIMPLEX_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Terminology overrides
    if let Ok(val) = std::env::var("SIMPLEX_TERMINOLOGY_BASE_URL") {
        config.terminology.base_url = val;
    }
    if let Ok(val) = std::env::var("SIMPLEX_TERMINOLOGY_USERNAME") {
        config.terminology.username = Some(val);
    }
    if let Ok(val) = std::env::var("SIMPLEX_TERMINOLOGY_PASSWORD") {
        config.terminology.password = Some(secret_string(val));
    }
    if let Some(val) = env_parse("SIMPLEX_TERMINOLOGY_TLS_VERIFY") {
        config.terminology.tls_verify = val;
    }
    if let Some(val) = env_parse("SIMPLEX_TERMINOLOGY_TIMEOUT_SECONDS") {
        config.terminology.timeout_seconds = val;
    }

    // Service overrides (only if the section is configured)
    if let Some(ref mut release) = config.release_service {
        if let Ok(val) = std::env::var("SIMPLEX_RELEASE_SERVICE_BASE_URL") {
            release.service.base_url = val;
        }
        if let Ok(val) = std::env::var("SIMPLEX_RELEASE_SERVICE_PASSWORD") {
            release.service.password = Some(secret_string(val));
        }
    }
    if let Some(ref mut validation) = config.validation_service {
        if let Ok(val) = std::env::var("SIMPLEX_VALIDATION_SERVICE_BASE_URL") {
            validation.base_url = val;
        }
        if let Ok(val) = std::env::var("SIMPLEX_VALIDATION_SERVICE_PASSWORD") {
            validation.password = Some(secret_string(val));
        }
    }
    if let Some(ref mut translation) = config.translation {
        if let Ok(val) = std::env::var("SIMPLEX_TRANSLATION_BASE_URL") {
            translation.base_url = val;
        }
        if let Ok(val) = std::env::var("SIMPLEX_TRANSLATION_TOKEN") {
            translation.token = Some(secret_string(val));
        }
    }

    // Jobs and monitor overrides
    if let Some(val) = env_parse("SIMPLEX_JOBS_CONCURRENCY") {
        config.jobs.concurrency = val;
    }
    if let Some(val) = env_parse("SIMPLEX_JOBS_EXPIRY_DAYS") {
        config.jobs.expiry_days = val;
    }
    if let Some(val) = env_parse("SIMPLEX_JOBS_SERIALIZE_REFSET_UPDATES") {
        config.jobs.serialize_refset_updates = val;
    }
    if let Some(val) = env_parse("SIMPLEX_MONITOR_PERIOD_SECONDS") {
        config.monitor.period_seconds = val;
    }

    // Logging overrides
    if let Some(val) = env_parse("SIMPLEX_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val;
    }
    if let Ok(val) = std::env::var("SIMPLEX_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

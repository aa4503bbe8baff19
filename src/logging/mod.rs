//! Logging and observability
//!
//! Structured logging through `tracing`: console output, optional rotating
//! JSON files, and a handful of macros for the events every job emits.
//!
//! # Example
//!
//! ```no_run
//! use simplex::logging::init_logging;
//! use simplex::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, parse_log_level, LoggingGuard};

/// Log target used for support register entries
pub const SUPPORT_TARGET: &str = "simplex::support";

/// Log a job entering IN_PROGRESS
///
/// # Example
///
/// ```no_run
/// use simplex::log_job_start;
///
/// log_job_start!("SNOMEDCT-XX", "0b1f0c3e", "Update refset");
/// ```
#[macro_export]
macro_rules! log_job_start {
    ($code_system:expr, $job_id:expr, $display:expr) => {
        tracing::info!(
            code_system = %$code_system,
            job_id = %$job_id,
            display = %$display,
            "Job started"
        );
    };
}

/// Log a job reaching a terminal status
///
/// # Example
///
/// ```no_run
/// use simplex::log_job_finish;
/// use std::time::Duration;
///
/// log_job_finish!("SNOMEDCT-XX", "0b1f0c3e", "COMPLETE", Duration::from_secs(3));
/// ```
#[macro_export]
macro_rules! log_job_finish {
    ($code_system:expr, $job_id:expr, $status:expr, $duration:expr) => {
        tracing::info!(
            code_system = %$code_system,
            job_id = %$job_id,
            status = %$status,
            duration_ms = $duration.as_millis() as u64,
            "Job finished"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use simplex::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}

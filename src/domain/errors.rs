//! Domain error types
//!
//! This module defines the error hierarchy for Simplex. Adapter errors never
//! expose third-party HTTP client types, and every error can be classified into
//! the terminal [`JobStatus`] a job should end in.

use crate::domain::job::JobStatus;
use thiserror::Error;

/// Main Simplex error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum SimplexError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Terminology store errors
    #[error("Terminology server error: {0}")]
    Terminology(#[from] TerminologyError),

    /// Release, validation or translation service errors
    #[error("External service error: {0}")]
    ExternalService(#[from] ExternalServiceError),

    /// A recognised problem with the user's content rather than the system
    ///
    /// The status decides how the job ends; it should be one of the content
    /// statuses, never `Queued` or `InProgress`.
    #[error("{message}")]
    Content { status: JobStatus, message: String },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Job bookkeeping errors
    #[error("Job error: {0}")]
    Job(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An error wrapped with information about where it happened
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<SimplexError>,
    },

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl SimplexError {
    /// Content error the user must fix before resubmitting
    pub fn user_content(message: impl Into<String>) -> Self {
        Self::Content {
            status: JobStatus::UserContentError,
            message: message.into(),
        }
    }

    /// Recognised content conflict that needs a content author, not an engineer
    pub fn technical_content(message: impl Into<String>) -> Self {
        Self::Content {
            status: JobStatus::TechnicalContentIssue,
            message: message.into(),
        }
    }

    /// Classify the error into the terminal status a job should end in
    ///
    /// Content errors keep their own status, context wrappers are looked
    /// through, and everything else is a system error.
    pub fn job_status(&self) -> JobStatus {
        match self {
            Self::Content { status, .. } if status.is_terminal() => *status,
            Self::Context { source, .. } => source.job_status(),
            _ => JobStatus::SystemError,
        }
    }

    /// Whether the error came from the network rather than from a response
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Terminology(TerminologyError::ConnectionFailed(_))
            | Self::Terminology(TerminologyError::Timeout(_))
            | Self::ExternalService(ExternalServiceError::ConnectionFailed { .. })
            | Self::ExternalService(ExternalServiceError::Timeout { .. }) => true,
            Self::Context { source, .. } => source.is_transport(),
            _ => false,
        }
    }
}

/// Terminology store errors
///
/// Errors that occur when talking to the terminology server.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum TerminologyError {
    /// Failed to connect to the terminology server
    #[error("Failed to connect to terminology server: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Invalid or empty response from server
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// A create/update request carried the same member id twice
    #[error("create/update request contains a duplicate member id {0}")]
    DuplicateMemberId(String),

    /// A server-side asynchronous job ended in failure
    #[error("Async job failed: {0}")]
    AsyncJobFailed(String),

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

/// Errors from the release, validation and translation services
#[derive(Debug, Error)]
pub enum ExternalServiceError {
    /// Failed to connect to the service
    #[error("Failed to connect to {service}: {message}")]
    ConnectionFailed {
        service: &'static str,
        message: String,
    },

    /// Invalid or empty response from the service
    #[error("Invalid response from {service}: {message}")]
    InvalidResponse {
        service: &'static str,
        message: String,
    },

    /// Non-success status code
    #[error("{service} returned {status}: {message}")]
    Status {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// Timeout
    #[error("Request to {service} timed out: {message}")]
    Timeout {
        service: &'static str,
        message: String,
    },
}

// Conversion from std::io::Error
impl From<std::io::Error> for SimplexError {
    fn from(err: std::io::Error) -> Self {
        SimplexError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for SimplexError {
    fn from(err: serde_json::Error) -> Self {
        SimplexError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for SimplexError {
    fn from(err: toml::de::Error) -> Self {
        SimplexError::Configuration(format!("TOML parse error: {err}"))
    }
}

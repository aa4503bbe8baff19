//! Domain models and types for Simplex.
//!
//! This module contains the value types shared by the job framework, the
//! reconciliation engine and the service adapters.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`JobId`], [`ConceptId`])
//! - **Job values** ([`JobStatus`], [`JobType`], [`ChangeSummary`])
//! - **Refset content** ([`RefsetMember`], [`MemberIntent`], [`MapCorrelation`])
//! - **Scope** ([`CodeSystem`]) and caller identity ([`ExecutionContext`])
//! - **Error types** ([`SimplexError`], [`TerminologyError`], [`ExternalServiceError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, SimplexError>`]. When a job ends
//! in error, [`SimplexError::job_status`] decides which terminal status it gets:
//!
//! ```rust
//! use simplex::domain::{JobStatus, SimplexError};
//!
//! let err = SimplexError::user_content("Unrecognised map correlation");
//! assert_eq!(err.job_status(), JobStatus::UserContentError);
//! ```

pub mod code_system;
pub mod context;
pub mod errors;
pub mod execution;
pub mod ids;
pub mod job;
pub mod member;
pub mod result;

// Re-export commonly used types for convenience
pub use code_system::{BuildStatus, ClassificationStatus, CodeSystem, ValidationStatus};
pub use errors::{ExternalServiceError, SimplexError, TerminologyError};
pub use execution::{Credential, ExecutionContext};
pub use ids::{ConceptId, JobId};
pub use job::{ChangeSummary, JobStatus, JobType};
pub use member::{MapCorrelation, MemberIntent, RefsetMember};
pub use result::Result;

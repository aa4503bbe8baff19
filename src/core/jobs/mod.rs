//! Job records, their registry and the machinery that drives them
//!
//! - [`model`] - [`Job`] and its status transitions
//! - [`registry`] - per code system job lists with expiry
//! - [`executor`] - bounded execution of content jobs
//! - [`support`] - the support register for failures needing attention
//! - [`activity`] - start and end hooks
//! - [`orchestrator`] - the caller facing entry point tying it all together

pub mod activity;
pub mod executor;
pub mod model;
pub mod orchestrator;
pub mod registry;
pub mod support;

pub use activity::{ActivityLog, TracingActivityLog};
pub use executor::{JobExecutor, WorkOutcome};
pub use model::{ContentDetails, ExternalDetails, Job, JobSnapshot};
pub use orchestrator::{ExternalServices, JobOrchestrator, SubmittedJob};
pub use registry::{JobFilter, JobRegistry};
pub use support::SupportRegister;

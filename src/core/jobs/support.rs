//! Support register
//!
//! Problems the author cannot fix themselves are marked on the job and
//! written to the `simplex::support` log target in a fixed, greppable format
//! that operations alerting keys on.

use super::model::Job;
use crate::domain::JobStatus;
use crate::logging::SUPPORT_TARGET;
use std::fmt::Display;

/// Marks jobs that need support attention and logs them
#[derive(Debug, Clone, Copy, Default)]
pub struct SupportRegister;

impl SupportRegister {
    pub fn new() -> Self {
        Self
    }

    /// Fails the job with `SYSTEM_ERROR` and raises a system support issue
    pub fn handle_system_error(&self, job: &Job, message: &str, error: Option<&dyn Display>) {
        if let Some(error) = error {
            job.set_cause(error);
        }
        job.finish(
            JobStatus::SystemError,
            format!("{message} The support team have been made aware. Please try again later."),
        );

        let detail = match error {
            Some(error) => format!("{message} {error}"),
            None => message.to_string(),
        };
        tracing::error!(
            target: SUPPORT_TARGET,
            "Support Issue|System|CodeSystem:{}| Job:{},{}| MESSAGE:{}",
            job.code_system(),
            job.id(),
            job.display(),
            detail
        );
    }

    /// Fails the job with `TECHNICAL_CONTENT_ISSUE` and raises a content support issue
    pub fn handle_technical_content_issue(&self, job: &Job, message: &str) {
        job.finish(
            JobStatus::TechnicalContentIssue,
            format!("{}. Please contact support.", message.trim_end_matches('.')),
        );
        tracing::error!(
            target: SUPPORT_TARGET,
            "Support Issue|Content|CodeSystem:{}| Job:{},{}| MESSAGE:{}",
            job.code_system(),
            job.id(),
            job.display(),
            message
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::jobs::model::ContentDetails;
    use crate::domain::ExecutionContext;

    fn job() -> Job {
        let job = Job::content(
            "SNOMEDCT-XX",
            "Update refset",
            ContentDetails::default(),
            ExecutionContext::system(),
        );
        job.transition_to(JobStatus::InProgress);
        job
    }

    #[test]
    fn test_system_error_message() {
        let job = job();
        SupportRegister::new().handle_system_error(&job, "Unexpected error.", Some(&"boom"));

        assert_eq!(job.status(), JobStatus::SystemError);
        assert_eq!(
            job.error_message().as_deref(),
            Some("Unexpected error. The support team have been made aware. Please try again later.")
        );
    }

    #[test]
    fn test_technical_content_issue_message() {
        let job = job();
        SupportRegister::new()
            .handle_technical_content_issue(&job, "Logically equivalent concepts have been found");

        assert_eq!(job.status(), JobStatus::TechnicalContentIssue);
        assert_eq!(
            job.error_message().as_deref(),
            Some("Logically equivalent concepts have been found. Please contact support.")
        );
    }

    #[test]
    fn test_technical_content_issue_message_ending_in_period() {
        let job = job();
        SupportRegister::new()
            .handle_technical_content_issue(&job, "Logically equivalent concepts have been found.");

        assert_eq!(
            job.error_message().as_deref(),
            Some("Logically equivalent concepts have been found. Please contact support.")
        );
    }

    #[test]
    fn test_terminal_job_keeps_status() {
        let job = job();
        job.transition_to(JobStatus::Complete);
        SupportRegister::new().handle_technical_content_issue(&job, "Too late");
        assert_eq!(job.status(), JobStatus::Complete);
    }
}

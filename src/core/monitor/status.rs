//! Classification and validation status of a code system
//!
//! Derived on read from the latest job of each kind. Nothing is stored.

use super::operations::validation::report_outcome;
use crate::adapters::validation::ValidationReport;
use crate::core::jobs::Job;
use crate::domain::{ClassificationStatus, CodeSystem, JobStatus, ValidationStatus};

/// Classification status from the code system flag and the latest classify job
pub fn classification_status(code_system: &CodeSystem, latest: Option<&Job>) -> ClassificationStatus {
    if code_system.classified {
        return ClassificationStatus::Complete;
    }
    let Some(job) = latest else {
        return ClassificationStatus::Todo;
    };

    match job.status() {
        JobStatus::Queued | JobStatus::InProgress => ClassificationStatus::InProgress,
        JobStatus::TechnicalContentIssue => ClassificationStatus::EquivalentConcepts,
        JobStatus::Complete => ClassificationStatus::Complete,
        JobStatus::SystemError
        | JobStatus::UserContentError
        | JobStatus::UserContentWarning
        | JobStatus::ContentIssue => ClassificationStatus::SystemError,
    }
}

/// Validation status from the latest validation job
///
/// Turns `STALE` once the content head has moved past the job's snapshot.
pub fn validation_status_from_job(code_system: &CodeSystem, job: &Job) -> ValidationStatus {
    let status = match job.status() {
        JobStatus::Queued | JobStatus::InProgress => ValidationStatus::InProgress,
        JobStatus::UserContentError => ValidationStatus::ContentError,
        JobStatus::UserContentWarning => ValidationStatus::ContentWarning,
        JobStatus::Complete => ValidationStatus::Complete,
        JobStatus::SystemError | JobStatus::TechnicalContentIssue | JobStatus::ContentIssue => {
            ValidationStatus::SystemError
        }
    };
    apply_staleness(status, job.content_head_timestamp(), code_system)
}

/// Validation status recovered from a stored report when no job is known
pub fn validation_status_from_report(
    code_system: &CodeSystem,
    report: &ValidationReport,
) -> ValidationStatus {
    let status = match report_outcome(report) {
        Some((JobStatus::UserContentError, _)) => ValidationStatus::ContentError,
        Some((JobStatus::UserContentWarning, _)) => ValidationStatus::ContentWarning,
        Some((JobStatus::Complete, _)) => ValidationStatus::Complete,
        _ => ValidationStatus::Todo,
    };
    apply_staleness(status, report.content_head_timestamp(), code_system)
}

fn apply_staleness(
    status: ValidationStatus,
    validated_head: Option<i64>,
    code_system: &CodeSystem,
) -> ValidationStatus {
    match validated_head {
        Some(head) if status.can_turn_stale() && code_system.content_head_timestamp > head => {
            tracing::debug!(
                code_system = %code_system.short_name,
                validated_head = head,
                content_head = code_system.content_head_timestamp,
                "Validation is stale"
            );
            ValidationStatus::Stale
        }
        _ => status,
    }
}

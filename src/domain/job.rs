//! Job status, job type and change summary value types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a job
///
/// `Queued` and `InProgress` are the only non-terminal states. Every other
/// status is terminal and a job never leaves it, apart from a `SystemError`
/// being annotated with a more specific message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    InProgress,
    Complete,
    SystemError,
    UserContentError,
    UserContentWarning,
    TechnicalContentIssue,
    ContentIssue,
}

impl JobStatus {
    /// Whether the status is final
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Queued | Self::InProgress)
    }

    /// Whether a job may move from `self` to `next`
    ///
    /// Non-terminal states only move forward (`Queued` to `InProgress`, or
    /// either to a terminal state). Terminal states are final, with the single
    /// exception of `SystemError` re-asserting itself to carry a better message.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match (self, next) {
            (Self::Queued, _) => true,
            (Self::InProgress, Self::Queued) => false,
            (Self::InProgress, _) => true,
            (Self::SystemError, Self::SystemError) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::InProgress => "IN_PROGRESS",
            Self::Complete => "COMPLETE",
            Self::SystemError => "SYSTEM_ERROR",
            Self::UserContentError => "USER_CONTENT_ERROR",
            Self::UserContentWarning => "USER_CONTENT_WARNING",
            Self::TechnicalContentIssue => "TECHNICAL_CONTENT_ISSUE",
            Self::ContentIssue => "CONTENT_ISSUE",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job type discriminator used by list filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobType {
    /// Work run locally on the bounded executor
    Content,
    /// Work done by another service and tracked by the monitor
    ExternalService,
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "CONTENT" => Ok(Self::Content),
            "EXTERNAL_SERVICE" => Ok(Self::ExternalService),
            _ => Err(format!("Unknown job type: {s}")),
        }
    }
}

/// Counts describing what a content job changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    pub new_total: usize,
}

impl ChangeSummary {
    pub fn new(added: usize, updated: usize, removed: usize, new_total: usize) -> Self {
        Self {
            added,
            updated,
            removed,
            new_total,
        }
    }

    /// True when nothing was written
    pub fn is_unchanged(&self) -> bool {
        self.added == 0 && self.updated == 0 && self.removed == 0
    }
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "added {}, updated {}, removed {}, new total {}",
            self.added, self.updated, self.removed, self.new_total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(JobStatus::Queued, false ; "queued")]
    #[test_case(JobStatus::InProgress, false ; "in progress")]
    #[test_case(JobStatus::Complete, true ; "complete")]
    #[test_case(JobStatus::SystemError, true ; "system error")]
    #[test_case(JobStatus::UserContentError, true ; "user content error")]
    #[test_case(JobStatus::UserContentWarning, true ; "user content warning")]
    #[test_case(JobStatus::TechnicalContentIssue, true ; "technical content issue")]
    #[test_case(JobStatus::ContentIssue, true ; "content issue")]
    fn test_is_terminal(status: JobStatus, terminal: bool) {
        assert_eq!(status.is_terminal(), terminal);
    }

    #[test_case(JobStatus::Queued, JobStatus::InProgress, true ; "queued to in progress")]
    #[test_case(JobStatus::Queued, JobStatus::SystemError, true ; "queued to system error")]
    #[test_case(JobStatus::InProgress, JobStatus::Complete, true ; "in progress to complete")]
    #[test_case(JobStatus::InProgress, JobStatus::Queued, false ; "in progress back to queued")]
    #[test_case(JobStatus::Complete, JobStatus::InProgress, false ; "complete back to in progress")]
    #[test_case(JobStatus::Complete, JobStatus::SystemError, false ; "complete to system error")]
    #[test_case(JobStatus::UserContentError, JobStatus::Complete, false ; "user error to complete")]
    #[test_case(JobStatus::SystemError, JobStatus::SystemError, true ; "system error annotation")]
    #[test_case(JobStatus::SystemError, JobStatus::Complete, false ; "system error to complete")]
    fn test_can_transition_to(from: JobStatus, to: JobStatus, allowed: bool) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[test]
    fn test_status_serializes_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&JobStatus::TechnicalContentIssue).unwrap(),
            "\"TECHNICAL_CONTENT_ISSUE\""
        );
        assert_eq!(JobStatus::UserContentWarning.to_string(), "USER_CONTENT_WARNING");
    }

    #[test]
    fn test_job_type_from_str() {
        assert_eq!("content".parse::<JobType>().unwrap(), JobType::Content);
        assert_eq!(
            "external-service".parse::<JobType>().unwrap(),
            JobType::ExternalService
        );
        assert!("other".parse::<JobType>().is_err());
    }

    #[test]
    fn test_change_summary_serializes_camel_case() {
        let summary = ChangeSummary::new(1, 2, 3, 10);
        let json = serde_json::to_value(summary).unwrap();
        assert_eq!(json["newTotal"], 10);
        assert!(!summary.is_unchanged());
        assert!(ChangeSummary::default().is_unchanged());
    }
}

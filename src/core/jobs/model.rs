//! Job records and their lifecycle
//!
//! A [`Job`] is shared as `Arc<Job>` between the registry, the executor or
//! monitor that drives it, and callers reading snapshots. Immutable identity
//! lives on the struct; everything that changes while the job runs sits
//! behind a single mutex that is never held across an await.

use crate::domain::{ChangeSummary, ExecutionContext, JobId, JobStatus, JobType};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Fields specific to content jobs
#[derive(Debug, Clone, Default)]
pub struct ContentDetails {
    pub refset_id: Option<String>,
    pub original_filename: Option<String>,
}

/// Fields specific to external service jobs
#[derive(Debug, Clone)]
pub struct ExternalDetails {
    pub branch: String,
    /// Store modification clock when the job was submitted
    pub content_head_timestamp: i64,
}

#[derive(Debug, Clone)]
enum JobKind {
    Content(ContentDetails),
    External(ExternalDetails),
}

#[derive(Debug)]
struct JobState {
    status: JobStatus,
    error_message: Option<String>,
    cause: Option<String>,
    change_summary: Option<ChangeSummary>,
    link: Option<String>,
    records_total: u64,
    records_processed: u64,
    payload: Option<PathBuf>,
}

/// A unit of work and its lifecycle
#[derive(Debug)]
pub struct Job {
    id: JobId,
    code_system: String,
    display: String,
    created: DateTime<Utc>,
    context: ExecutionContext,
    kind: JobKind,
    state: Mutex<JobState>,
}

impl Job {
    /// A content job, created `QUEUED`
    pub fn content(
        code_system: impl Into<String>,
        display: impl Into<String>,
        details: ContentDetails,
        context: ExecutionContext,
    ) -> Self {
        Self::build(
            code_system.into(),
            display.into(),
            JobKind::Content(details),
            JobStatus::Queued,
            context,
        )
    }

    /// An external service job, created `IN_PROGRESS`
    pub fn external(
        code_system: impl Into<String>,
        display: impl Into<String>,
        details: ExternalDetails,
        context: ExecutionContext,
    ) -> Self {
        Self::build(
            code_system.into(),
            display.into(),
            JobKind::External(details),
            JobStatus::InProgress,
            context,
        )
    }

    fn build(
        code_system: String,
        display: String,
        kind: JobKind,
        status: JobStatus,
        context: ExecutionContext,
    ) -> Self {
        Self {
            id: JobId::generate(),
            code_system,
            display,
            created: Utc::now(),
            context,
            kind,
            state: Mutex::new(JobState {
                status,
                error_message: None,
                cause: None,
                change_summary: None,
                link: None,
                records_total: 0,
                records_processed: 0,
                payload: None,
            }),
        }
    }

    /// Overrides the creation time, e.g. when restoring jobs
    pub fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    fn state(&self) -> MutexGuard<'_, JobState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn code_system(&self) -> &str {
        &self.code_system
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn job_type(&self) -> JobType {
        match self.kind {
            JobKind::Content(_) => JobType::Content,
            JobKind::External(_) => JobType::ExternalService,
        }
    }

    pub fn refset_id(&self) -> Option<&str> {
        match &self.kind {
            JobKind::Content(details) => details.refset_id.as_deref(),
            JobKind::External(_) => None,
        }
    }

    pub fn original_filename(&self) -> Option<&str> {
        match &self.kind {
            JobKind::Content(details) => details.original_filename.as_deref(),
            JobKind::External(_) => None,
        }
    }

    pub fn branch(&self) -> Option<&str> {
        match &self.kind {
            JobKind::External(details) => Some(&details.branch),
            JobKind::Content(_) => None,
        }
    }

    pub fn content_head_timestamp(&self) -> Option<i64> {
        match &self.kind {
            JobKind::External(details) => Some(details.content_head_timestamp),
            JobKind::Content(_) => None,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state().status
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Moves the job to `next` if the state machine allows it
    ///
    /// Returns `false`, leaving the job untouched, when the move would leave a
    /// terminal status.
    pub fn transition_to(&self, next: JobStatus) -> bool {
        let mut state = self.state();
        Self::apply_transition(&self.id, &mut state, next)
    }

    /// Moves the job to a terminal status and records a message for the user
    pub fn finish(&self, status: JobStatus, message: impl Into<String>) -> bool {
        let mut state = self.state();
        if !Self::apply_transition(&self.id, &mut state, status) {
            return false;
        }
        state.error_message = Some(message.into());
        true
    }

    fn apply_transition(id: &JobId, state: &mut JobState, next: JobStatus) -> bool {
        if !state.status.can_transition_to(next) {
            tracing::warn!(
                job_id = %id,
                from = %state.status,
                to = %next,
                "Rejected job status transition"
            );
            return false;
        }
        state.status = next;
        true
    }

    /// Records the error that caused the job to fail
    pub fn set_cause(&self, cause: impl std::fmt::Display) {
        self.state().cause = Some(cause.to_string());
    }

    /// The message shown to the user; falls back to the causing error
    pub fn error_message(&self) -> Option<String> {
        let state = self.state();
        state.error_message.clone().or_else(|| state.cause.clone())
    }

    pub fn change_summary(&self) -> Option<ChangeSummary> {
        self.state().change_summary
    }

    pub fn set_change_summary(&self, summary: ChangeSummary) {
        self.state().change_summary = Some(summary);
    }

    pub fn link(&self) -> Option<String> {
        self.state().link.clone()
    }

    pub fn set_link(&self, link: impl Into<String>) {
        self.state().link = Some(link.into());
    }

    pub fn set_records_total(&self, total: u64) {
        self.state().records_total = total;
    }

    pub fn set_records_processed(&self, processed: u64) {
        self.state().records_processed = processed;
    }

    /// Sets progress as a percentage of `records_total`
    pub fn set_progress_percent(&self, percent: u8) {
        let mut state = self.state();
        let percent = u64::from(percent.min(100));
        state.records_processed = (state.records_total * percent + 50) / 100;
    }

    /// Returns `(processed, total)`
    pub fn progress(&self) -> (u64, u64) {
        let state = self.state();
        (state.records_processed, state.records_total)
    }

    pub(crate) fn set_payload(&self, path: PathBuf) {
        self.state().payload = Some(path);
    }

    pub fn payload(&self) -> Option<PathBuf> {
        self.state().payload.clone()
    }

    pub(crate) fn take_payload(&self) -> Option<PathBuf> {
        self.state().payload.take()
    }

    /// A serializable copy of the job's current state
    pub fn snapshot(&self) -> JobSnapshot {
        let state = self.state();
        JobSnapshot {
            id: self.id.clone(),
            code_system: self.code_system.clone(),
            display: self.display.clone(),
            job_type: self.job_type(),
            status: state.status,
            created: self.created,
            error_message: state.error_message.clone().or_else(|| state.cause.clone()),
            change_summary: state.change_summary,
            link: state.link.clone(),
            refset_id: self.refset_id().map(str::to_string),
            original_filename: self.original_filename().map(str::to_string),
            branch: self.branch().map(str::to_string),
            records_total: state.records_total,
            records_processed: state.records_processed,
        }
    }
}

/// Point-in-time view of a job returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub id: JobId,
    pub code_system: String,
    pub display: String,
    pub job_type: JobType,
    pub status: JobStatus,
    pub created: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_summary: Option<ChangeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refset_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub records_total: u64,
    pub records_processed: u64,
}

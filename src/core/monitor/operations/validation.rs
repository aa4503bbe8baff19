//! Content validation of the authoring branch

use super::metadata;
use crate::adapters::terminology::AuthoringStore;
use crate::adapters::validation::{ReportStatus, ValidationReport, ValidationService};
use crate::core::jobs::{Job, SupportRegister};
use crate::core::monitor::ExternalOperation;
use crate::domain::code_system::LATEST_VALIDATION_REPORT_KEY;
use crate::domain::{CodeSystem, ExecutionContext, JobStatus, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub const DISPLAY: &str = "Validate";

/// Job status and user message for a finished report
///
/// `None` while the report has no result yet.
pub fn report_outcome(report: &ValidationReport) -> Option<(JobStatus, Option<&'static str>)> {
    let result = report.test_result()?;
    let outcome = if result.total_failures > 0 {
        (
            JobStatus::UserContentError,
            Some("Validation errors were found in the content."),
        )
    } else if result.total_warnings > 0 {
        (
            JobStatus::UserContentWarning,
            Some("Validation warnings were found in the content."),
        )
    } else {
        (JobStatus::Complete, None)
    };
    Some(outcome)
}

pub struct ValidationOperation {
    store: Arc<dyn AuthoringStore>,
    validation: Arc<dyn ValidationService>,
    support: SupportRegister,
}

impl ValidationOperation {
    pub fn new(store: Arc<dyn AuthoringStore>, validation: Arc<dyn ValidationService>) -> Self {
        Self {
            store,
            validation,
            support: SupportRegister::new(),
        }
    }
}

#[async_trait]
impl ExternalOperation for ValidationOperation {
    type Request = ();

    fn display(&self) -> &'static str {
        DISPLAY
    }

    fn function_name(&self) -> &'static str {
        "validation"
    }

    fn api_issue_message(&self) -> &'static str {
        "Terminology Server or RVF API issue."
    }

    async fn start(
        &self,
        job: &Job,
        code_system: &CodeSystem,
        _request: &(),
        ctx: &ExecutionContext,
    ) -> Result<Option<String>> {
        let report_url = self.validation.start_validation(ctx, code_system).await?;
        tracing::info!(
            branch = %code_system.working_branch_path(),
            report = %report_url,
            "Created validation"
        );
        job.set_link(report_url.clone());

        self.store
            .upsert_branch_metadata(
                ctx,
                &code_system.branch_path,
                &metadata([(LATEST_VALIDATION_REPORT_KEY, report_url.as_str())]),
            )
            .await?;
        Ok(Some(report_url))
    }

    async fn poll(&self, job: &Job, report_url: &str, ctx: &ExecutionContext) -> Result<bool> {
        let report = self.validation.get_validation(ctx, report_url).await?;
        tracing::debug!(report = report_url, status = ?report.status, "Validation status");

        match report.status {
            ReportStatus::Complete => match report_outcome(&report) {
                Some((status, Some(message))) => {
                    job.finish(status, message);
                    Ok(true)
                }
                Some((status, None)) => {
                    job.transition_to(status);
                    Ok(true)
                }
                // Complete without a result yet; keep watching
                None => Ok(false),
            },
            ReportStatus::Failed => {
                let detail = report.message.unwrap_or_default();
                self.support
                    .handle_system_error(job, "RVF report failed.", Some(&detail));
                Ok(true)
            }
            ReportStatus::Queued | ReportStatus::Ready | ReportStatus::Running => Ok(false),
        }
    }
}

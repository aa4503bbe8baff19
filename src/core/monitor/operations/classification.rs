//! Classification of the authoring branch

use super::job_branch;
use crate::adapters::terminology::{AuthoringStore, ClassificationState};
use crate::core::jobs::{Job, SupportRegister};
use crate::core::monitor::ExternalOperation;
use crate::domain::{CodeSystem, ExecutionContext, JobStatus, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub const DISPLAY: &str = "Classify";

pub struct ClassificationOperation {
    store: Arc<dyn AuthoringStore>,
    support: SupportRegister,
}

impl ClassificationOperation {
    pub fn new(store: Arc<dyn AuthoringStore>) -> Self {
        Self {
            store,
            support: SupportRegister::new(),
        }
    }
}

#[async_trait]
impl ExternalOperation for ClassificationOperation {
    type Request = ();

    fn display(&self) -> &'static str {
        DISPLAY
    }

    fn function_name(&self) -> &'static str {
        "classification"
    }

    fn api_issue_message(&self) -> &'static str {
        "Terminology Server API issue."
    }

    async fn start(
        &self,
        job: &Job,
        _code_system: &CodeSystem,
        _request: &(),
        ctx: &ExecutionContext,
    ) -> Result<Option<String>> {
        let branch = job_branch(job)?;
        let classification_id = self.store.create_classification(ctx, branch).await?;
        tracing::info!(branch, classification_id = %classification_id, "Created classification");
        job.set_link(classification_id.clone());
        Ok(Some(classification_id))
    }

    async fn poll(&self, job: &Job, external_id: &str, ctx: &ExecutionContext) -> Result<bool> {
        let branch = job_branch(job)?;
        let classification = self.store.get_classification(ctx, branch, external_id).await?;
        tracing::debug!(branch, classification_id = external_id, status = ?classification.status, "Classification status");

        match classification.status {
            ClassificationState::Scheduled
            | ClassificationState::Running
            | ClassificationState::SavingInProgress => Ok(false),
            ClassificationState::Completed if classification.equivalent_concepts_found => {
                self.support.handle_technical_content_issue(
                    job,
                    "Logically equivalent concepts have been found.",
                );
                Ok(true)
            }
            ClassificationState::Completed => {
                self.store.save_classification(ctx, branch, external_id).await?;
                Ok(false)
            }
            ClassificationState::Saved => {
                job.transition_to(JobStatus::Complete);
                Ok(true)
            }
            ClassificationState::Failed => {
                self.support.handle_system_error(
                    job,
                    "Classification failed to run in Terminology Server.",
                    None,
                );
                Ok(true)
            }
            ClassificationState::SaveFailed => {
                self.support.handle_system_error(
                    job,
                    "Classification failed to save in Terminology Server.",
                    None,
                );
                Ok(true)
            }
            ClassificationState::Stale => {
                job.finish(
                    JobStatus::SystemError,
                    "Classification became stale because of new content changes. Please try again.",
                );
                Ok(true)
            }
        }
    }
}

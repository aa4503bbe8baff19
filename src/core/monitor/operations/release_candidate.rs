//! Release candidate builds

use super::metadata;
use crate::adapters::release::ReleaseService;
use crate::adapters::terminology::AuthoringStore;
use crate::core::jobs::{Job, SupportRegister};
use crate::core::monitor::ExternalOperation;
use crate::domain::code_system::{BuildStatus, BUILD_STATUS_KEY, LATEST_BUILD_KEY};
use crate::domain::{CodeSystem, ExecutionContext, JobStatus, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub const DISPLAY: &str = "Build release candidate";

#[derive(Debug, Clone, Copy)]
pub struct ReleaseCandidateRequest {
    /// `YYYYMMDD`
    pub effective_time: u32,
}

pub struct ReleaseCandidateOperation {
    store: Arc<dyn AuthoringStore>,
    release: Arc<dyn ReleaseService>,
    support: SupportRegister,
}

impl ReleaseCandidateOperation {
    pub fn new(store: Arc<dyn AuthoringStore>, release: Arc<dyn ReleaseService>) -> Self {
        Self {
            store,
            release,
            support: SupportRegister::new(),
        }
    }

    async fn record_build_status(&self, job: &Job, ctx: &ExecutionContext, status: BuildStatus) {
        let result = async {
            let code_system = self.store.get_code_system(ctx, job.code_system()).await?;
            self.store
                .upsert_branch_metadata(
                    ctx,
                    &code_system.branch_path,
                    &metadata([(BUILD_STATUS_KEY, status.as_str())]),
                )
                .await
        }
        .await;

        if let Err(e) = result {
            self.support.handle_system_error(
                job,
                "Failed to update build status in branch metadata.",
                Some(&e),
            );
        }
    }
}

#[async_trait]
impl ExternalOperation for ReleaseCandidateOperation {
    type Request = ReleaseCandidateRequest;

    fn display(&self) -> &'static str {
        DISPLAY
    }

    fn function_name(&self) -> &'static str {
        "Release Candidate Build"
    }

    fn api_issue_message(&self) -> &'static str {
        "SRS API issue."
    }

    async fn start(
        &self,
        job: &Job,
        code_system: &CodeSystem,
        request: &ReleaseCandidateRequest,
        ctx: &ExecutionContext,
    ) -> Result<Option<String>> {
        if let Some(latest) = code_system.latest_version_effective_date() {
            if request.effective_time <= latest {
                job.finish(
                    JobStatus::UserContentError,
                    format!(
                        "The latest version of this Code System is {latest}. The effective-time \
                         date of the new release candidate must be after the latest version."
                    ),
                );
                return Ok(None);
            }
        }

        let build_url = self
            .release
            .build_product(ctx, code_system, request.effective_time)
            .await?;
        job.set_link(build_url.clone());

        self.store
            .upsert_branch_metadata(
                ctx,
                &code_system.branch_path,
                &metadata([
                    (LATEST_BUILD_KEY, build_url.as_str()),
                    (BUILD_STATUS_KEY, BuildStatus::InProgress.as_str()),
                ]),
            )
            .await?;
        Ok(Some(build_url))
    }

    async fn poll(&self, job: &Job, build_url: &str, ctx: &ExecutionContext) -> Result<bool> {
        let build = self.release.get_build(ctx, build_url).await?;
        let status = BuildStatus::from_release_service(build.status.as_deref());
        tracing::debug!(build = build_url, status = status.as_str(), "Release candidate build status");

        match status {
            BuildStatus::Todo | BuildStatus::InProgress => Ok(false),
            BuildStatus::Failed => {
                self.support.handle_system_error(job, "SRS build failed.", None);
                self.record_build_status(job, ctx, status).await;
                Ok(true)
            }
            BuildStatus::Complete => {
                job.transition_to(JobStatus::Complete);
                self.record_build_status(job, ctx, status).await;
                Ok(true)
            }
        }
    }
}

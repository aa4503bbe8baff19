//! Publishing a completed release candidate
//!
//! Publishing takes hours on the release service side, so nothing is
//! monitored: the job stays `IN_PROGRESS` until it expires.

use crate::adapters::release::ReleaseService;
use crate::adapters::terminology::AuthoringStore;
use crate::core::jobs::Job;
use crate::core::monitor::ExternalOperation;
use crate::domain::{CodeSystem, ExecutionContext, Result, SimplexError};
use async_trait::async_trait;
use std::sync::Arc;

pub const DISPLAY: &str = "Publish release";

pub struct PublishOperation {
    store: Arc<dyn AuthoringStore>,
    release: Arc<dyn ReleaseService>,
}

impl PublishOperation {
    pub fn new(store: Arc<dyn AuthoringStore>, release: Arc<dyn ReleaseService>) -> Self {
        Self { store, release }
    }
}

#[async_trait]
impl ExternalOperation for PublishOperation {
    type Request = ();

    fn display(&self) -> &'static str {
        DISPLAY
    }

    fn function_name(&self) -> &'static str {
        "publish release"
    }

    fn api_issue_message(&self) -> &'static str {
        "SRS API issue."
    }

    async fn start(
        &self,
        job: &Job,
        code_system: &CodeSystem,
        _request: &(),
        ctx: &ExecutionContext,
    ) -> Result<Option<String>> {
        let build_url = code_system
            .latest_release_candidate_build
            .as_deref()
            .ok_or_else(|| SimplexError::user_content("There is no release candidate to publish."))?;

        let build = self.release.get_build(ctx, build_url).await?;
        if !build.is_release_complete() {
            return Err(SimplexError::user_content(
                "The release candidate build is not complete.",
            ));
        }
        let effective_date = build.effective_date().ok_or_else(|| {
            SimplexError::Other(format!("Build {build_url} has no effective time"))
        })?;

        tracing::info!(code_system = %code_system.short_name, effective_date, "Versioning code system");
        self.store
            .create_version(ctx, &code_system.short_name, effective_date)
            .await?;

        tracing::info!(build = build_url, "Publishing release");
        self.release.publish_build(ctx, build_url).await?;
        job.set_link(build_url);
        Ok(None)
    }

    async fn poll(&self, _job: &Job, _external_id: &str, _ctx: &ExecutionContext) -> Result<bool> {
        Ok(false)
    }
}

//! Upgrade of a code system to a newer dependant version

use crate::adapters::terminology::{AuthoringStore, UpgradeState};
use crate::core::jobs::{Job, SupportRegister};
use crate::core::monitor::ExternalOperation;
use crate::domain::{CodeSystem, ExecutionContext, JobStatus, Result, SimplexError};
use async_trait::async_trait;
use std::sync::Arc;

pub const DISPLAY: &str = "Upgrade";

#[derive(Debug, Clone, Copy)]
pub struct UpgradeRequest {
    /// Effective time of the new dependency release, `YYYYMMDD`
    pub new_dependant_version: u32,
}

pub struct UpgradeOperation {
    store: Arc<dyn AuthoringStore>,
    support: SupportRegister,
}

impl UpgradeOperation {
    pub fn new(store: Arc<dyn AuthoringStore>) -> Self {
        Self {
            store,
            support: SupportRegister::new(),
        }
    }
}

#[async_trait]
impl ExternalOperation for UpgradeOperation {
    type Request = UpgradeRequest;

    fn display(&self) -> &'static str {
        DISPLAY
    }

    fn function_name(&self) -> &'static str {
        "Code System Upgrade"
    }

    fn api_issue_message(&self) -> &'static str {
        "Terminology Server API issue."
    }

    async fn start(
        &self,
        job: &Job,
        code_system: &CodeSystem,
        request: &UpgradeRequest,
        ctx: &ExecutionContext,
    ) -> Result<Option<String>> {
        if let Some(current) = code_system.dependant_version_effective_time {
            if request.new_dependant_version <= current {
                return Err(SimplexError::user_content(
                    "The upgrade version must be newer than the current version.",
                ));
            }
        }

        let location = self
            .store
            .create_upgrade(ctx, &code_system.short_name, request.new_dependant_version)
            .await?;
        tracing::info!(
            code_system = %code_system.short_name,
            new_dependant_version = request.new_dependant_version,
            "Started code system upgrade"
        );
        job.set_link(location.clone());
        Ok(Some(location))
    }

    async fn poll(&self, job: &Job, location: &str, ctx: &ExecutionContext) -> Result<bool> {
        let upgrade = self.store.get_upgrade(ctx, location).await?;
        match upgrade.status {
            UpgradeState::Running => Ok(false),
            UpgradeState::Completed => {
                job.transition_to(JobStatus::Complete);
                Ok(true)
            }
            UpgradeState::Failed => {
                let detail = upgrade.error_message.unwrap_or_default();
                self.support.handle_system_error(
                    job,
                    "Upgrade failed to run in Terminology Server.",
                    Some(&detail),
                );
                Ok(true)
            }
        }
    }
}

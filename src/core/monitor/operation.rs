//! The contract every externally executed operation implements

use crate::core::jobs::Job;
use crate::domain::{CodeSystem, ExecutionContext, Result};
use async_trait::async_trait;

/// An operation whose work runs in another service
///
/// `start` kicks the work off and returns the id to poll with, or `None`
/// when there is nothing to monitor (rejected up front, or fire and forget).
/// `poll` checks progress, updates the job and returns `true` once the
/// job no longer needs monitoring.
#[async_trait]
pub trait ExternalOperation: Send + Sync + 'static {
    /// Operation specific input
    type Request: Send + Sync;

    /// Job display name
    fn display(&self) -> &'static str;

    /// Used in "Failed to create ..." messages
    fn function_name(&self) -> &'static str;

    /// Message recorded when polling the other service fails
    fn api_issue_message(&self) -> &'static str;

    async fn start(
        &self,
        job: &Job,
        code_system: &CodeSystem,
        request: &Self::Request,
        ctx: &ExecutionContext,
    ) -> Result<Option<String>>;

    async fn poll(&self, job: &Job, external_id: &str, ctx: &ExecutionContext) -> Result<bool>;
}

/// Object safe view of an operation used by the monitor sweep
#[async_trait]
pub trait OperationPoller: Send + Sync {
    fn name(&self) -> &'static str;

    fn failure_message(&self) -> &'static str;

    async fn check(&self, job: &Job, external_id: &str, ctx: &ExecutionContext) -> Result<bool>;
}

#[async_trait]
impl<T: ExternalOperation> OperationPoller for T {
    fn name(&self) -> &'static str {
        self.display()
    }

    fn failure_message(&self) -> &'static str {
        self.api_issue_message()
    }

    async fn check(&self, job: &Job, external_id: &str, ctx: &ExecutionContext) -> Result<bool> {
        self.poll(job, external_id, ctx).await
    }
}

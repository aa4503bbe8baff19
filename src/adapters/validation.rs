//! Validation service adapter

use crate::adapters::http::{ServiceAuth, ServiceClient};
use crate::config::ServiceConfig;
use crate::domain::{CodeSystem, ExecutionContext, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const SERVICE_NAME: &str = "validation service";

/// Progress of a validation report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Queued,
    Ready,
    Running,
    Failed,
    Complete,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    #[serde(default)]
    pub total_tests_run: u64,
    #[serde(default)]
    pub total_warnings: u64,
    #[serde(default)]
    pub total_failures: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRunConfig {
    #[serde(default)]
    pub content_head_timestamp: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    #[serde(rename = "TestResult", default)]
    pub test_result: TestResult,
    #[serde(default)]
    pub validation_config: ValidationRunConfig,
}

/// A validation report
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub status: ReportStatus,
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
    #[serde(default)]
    pub rvf_validation_result: Option<ValidationResult>,
}

impl ValidationReport {
    pub fn test_result(&self) -> Option<&TestResult> {
        self.rvf_validation_result.as_ref().map(|r| &r.test_result)
    }

    /// Content head timestamp the report was run against
    pub fn content_head_timestamp(&self) -> Option<i64> {
        self.rvf_validation_result
            .as_ref()
            .and_then(|r| r.validation_config.content_head_timestamp)
    }
}

#[async_trait]
pub trait ValidationService: Send + Sync {
    /// Starts validating the code system working branch, returning the report URL
    async fn start_validation(&self, ctx: &ExecutionContext, code_system: &CodeSystem)
        -> Result<String>;

    async fn get_validation(&self, ctx: &ExecutionContext, report_url: &str)
        -> Result<ValidationReport>;
}

/// HTTP client for the validation service
pub struct ValidationServiceClient {
    http: ServiceClient,
}

impl ValidationServiceClient {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let auth = ServiceAuth::basic(config.username.as_ref(), config.password.as_ref());
        Ok(Self {
            http: ServiceClient::new(SERVICE_NAME, &config.base_url, config.timeout_seconds, auth)?,
        })
    }
}

#[async_trait]
impl ValidationService for ValidationServiceClient {
    async fn start_validation(
        &self,
        ctx: &ExecutionContext,
        code_system: &CodeSystem,
    ) -> Result<String> {
        let body = json!({
            "codeSystem": code_system.short_name,
            "branchPath": code_system.working_branch_path(),
            "contentHeadTimestamp": code_system.content_head_timestamp,
            "dependencyEffectiveTime": code_system.dependant_version_effective_time,
        });
        let url = self.http.url("validations");
        self.http
            .send_for_location(ctx, self.http.post(&url).json(&body))
            .await
    }

    async fn get_validation(
        &self,
        ctx: &ExecutionContext,
        report_url: &str,
    ) -> Result<ValidationReport> {
        self.http.send_json(ctx, self.http.get(report_url)).await
    }
}

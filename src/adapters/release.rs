//! Release service adapter
//!
//! Builds release candidates for a code system and publishes completed builds.

use crate::adapters::http::{ServiceAuth, ServiceClient};
use crate::config::ReleaseServiceConfig;
use crate::domain::{CodeSystem, ExecutionContext, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const SERVICE_NAME: &str = "release service";

/// A release build
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    /// `YYYY-MM-DD` or `YYYYMMDD`
    #[serde(default)]
    pub effective_time: Option<String>,
}

impl Build {
    pub fn effective_date(&self) -> Option<u32> {
        self.effective_time
            .as_deref()
            .map(|time| time.replace('-', ""))
            .and_then(|time| time.parse().ok())
    }

    pub fn is_release_complete(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| status.starts_with("RELEASE_COMPLETE"))
    }
}

#[async_trait]
pub trait ReleaseService: Send + Sync {
    /// Starts a release candidate build, returning the build URL
    async fn build_product(
        &self,
        ctx: &ExecutionContext,
        code_system: &CodeSystem,
        effective_time: u32,
    ) -> Result<String>;

    async fn get_build(&self, ctx: &ExecutionContext, build_url: &str) -> Result<Build>;

    async fn publish_build(&self, ctx: &ExecutionContext, build_url: &str) -> Result<()>;
}

/// HTTP client for the release service
pub struct ReleaseServiceClient {
    http: ServiceClient,
    release_center: String,
}

impl ReleaseServiceClient {
    pub fn new(config: &ReleaseServiceConfig) -> Result<Self> {
        let service = &config.service;
        let auth = ServiceAuth::basic(service.username.as_ref(), service.password.as_ref());
        Ok(Self {
            http: ServiceClient::new(SERVICE_NAME, &service.base_url, service.timeout_seconds, auth)?,
            release_center: config.release_center.clone(),
        })
    }

    fn product_path(&self, code_system: &CodeSystem) -> String {
        format!(
            "centers/{}/products/{}",
            self.release_center,
            code_system.short_name.to_lowercase()
        )
    }
}

#[async_trait]
impl ReleaseService for ReleaseServiceClient {
    async fn build_product(
        &self,
        ctx: &ExecutionContext,
        code_system: &CodeSystem,
        effective_time: u32,
    ) -> Result<String> {
        let product = self.product_path(code_system);
        let body = json!({
            "effectiveDate": format_effective_date(effective_time),
            "branchPath": code_system.working_branch_path(),
            "exportCategory": "EDITION",
            "buildName": format!("{} {effective_time} release candidate", code_system.short_name),
        });

        let url = self.http.url(&format!("{product}/release"));
        let build: Build = self.http.send_json(ctx, self.http.post(&url).json(&body)).await?;
        let build_url = self.http.url(&format!("{product}/builds/{}", build.id));

        tracing::info!(
            code_system = %code_system.short_name,
            build_url = %build_url,
            "Release candidate build started"
        );
        Ok(build_url)
    }

    async fn get_build(&self, ctx: &ExecutionContext, build_url: &str) -> Result<Build> {
        self.http.send_json(ctx, self.http.get(build_url)).await
    }

    async fn publish_build(&self, ctx: &ExecutionContext, build_url: &str) -> Result<()> {
        let url = format!("{}/publish", build_url.trim_end_matches('/'));
        self.http.send(ctx, self.http.post(&url)).await?;
        Ok(())
    }
}

/// `20250131` as `2025-01-31`
fn format_effective_date(effective_time: u32) -> String {
    let raw = effective_time.to_string();
    if raw.len() != 8 {
        return raw;
    }
    format!("{}-{}-{}", &raw[0..4], &raw[4..6], &raw[6..8])
}

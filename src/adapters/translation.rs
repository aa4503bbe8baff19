//! Translation platform adapter

use crate::adapters::http::{ServiceAuth, ServiceClient};
use crate::config::TranslationConfig;
use crate::domain::{ExecutionContext, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const SERVICE_NAME: &str = "translation platform";

/// Translation unit counts for a language
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LanguageStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub translated: u64,
}

#[async_trait]
pub trait TranslationPlatform: Send + Sync {
    /// Creates the language and its translation units
    async fn initialise_language(
        &self,
        ctx: &ExecutionContext,
        language_code: &str,
        name: &str,
    ) -> Result<()>;

    async fn language_stats(&self, ctx: &ExecutionContext, language_code: &str)
        -> Result<LanguageStats>;
}

/// HTTP client for the translation platform
pub struct TranslationClient {
    http: ServiceClient,
}

impl TranslationClient {
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let auth = match &config.token {
            Some(token) => ServiceAuth::Bearer(token.clone()),
            None => ServiceAuth::Anonymous,
        };
        Ok(Self {
            http: ServiceClient::new(SERVICE_NAME, &config.base_url, config.timeout_seconds, auth)?,
        })
    }
}

#[async_trait]
impl TranslationPlatform for TranslationClient {
    async fn initialise_language(
        &self,
        ctx: &ExecutionContext,
        language_code: &str,
        name: &str,
    ) -> Result<()> {
        let body = json!({
            "code": language_code,
            "name": name,
            "direction": "ltr",
        });
        let url = self.http.url("languages/");
        self.http.send(ctx, self.http.post(&url).json(&body)).await?;
        Ok(())
    }

    async fn language_stats(
        &self,
        ctx: &ExecutionContext,
        language_code: &str,
    ) -> Result<LanguageStats> {
        let url = self.http.url(&format!("languages/{language_code}/statistics/"));
        self.http.send_json(ctx, self.http.get(&url)).await
    }
}

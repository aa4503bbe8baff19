//! HTTP plumbing shared by the service adapters
//!
//! Client construction, per-request authentication and retry with
//! exponential backoff. Adapters map responses to their own error types.

use crate::config::{RetryConfig, SecretString};
use crate::domain::{ExecutionContext, ExternalServiceError, Result, SimplexError};
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;

/// Builds a reqwest client with the configured timeouts
pub fn build_client(timeout_seconds: u64, tls_verify: bool) -> Result<Client> {
    let mut builder = ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_seconds))
        .connect_timeout(Duration::from_secs(timeout_seconds.min(30)));

    if !tls_verify {
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|e| SimplexError::Configuration(format!("Failed to build HTTP client: {e}")))
}

/// Service account used when a job carries no caller credential
#[derive(Clone, Default)]
pub enum ServiceAuth {
    #[default]
    Anonymous,
    Basic {
        username: String,
        password: SecretString,
    },
    Bearer(SecretString),
}

impl ServiceAuth {
    /// Basic auth when both a username and a password are configured
    pub fn basic(username: Option<&String>, password: Option<&SecretString>) -> Self {
        match (username, password) {
            (Some(username), Some(password)) if !username.is_empty() => Self::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            _ => Self::Anonymous,
        }
    }

    fn header(&self) -> Option<(&'static str, String)> {
        match self {
            Self::Anonymous => None,
            Self::Basic { username, password } => {
                let credentials = format!("{username}:{}", password.expose_secret());
                let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
                Some(("Authorization", format!("Basic {encoded}")))
            }
            Self::Bearer(token) => Some((
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            )),
        }
    }
}

/// Adds authentication for the caller, falling back to the service account
pub fn authorize(
    request: RequestBuilder,
    ctx: &ExecutionContext,
    fallback: &ServiceAuth,
) -> RequestBuilder {
    let header = ctx
        .credential()
        .map(|credential| credential.header())
        .or_else(|| fallback.header());
    match header {
        Some((name, value)) => request.header(name, value),
        None => request,
    }
}

/// Reads the `Location` header of a response
pub fn location(response: &Response) -> Option<String> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Reads a response body for an error message, never failing
pub async fn error_body(response: Response) -> String {
    response.text().await.unwrap_or_default()
}

/// Client for one of the supporting services (release, validation, translation)
///
/// Failures are reported as [`ExternalServiceError`] tagged with the service name.
pub struct ServiceClient {
    service: &'static str,
    base_url: String,
    client: Client,
    auth: ServiceAuth,
}

impl ServiceClient {
    pub fn new(
        service: &'static str,
        base_url: &str,
        timeout_seconds: u64,
        auth: ServiceAuth,
    ) -> Result<Self> {
        Ok(Self {
            service,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(timeout_seconds, true)?,
            auth,
        })
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }

    /// Sends a request, mapping transport failures and non-success statuses
    pub async fn send(&self, ctx: &ExecutionContext, request: RequestBuilder) -> Result<Response> {
        let service = self.service;
        let response = authorize(request, ctx, &self.auth)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExternalServiceError::Timeout {
                        service,
                        message: e.to_string(),
                    }
                } else {
                    ExternalServiceError::ConnectionFailed {
                        service,
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(ExternalServiceError::Status {
            service,
            status: status.as_u16(),
            message: error_body(response).await,
        }
        .into())
    }

    /// Sends a request and decodes the JSON body
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        ctx: &ExecutionContext,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.send(ctx, request).await?;
        response.json::<T>().await.map_err(|e| {
            ExternalServiceError::InvalidResponse {
                service: self.service,
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Sends a request and returns its `Location` header
    pub async fn send_for_location(
        &self,
        ctx: &ExecutionContext,
        request: RequestBuilder,
    ) -> Result<String> {
        let response = self.send(ctx, request).await?;
        location(&response).ok_or_else(|| {
            ExternalServiceError::InvalidResponse {
                service: self.service,
                message: "Response has no Location header".to_string(),
            }
            .into()
        })
    }
}

/// Retries an idempotent request with exponential backoff
///
/// Only errors reported by `should_retry` are retried.
pub async fn retry_with_backoff<F, Fut, T>(
    retry: &RetryConfig,
    should_retry: fn(&SimplexError) -> bool,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = retry.max_retries.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                attempt += 1;
                if attempt >= max_attempts || !should_retry(&e) {
                    return Err(e);
                }

                let delay_ms = backoff_delay_ms(retry, attempt);
                crate::log_retry_attempt!(attempt, max_attempts, e);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

fn backoff_delay_ms(retry: &RetryConfig, attempt: usize) -> u64 {
    let factor = retry.backoff_multiplier.powi(attempt as i32 - 1);
    let delay = (retry.initial_delay_ms as f64 * factor) as u64;
    delay.min(retry.max_delay_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_retry(max_retries: usize) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
        }
    }

    #[test]
    fn test_backoff_delay_is_capped() {
        let retry = RetryConfig {
            max_retries: 5,
            initial_delay_ms: 1000,
            max_delay_ms: 3000,
            backoff_multiplier: 2.0,
        };
        assert_eq!(backoff_delay_ms(&retry, 1), 1000);
        assert_eq!(backoff_delay_ms(&retry, 2), 2000);
        assert_eq!(backoff_delay_ms(&retry, 3), 3000);
    }

    #[test]
    fn test_basic_auth_header() {
        let auth = ServiceAuth::basic(
            Some(&"user".to_string()),
            Some(&secret_string("pass".to_string())),
        );
        let (name, value) = auth.header().unwrap();
        assert_eq!(name, "Authorization");
        assert_eq!(value, format!("Basic {}", general_purpose::STANDARD.encode("user:pass")));
    }

    #[test]
    fn test_basic_auth_needs_both_parts() {
        let auth = ServiceAuth::basic(Some(&"user".to_string()), None);
        assert!(auth.header().is_none());
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry_with_backoff(&fast_retry(3), |_| true, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SimplexError::Other("flaky".to_string()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_skips_non_retryable_errors() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = retry_with_backoff(&fast_retry(3), |_| false, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(SimplexError::Other("bad request".to_string()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let calls = AtomicUsize::new(0);
        let result = retry_with_backoff(&fast_retry(3), |_| true, || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(SimplexError::Other("flaky".to_string()))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
    }
}

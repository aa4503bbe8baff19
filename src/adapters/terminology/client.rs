//! REST client for the terminology server

use super::models::{
    BranchResource, BulkJobStatus, Classification, CodeSystemResource, Page, UpgradeJob,
};
use super::store::{AuthoringStore, RefsetStore};
use super::{ensure_unique_member_ids, DELETE_BATCH_SIZE};
use crate::adapters::http::{self, ServiceAuth};
use crate::config::{RetryConfig, TerminologyConfig};
use crate::domain::code_system::{LATEST_BUILD_KEY, LATEST_VALIDATION_REPORT_KEY};
use crate::domain::{
    CodeSystem, ExecutionContext, RefsetMember, Result, SimplexError, TerminologyError,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

/// Page size used when loading refset members
const MEMBER_PAGE_SIZE: usize = 10_000;

/// Concept ids checked per search request
const CONCEPT_SEARCH_BATCH_SIZE: usize = 1_000;

const DEFAULT_MODULE_KEY: &str = "defaultModuleId";
const WORKING_BRANCH_KEY: &str = "simplexWorkingBranch";
const CLASSIFIED_KEY: &str = "internal.classified";

/// Terminology server client
///
/// Requests are made on behalf of the [`ExecutionContext`] they are given.
/// Without a caller credential the configured service account is used.
pub struct TerminologyClient {
    base_url: String,
    client: Client,
    auth: ServiceAuth,
    retry: RetryConfig,
    bulk_poll_interval: Duration,
}

impl TerminologyClient {
    pub fn new(config: &TerminologyConfig) -> Result<Self> {
        let client = http::build_client(config.timeout_seconds, config.tls_verify)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            auth: ServiceAuth::basic(config.username.as_ref(), config.password.as_ref()),
            retry: config.retry.clone(),
            bulk_poll_interval: Duration::from_millis(config.bulk_poll_interval_ms),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, ctx: &ExecutionContext, request: RequestBuilder) -> Result<Response> {
        let response = http::authorize(request, ctx, &self.auth)
            .send()
            .await
            .map_err(transport_error)?;
        check_status(response).await
    }

    /// GET with retry on transport and server errors
    async fn get_json<T: DeserializeOwned>(&self, ctx: &ExecutionContext, url: &str) -> Result<T> {
        http::retry_with_backoff(&self.retry, is_retryable, move || async move {
            let response = self.send(ctx, self.client.get(url)).await?;
            response
                .json::<T>()
                .await
                .map_err(|e| SimplexError::from(TerminologyError::InvalidResponse(e.to_string())))
        })
        .await
    }

    /// Sends a request expected to answer with a `Location` header
    async fn send_for_location(
        &self,
        ctx: &ExecutionContext,
        request: RequestBuilder,
    ) -> Result<String> {
        let response = self.send(ctx, request).await?;
        http::location(&response).ok_or_else(|| {
            TerminologyError::InvalidResponse("Response has no Location header".to_string()).into()
        })
    }

    async fn get_branch(&self, ctx: &ExecutionContext, branch: &str) -> Result<BranchResource> {
        self.get_json(ctx, &self.url(&format!("branches/{branch}")))
            .await
    }

    /// Status of a bulk member change job
    pub async fn get_bulk_job_status(
        &self,
        ctx: &ExecutionContext,
        location: &str,
    ) -> Result<BulkJobStatus> {
        self.get_json(ctx, location).await
    }

}

#[async_trait]
impl RefsetStore for TerminologyClient {
    async fn load_members(
        &self,
        ctx: &ExecutionContext,
        branch: &str,
        refset_id: &str,
    ) -> Result<Vec<RefsetMember>> {
        let mut members = Vec::new();
        let mut search_after: Option<String> = None;

        loop {
            let mut url = url::Url::parse(&self.url(&format!("{branch}/members")))
                .map_err(|e| SimplexError::Configuration(format!("Invalid terminology URL: {e}")))?;
            url.query_pairs_mut()
                .append_pair("referenceSet", refset_id)
                .append_pair("limit", &MEMBER_PAGE_SIZE.to_string());
            if let Some(token) = &search_after {
                url.query_pairs_mut().append_pair("searchAfter", token);
            }

            let page: Page<RefsetMember> = self.get_json(ctx, url.as_str()).await?;
            if page.items.is_empty() {
                break;
            }
            members.extend(page.items);

            match page.search_after {
                Some(token) => search_after = Some(token),
                None => break,
            }
        }

        tracing::debug!(branch, refset_id, count = members.len(), "Loaded refset members");
        Ok(members)
    }

    async fn existing_concept_ids(
        &self,
        ctx: &ExecutionContext,
        branch: &str,
        concept_ids: &[String],
    ) -> Result<HashSet<String>> {
        let mut existing = HashSet::new();
        let url = self.url(&format!("{branch}/concepts/search"));

        for batch in concept_ids.chunks(CONCEPT_SEARCH_BATCH_SIZE) {
            let body = json!({
                "conceptIds": batch,
                "activeFilter": true,
                "returnIdOnly": true,
                "limit": batch.len(),
            });
            let response = self.send(ctx, self.client.post(&url).json(&body)).await?;
            let page: Page<Value> = response
                .json()
                .await
                .map_err(|e| TerminologyError::InvalidResponse(e.to_string()))?;

            existing.extend(page.items.into_iter().filter_map(|id| match id {
                Value::String(id) => Some(id),
                Value::Number(id) => Some(id.to_string()),
                _ => None,
            }));
        }

        Ok(existing)
    }

    async fn count_active_members(
        &self,
        ctx: &ExecutionContext,
        branch: &str,
        refset_id: &str,
    ) -> Result<u64> {
        let mut url = url::Url::parse(&self.url(&format!("{branch}/members")))
            .map_err(|e| SimplexError::Configuration(format!("Invalid terminology URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("referenceSet", refset_id)
            .append_pair("active", "true")
            .append_pair("limit", "1");

        let page: Page<Value> = self.get_json(ctx, url.as_str()).await?;
        Ok(page.total)
    }

    async fn bulk_upsert_members(
        &self,
        ctx: &ExecutionContext,
        branch: &str,
        members: &[RefsetMember],
    ) -> Result<()> {
        ensure_unique_member_ids(members)?;
        if members.is_empty() {
            return Ok(());
        }

        let url = self.url(&format!("{branch}/members/bulk"));
        let location = self
            .send_for_location(ctx, self.client.post(&url).json(members))
            .await?;

        loop {
            tokio::time::sleep(self.bulk_poll_interval).await;
            let status = self.get_bulk_job_status(ctx, &location).await?;
            if status.is_completed() {
                tracing::debug!(branch, count = members.len(), "Bulk member update completed");
                return Ok(());
            }
            if !status.is_running() {
                return Err(TerminologyError::AsyncJobFailed(format!(
                    "Bulk create/update refset member job failed - {}",
                    status.message.unwrap_or_default()
                ))
                .into());
            }
        }
    }

    async fn bulk_delete_members(
        &self,
        ctx: &ExecutionContext,
        branch: &str,
        member_ids: &[String],
    ) -> Result<()> {
        let url = self.url(&format!("{branch}/members"));
        for batch in member_ids.chunks(DELETE_BATCH_SIZE) {
            let body = json!({ "memberIds": batch });
            self.send(ctx, self.client.delete(&url).json(&body)).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AuthoringStore for TerminologyClient {
    async fn get_code_system(&self, ctx: &ExecutionContext, short_name: &str) -> Result<CodeSystem> {
        let resource: CodeSystemResource = self
            .get_json(ctx, &self.url(&format!("codesystems/{short_name}")))
            .await?;
        let branch = self.get_branch(ctx, &resource.branch_path).await?;

        let working_branch = branch.metadata_str(WORKING_BRANCH_KEY);
        let content_head_timestamp = match &working_branch {
            Some(path) if *path != resource.branch_path => {
                self.get_branch(ctx, path).await?.head_timestamp
            }
            _ => branch.head_timestamp,
        };

        Ok(CodeSystem {
            name: resource.name,
            short_name: resource.short_name,
            branch_path: resource.branch_path,
            default_module: branch.metadata_str(DEFAULT_MODULE_KEY),
            classified: branch.metadata_flag(CLASSIFIED_KEY),
            latest_validation_report: branch.metadata_str(LATEST_VALIDATION_REPORT_KEY),
            latest_release_candidate_build: branch.metadata_str(LATEST_BUILD_KEY),
            working_branch,
            content_head_timestamp,
            dependant_version_effective_time: resource.dependant_version_effective_time,
            latest_version: resource.latest_version,
        })
    }

    async fn upsert_branch_metadata(
        &self,
        ctx: &ExecutionContext,
        branch: &str,
        metadata: &BTreeMap<String, Value>,
    ) -> Result<()> {
        let url = self.url(&format!("branches/{branch}/metadata-upsert"));
        self.send(ctx, self.client.put(&url).json(metadata)).await?;
        Ok(())
    }

    async fn create_version(
        &self,
        ctx: &ExecutionContext,
        short_name: &str,
        effective_date: u32,
    ) -> Result<()> {
        let url = self.url(&format!("codesystems/{short_name}/versions"));
        let body = json!({
            "effectiveDate": effective_date,
            "description": format!("{short_name} {effective_date} release"),
        });
        self.send(ctx, self.client.post(&url).json(&body)).await?;
        Ok(())
    }

    async fn create_classification(&self, ctx: &ExecutionContext, branch: &str) -> Result<String> {
        let url = self.url(&format!("{branch}/classifications"));
        let location = self.send_for_location(ctx, self.client.post(&url)).await?;
        location
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                TerminologyError::InvalidResponse(format!(
                    "Classification location has no id: {location}"
                ))
                .into()
            })
    }

    async fn get_classification(
        &self,
        ctx: &ExecutionContext,
        branch: &str,
        classification_id: &str,
    ) -> Result<Classification> {
        self.get_json(
            ctx,
            &self.url(&format!("{branch}/classifications/{classification_id}")),
        )
        .await
    }

    async fn save_classification(
        &self,
        ctx: &ExecutionContext,
        branch: &str,
        classification_id: &str,
    ) -> Result<()> {
        let url = self.url(&format!("{branch}/classifications/{classification_id}"));
        let body = json!({ "status": "SAVED" });
        self.send(ctx, self.client.put(&url).json(&body)).await?;
        Ok(())
    }

    async fn create_upgrade(
        &self,
        ctx: &ExecutionContext,
        short_name: &str,
        new_dependant_version: u32,
    ) -> Result<String> {
        let url = self.url(&format!("codesystems/{short_name}/upgrade"));
        let body = json!({ "newDependantVersion": new_dependant_version });
        self.send_for_location(ctx, self.client.post(&url).json(&body))
            .await
    }

    async fn get_upgrade(&self, ctx: &ExecutionContext, location: &str) -> Result<UpgradeJob> {
        self.get_json(ctx, location).await
    }
}

fn transport_error(e: reqwest::Error) -> SimplexError {
    if e.is_timeout() {
        TerminologyError::Timeout(e.to_string()).into()
    } else {
        TerminologyError::ConnectionFailed(e.to_string()).into()
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = http::error_body(response).await;
    let err = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            TerminologyError::AuthenticationFailed(message)
        }
        StatusCode::NOT_FOUND => TerminologyError::NotFound(message),
        s if s.is_server_error() => TerminologyError::ServerError {
            status: s.as_u16(),
            message,
        },
        s => TerminologyError::ClientError {
            status: s.as_u16(),
            message,
        },
    };
    Err(err.into())
}

fn is_retryable(e: &SimplexError) -> bool {
    e.is_transport()
        || matches!(
            e,
            SimplexError::Terminology(TerminologyError::ServerError { .. })
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client_for(server: &Server) -> TerminologyClient {
        let config = TerminologyConfig {
            base_url: server.url(),
            bulk_poll_interval_ms: 1,
            retry: RetryConfig {
                max_retries: 1,
                initial_delay_ms: 1,
                max_delay_ms: 1,
                backoff_multiplier: 1.0,
            },
            ..TerminologyConfig::default()
        };
        TerminologyClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_load_members_follows_search_after() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/MAIN/members")
            .match_query(Matcher::Regex("^referenceSet=100&limit=10000$".into()))
            .with_body(
                r#"{"items":[{"memberId":"m1","refsetId":"100","referencedComponentId":"300"}],"total":2,"searchAfter":"tok"}"#,
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/MAIN/members")
            .match_query(Matcher::Regex("searchAfter=tok".into()))
            .with_body(
                r#"{"items":[{"memberId":"m2","refsetId":"100","referencedComponentId":"301","active":false}],"total":2}"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let members = client
            .load_members(&ExecutionContext::system(), "MAIN", "100")
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(members.len(), 2);
        assert!(!members[1].active);
    }

    #[tokio::test]
    async fn test_duplicate_ids_never_reach_the_server() {
        let mut server = Server::new_async().await;
        let bulk = server
            .mock("POST", "/MAIN/members/bulk")
            .expect(0)
            .create_async()
            .await;

        let mut a = RefsetMember::new("100", "200", "300");
        let b = RefsetMember::new("100", "200", "301");
        a.member_id = b.member_id.clone();

        let client = client_for(&server);
        let err = client
            .bulk_upsert_members(&ExecutionContext::system(), "MAIN", &[a, b])
            .await
            .unwrap_err();

        bulk.assert_async().await;
        assert!(err.to_string().contains("duplicate member id"));
    }

    #[tokio::test]
    async fn test_bulk_upsert_waits_for_completion() {
        let mut server = Server::new_async().await;
        let job_url = format!("{}/MAIN/members/bulk/job-1", server.url());
        server
            .mock("POST", "/MAIN/members/bulk")
            .with_status(201)
            .with_header("Location", &job_url)
            .create_async()
            .await;
        let status = server
            .mock("GET", "/MAIN/members/bulk/job-1")
            .with_body(r#"{"status":"COMPLETED"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        client
            .bulk_upsert_members(
                &ExecutionContext::system(),
                "MAIN",
                &[RefsetMember::new("100", "200", "300")],
            )
            .await
            .unwrap();
        status.assert_async().await;
    }

    #[tokio::test]
    async fn test_bulk_upsert_failure_reports_message() {
        let mut server = Server::new_async().await;
        let job_url = format!("{}/MAIN/members/bulk/job-2", server.url());
        server
            .mock("POST", "/MAIN/members/bulk")
            .with_status(201)
            .with_header("Location", &job_url)
            .create_async()
            .await;
        server
            .mock("GET", "/MAIN/members/bulk/job-2")
            .with_body(r#"{"status":"FAILED","message":"bad module"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .bulk_upsert_members(
                &ExecutionContext::system(),
                "MAIN",
                &[RefsetMember::new("100", "200", "300")],
            )
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("Bulk create/update refset member job failed - bad module"));
    }

    #[tokio::test]
    async fn test_bulk_delete_is_batched() {
        let mut server = Server::new_async().await;
        let delete = server
            .mock("DELETE", "/MAIN/members")
            .expect(2)
            .create_async()
            .await;

        let ids: Vec<String> = (0..DELETE_BATCH_SIZE + 1).map(|i| format!("m{i}")).collect();
        let client = client_for(&server);
        client
            .bulk_delete_members(&ExecutionContext::system(), "MAIN", &ids)
            .await
            .unwrap();
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_caller_cookie_is_forwarded() {
        let mut server = Server::new_async().await;
        let count = server
            .mock("GET", "/MAIN/members")
            .match_query(Matcher::Any)
            .match_header("Cookie", "session=abc")
            .with_body(r#"{"items":[],"total":12}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let ctx = ExecutionContext::new("author").with_cookie("session=abc");
        let total = client.count_active_members(&ctx, "MAIN", "100").await.unwrap();

        count.assert_async().await;
        assert_eq!(total, 12);
    }

    #[tokio::test]
    async fn test_existing_concept_ids_accepts_numeric_ids() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/MAIN/concepts/search")
            .with_body(r#"{"items":[123456789,"987654321"],"total":2}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let ids = client
            .existing_concept_ids(
                &ExecutionContext::system(),
                "MAIN",
                &["123456789".to_string(), "987654321".to_string(), "555555".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("123456789"));
    }

    #[tokio::test]
    async fn test_create_classification_returns_location_id() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/MAIN/classifications")
            .with_status(201)
            .with_header("Location", "http://localhost/MAIN/classifications/abc-123")
            .create_async()
            .await;

        let client = client_for(&server);
        let id = client
            .create_classification(&ExecutionContext::system(), "MAIN")
            .await
            .unwrap();
        assert_eq!(id, "abc-123");
    }

    #[tokio::test]
    async fn test_not_found_maps_to_terminology_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/codesystems/SNOMEDCT-XX")
            .with_status(404)
            .with_body("no such code system")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .get_code_system(&ExecutionContext::system(), "SNOMEDCT-XX")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SimplexError::Terminology(TerminologyError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_code_system_merges_branch_metadata() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/codesystems/SNOMEDCT-XX")
            .with_body(
                r#"{"name":"Extension","shortName":"SNOMEDCT-XX","branchPath":"MAIN/SNOMEDCT-XX","latestVersion":{"effectiveDate":20250101}}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/branches/MAIN/SNOMEDCT-XX")
            .with_body(
                r#"{"headTimestamp":10,"metadata":{"defaultModuleId":"11000001","simplexWorkingBranch":"MAIN/SNOMEDCT-XX/work"}}"#,
            )
            .create_async()
            .await;
        server
            .mock("GET", "/branches/MAIN/SNOMEDCT-XX/work")
            .with_body(r#"{"headTimestamp":99,"metadata":{}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let code_system = client
            .get_code_system(&ExecutionContext::system(), "SNOMEDCT-XX")
            .await
            .unwrap();

        assert_eq!(code_system.default_module.as_deref(), Some("11000001"));
        assert_eq!(code_system.working_branch_path(), "MAIN/SNOMEDCT-XX/work");
        assert_eq!(code_system.content_head_timestamp, 99);
        assert_eq!(code_system.latest_version_effective_date(), Some(20250101));
    }
}

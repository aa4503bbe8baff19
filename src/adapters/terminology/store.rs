//! Terminology store traits
//!
//! The reconciliation engine only needs [`RefsetStore`]; the external
//! operations use [`AuthoringStore`]. [`super::TerminologyClient`]
//! implements both.

use super::models::{Classification, UpgradeJob};
use crate::domain::{CodeSystem, ExecutionContext, RefsetMember, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Members of a single refset on a branch
#[async_trait]
pub trait RefsetStore: Send + Sync {
    /// Every member of the refset, active and inactive
    async fn load_members(
        &self,
        ctx: &ExecutionContext,
        branch: &str,
        refset_id: &str,
    ) -> Result<Vec<RefsetMember>>;

    /// The subset of `concept_ids` that exist as active concepts
    async fn existing_concept_ids(
        &self,
        ctx: &ExecutionContext,
        branch: &str,
        concept_ids: &[String],
    ) -> Result<HashSet<String>>;

    /// Number of active members of the refset
    async fn count_active_members(
        &self,
        ctx: &ExecutionContext,
        branch: &str,
        refset_id: &str,
    ) -> Result<u64>;

    /// Creates or updates members in one request and waits for it to finish
    ///
    /// Fails without contacting the server when two members share an id.
    async fn bulk_upsert_members(
        &self,
        ctx: &ExecutionContext,
        branch: &str,
        members: &[RefsetMember],
    ) -> Result<()>;

    /// Deletes members by id
    async fn bulk_delete_members(
        &self,
        ctx: &ExecutionContext,
        branch: &str,
        member_ids: &[String],
    ) -> Result<()>;
}

/// Code system, classification and versioning operations
#[async_trait]
pub trait AuthoringStore: Send + Sync {
    async fn get_code_system(&self, ctx: &ExecutionContext, short_name: &str) -> Result<CodeSystem>;

    /// Merges `metadata` into the branch metadata
    async fn upsert_branch_metadata(
        &self,
        ctx: &ExecutionContext,
        branch: &str,
        metadata: &BTreeMap<String, Value>,
    ) -> Result<()>;

    /// Publishes a new version of the code system
    async fn create_version(
        &self,
        ctx: &ExecutionContext,
        short_name: &str,
        effective_date: u32,
    ) -> Result<()>;

    /// Starts a classification, returning its id
    async fn create_classification(&self, ctx: &ExecutionContext, branch: &str) -> Result<String>;

    async fn get_classification(
        &self,
        ctx: &ExecutionContext,
        branch: &str,
        classification_id: &str,
    ) -> Result<Classification>;

    /// Requests that classification results are saved to the branch
    async fn save_classification(
        &self,
        ctx: &ExecutionContext,
        branch: &str,
        classification_id: &str,
    ) -> Result<()>;

    /// Starts an upgrade to a new dependant version, returning the job location
    async fn create_upgrade(
        &self,
        ctx: &ExecutionContext,
        short_name: &str,
        new_dependant_version: u32,
    ) -> Result<String>;

    async fn get_upgrade(&self, ctx: &ExecutionContext, location: &str) -> Result<UpgradeJob>;
}

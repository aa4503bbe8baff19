//! Reconciliation of one refset against desired content
//!
//! A run loads what the store holds, drops intents for concepts that do not
//! exist, plans the minimal set of writes and applies it in two bulk calls.
//! Released members are only ever inactivated.

use super::lock::RefsetLocks;
use super::plan::ReconciliationPlan;
use super::progress::ProgressSink;
use super::refset_type::RefsetType;
use crate::adapters::terminology::RefsetStore;
use crate::core::jobs::WorkOutcome;
use crate::domain::context::ResultExt;
use crate::domain::{ChangeSummary, CodeSystem, ExecutionContext, MemberIntent, Result};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Number of missing concept ids quoted in a content issue message
const MISSING_CONCEPTS_QUOTED: usize = 10;

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub summary: ChangeSummary,
    /// Referenced components of discarded intents, sorted
    pub missing_concepts: Vec<String>,
}

impl ReconciliationResult {
    /// The executor outcome; missing concepts end the job as `CONTENT_ISSUE`
    pub fn into_outcome(self) -> WorkOutcome {
        if self.missing_concepts.is_empty() {
            return WorkOutcome::complete(self.summary);
        }
        let quoted: Vec<&str> = self
            .missing_concepts
            .iter()
            .take(MISSING_CONCEPTS_QUOTED)
            .map(String::as_str)
            .collect();
        let more = self.missing_concepts.len().saturating_sub(quoted.len());
        let mut message = format!(
            "{} concept(s) could not be found and were skipped: {}",
            self.missing_concepts.len(),
            quoted.join(", ")
        );
        if more > 0 {
            message.push_str(&format!(" and {more} more"));
        }
        WorkOutcome::with_content_issue(self.summary, message)
    }
}

pub struct ReconciliationEngine {
    store: Arc<dyn RefsetStore>,
    locks: RefsetLocks,
}

impl ReconciliationEngine {
    pub fn new(store: Arc<dyn RefsetStore>, serialize_refset_updates: bool) -> Self {
        Self {
            store,
            locks: RefsetLocks::new(serialize_refset_updates),
        }
    }

    /// Converges the refset on the code system's working branch to `desired`
    ///
    /// Progress is reported at 25, 50, 75 and 100 percent. Store errors are
    /// returned wrapped with the refset id.
    pub async fn reconcile(
        &self,
        ctx: &ExecutionContext,
        code_system: &CodeSystem,
        refset_id: &str,
        refset_type: &dyn RefsetType,
        desired: Vec<MemberIntent>,
        progress: &dyn ProgressSink,
    ) -> Result<ReconciliationResult> {
        let _guard = self.locks.acquire(&code_system.short_name, refset_id).await;
        let branch = code_system.working_branch_path();
        let module_id = code_system.default_module_or_err()?;
        let failed = || format!("Processing refset {refset_id} failed");

        tracing::info!(
            code_system = %code_system.short_name,
            branch,
            refset_id,
            refset_type = refset_type.name(),
            desired = desired.len(),
            "Reconciling refset"
        );

        let stored = self
            .store
            .load_members(ctx, branch, refset_id)
            .await
            .with_context(failed)?;

        let (desired, missing_concepts) = self
            .discard_missing_concepts(ctx, branch, desired)
            .await
            .with_context(failed)?;
        progress.report(25);

        let plan = ReconciliationPlan::build(refset_type, refset_id, module_id, stored, &desired);
        tracing::debug!(
            refset_id,
            kept = plan.kept,
            creates = plan.creates.len(),
            updates = plan.updates.len(),
            inactivations = plan.inactivations.len(),
            deletions = plan.deletions.len(),
            "Reconciliation plan"
        );
        progress.report(50);

        let upserts = plan.upserts();
        if !upserts.is_empty() {
            self.store
                .bulk_upsert_members(ctx, branch, &upserts)
                .await
                .with_context(failed)?;
        }
        progress.report(75);

        if !plan.deletions.is_empty() {
            self.store
                .bulk_delete_members(ctx, branch, &plan.deletions)
                .await
                .with_context(failed)?;
        }

        let new_total = self
            .store
            .count_active_members(ctx, branch, refset_id)
            .await
            .with_context(failed)?;
        progress.report(100);

        let summary = plan.summary(usize::try_from(new_total).unwrap_or(usize::MAX));
        tracing::info!(
            code_system = %code_system.short_name,
            refset_id,
            %summary,
            missing = missing_concepts.len(),
            "Refset reconciled"
        );

        Ok(ReconciliationResult {
            summary,
            missing_concepts,
        })
    }

    async fn discard_missing_concepts(
        &self,
        ctx: &ExecutionContext,
        branch: &str,
        desired: Vec<MemberIntent>,
    ) -> Result<(Vec<MemberIntent>, Vec<String>)> {
        let referenced: BTreeSet<&str> = desired
            .iter()
            .map(|intent| intent.referenced_component_id.as_str())
            .collect();
        if referenced.is_empty() {
            return Ok((desired, Vec::new()));
        }

        let ids: Vec<String> = referenced.iter().map(|id| id.to_string()).collect();
        let existing = self.store.existing_concept_ids(ctx, branch, &ids).await?;
        let missing: Vec<String> = ids
            .into_iter()
            .filter(|id| !existing.contains(id))
            .collect();
        if missing.is_empty() {
            return Ok((desired, missing));
        }

        tracing::warn!(
            branch,
            missing = missing.len(),
            concepts = ?missing.iter().take(MISSING_CONCEPTS_QUOTED).collect::<Vec<_>>(),
            "Desired members reference concepts that do not exist"
        );
        let kept = desired
            .into_iter()
            .filter(|intent| existing.contains(&intent.referenced_component_id))
            .collect();
        Ok((kept, missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reconcile::progress::NoProgress;
    use crate::core::reconcile::refset_type::SimpleRefset;
    use crate::domain::{RefsetMember, SimplexError, TerminologyError};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FailingUpsertStore {
        concepts: HashSet<String>,
        members: Mutex<Vec<RefsetMember>>,
    }

    #[async_trait]
    impl RefsetStore for FailingUpsertStore {
        async fn load_members(
            &self,
            _ctx: &ExecutionContext,
            _branch: &str,
            _refset_id: &str,
        ) -> Result<Vec<RefsetMember>> {
            Ok(self.members.lock().unwrap().clone())
        }

        async fn existing_concept_ids(
            &self,
            _ctx: &ExecutionContext,
            _branch: &str,
            concept_ids: &[String],
        ) -> Result<HashSet<String>> {
            Ok(concept_ids
                .iter()
                .filter(|id| self.concepts.contains(*id))
                .cloned()
                .collect())
        }

        async fn count_active_members(
            &self,
            _ctx: &ExecutionContext,
            _branch: &str,
            _refset_id: &str,
        ) -> Result<u64> {
            Ok(0)
        }

        async fn bulk_upsert_members(
            &self,
            _ctx: &ExecutionContext,
            _branch: &str,
            _members: &[RefsetMember],
        ) -> Result<()> {
            Err(TerminologyError::ServerError {
                status: 500,
                message: "bulk job failed".to_string(),
            }
            .into())
        }

        async fn bulk_delete_members(
            &self,
            _ctx: &ExecutionContext,
            _branch: &str,
            _member_ids: &[String],
        ) -> Result<()> {
            Ok(())
        }
    }

    fn code_system() -> CodeSystem {
        let mut cs = CodeSystem::new("SNOMEDCT-XX", "MAIN/SNOMEDCT-XX");
        cs.default_module = Some("200".to_string());
        cs
    }

    #[tokio::test]
    async fn test_store_errors_name_the_refset() {
        let store = FailingUpsertStore {
            concepts: HashSet::from(["A".to_string()]),
            ..Default::default()
        };
        let engine = ReconciliationEngine::new(Arc::new(store), true);

        let err = engine
            .reconcile(
                &ExecutionContext::system(),
                &code_system(),
                "100",
                &SimpleRefset,
                vec![MemberIntent::simple("A")],
                &NoProgress,
            )
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("Processing refset 100 failed"));
        assert!(matches!(err, SimplexError::Context { .. }));
    }

    #[test]
    fn test_missing_concepts_become_content_issue() {
        let result = ReconciliationResult {
            summary: ChangeSummary::new(1, 0, 0, 1),
            missing_concepts: vec!["X".to_string(), "Y".to_string()],
        };
        let outcome = result.into_outcome();
        assert_eq!(
            outcome.content_issue.as_deref(),
            Some("2 concept(s) could not be found and were skipped: X, Y")
        );
    }
}

//! Integration tests for refset reconciliation against an in-memory store

mod common;

use common::{member, InMemoryTerminology, CODE_SYSTEM, REFSET};
use simplex::adapters::terminology::RefsetStore;
use simplex::core::reconcile::{
    CorrelationMapRefset, NoProgress, ProgressSink, RefsetKind, ReconciliationEngine, SimpleRefset,
};
use simplex::domain::{
    ChangeSummary, ExecutionContext, JobStatus, MapCorrelation, MemberIntent, SimplexError,
    TerminologyError,
};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn ctx() -> ExecutionContext {
    ExecutionContext::new("author")
}

fn simple(ids: &[&str]) -> Vec<MemberIntent> {
    ids.iter().map(|id| MemberIntent::simple(*id)).collect()
}

#[derive(Default)]
struct RecordingProgress(Mutex<Vec<u8>>);

impl ProgressSink for RecordingProgress {
    fn report(&self, percent: u8) {
        self.0.lock().unwrap().push(percent);
    }
}

#[tokio::test]
async fn test_released_members_are_inactivated_not_deleted() {
    let released = member("C", true, true);
    let store = Arc::new(
        InMemoryTerminology::new(&["A", "B", "C"])
            .with_members(vec![member("A", true, false), released.clone()]),
    );
    let engine = ReconciliationEngine::new(store.clone(), true);

    let result = engine
        .reconcile(
            &ctx(),
            &common::code_system(),
            REFSET,
            &SimpleRefset,
            simple(&["A", "B"]),
            &NoProgress,
        )
        .await
        .unwrap();

    assert_eq!(result.summary, ChangeSummary::new(1, 0, 1, 2));
    assert!(result.missing_concepts.is_empty());
    assert_eq!(store.active_components(), vec!["A", "B"]);

    let kept = store.find(&released.member_id).expect("released member kept");
    assert!(!kept.active);
    assert!(kept.released);
    assert_eq!(store.deletes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_second_run_changes_nothing() {
    let store = Arc::new(
        InMemoryTerminology::new(&["A", "B", "C"])
            .with_members(vec![member("A", true, false), member("C", true, true)]),
    );
    let engine = ReconciliationEngine::new(store.clone(), true);
    let code_system = common::code_system();

    engine
        .reconcile(&ctx(), &code_system, REFSET, &SimpleRefset, simple(&["A", "B"]), &NoProgress)
        .await
        .unwrap();
    let upserts_after_first = store.upserts.load(Ordering::SeqCst);

    let second = engine
        .reconcile(&ctx(), &code_system, REFSET, &SimpleRefset, simple(&["A", "B"]), &NoProgress)
        .await
        .unwrap();

    assert!(second.summary.is_unchanged());
    assert_eq!(second.summary.new_total, 2);
    assert_eq!(store.upserts.load(Ordering::SeqCst), upserts_after_first);
}

#[tokio::test]
async fn test_unreleased_member_is_deleted() {
    let store = Arc::new(
        InMemoryTerminology::new(&["A", "B"])
            .with_members(vec![member("A", true, false), member("B", true, false)]),
    );
    let engine = ReconciliationEngine::new(store.clone(), false);

    let result = engine
        .reconcile(&ctx(), &common::code_system(), REFSET, &SimpleRefset, simple(&["A"]), &NoProgress)
        .await
        .unwrap();

    assert_eq!(result.summary, ChangeSummary::new(0, 0, 1, 1));
    assert_eq!(store.stored().len(), 1);
    assert_eq!(store.deletes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_concepts_are_skipped() {
    let store = Arc::new(InMemoryTerminology::new(&["A"]));
    let engine = ReconciliationEngine::new(store.clone(), true);

    let result = engine
        .reconcile(
            &ctx(),
            &common::code_system(),
            REFSET,
            &SimpleRefset,
            simple(&["A", "Z"]),
            &NoProgress,
        )
        .await
        .unwrap();

    assert_eq!(result.missing_concepts, vec!["Z".to_string()]);
    assert_eq!(result.summary, ChangeSummary::new(1, 0, 0, 1));
    assert_eq!(store.active_components(), vec!["A"]);
}

#[tokio::test]
async fn test_progress_is_reported_in_quarters() {
    let store = Arc::new(InMemoryTerminology::new(&["A"]));
    let engine = ReconciliationEngine::new(store, true);
    let progress = RecordingProgress::default();

    engine
        .reconcile(&ctx(), &common::code_system(), REFSET, &SimpleRefset, simple(&["A"]), &progress)
        .await
        .unwrap();

    assert_eq!(*progress.0.lock().unwrap(), vec![25, 50, 75, 100]);
}

#[tokio::test]
async fn test_correlation_map_member_updated_in_place() {
    let existing = member("A", true, true).with_field("mapSource", "X1").with_field(
        "correlationId",
        MapCorrelation::TargetBroader.concept_id(),
    );
    let store = Arc::new(InMemoryTerminology::new(&["A"]).with_members(vec![existing.clone()]));
    let engine = ReconciliationEngine::new(store.clone(), true);

    let result = engine
        .reconcile(
            &ctx(),
            &common::code_system(),
            REFSET,
            &CorrelationMapRefset,
            vec![MemberIntent::correlation_map(
                "A",
                "X1",
                MapCorrelation::TargetEquivalent,
            )],
            &NoProgress,
        )
        .await
        .unwrap();

    assert_eq!(result.summary, ChangeSummary::new(0, 1, 0, 1));
    let updated = store.find(&existing.member_id).unwrap();
    assert_eq!(
        updated.field("correlationId"),
        Some(MapCorrelation::TargetEquivalent.concept_id())
    );
    assert_eq!(store.stored().len(), 1);
}

#[tokio::test]
async fn test_duplicate_member_ids_are_rejected_by_the_store() {
    let store = InMemoryTerminology::new(&["A", "B"]);
    let first = member("A", true, false);
    let mut second = member("B", true, false);
    second.member_id = first.member_id.clone();

    let err = store
        .bulk_upsert_members(&ctx(), common::BRANCH, &[first, second])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SimplexError::Terminology(TerminologyError::DuplicateMemberId(_))
    ));
    assert!(store.stored().is_empty());
}

#[tokio::test]
async fn test_refset_update_job_reports_content_issue() {
    let store = Arc::new(InMemoryTerminology::new(&["A"]));
    let orchestrator = common::orchestrator(store.clone(), &common::config(2));

    let submitted = orchestrator.submit_refset_update(
        CODE_SYSTEM,
        REFSET,
        RefsetKind::Simple,
        simple(&["A", "Z"]),
        ctx(),
    );
    submitted.handle.await.unwrap();

    let snapshot = submitted.job.snapshot();
    assert_eq!(snapshot.status, JobStatus::ContentIssue);
    assert_eq!(snapshot.change_summary, Some(ChangeSummary::new(1, 0, 0, 1)));
    assert!(snapshot
        .error_message
        .unwrap()
        .starts_with("1 concept(s) could not be found"));
    assert_eq!(snapshot.refset_id.as_deref(), Some(REFSET));
}

#[tokio::test]
async fn test_refset_update_job_progress_is_visible() {
    let store = Arc::new(InMemoryTerminology::new(&["A", "B"]));
    let orchestrator = common::orchestrator(store, &common::config(2));

    let submitted = orchestrator.submit_refset_update(
        CODE_SYSTEM,
        REFSET,
        RefsetKind::Simple,
        simple(&["A", "B"]),
        ctx(),
    );
    submitted.handle.await.unwrap();

    let snapshot = submitted.job.snapshot();
    assert_eq!(snapshot.status, JobStatus::Complete);
    assert_eq!(snapshot.records_total, 2);
    assert_eq!(snapshot.records_processed, 2);
}

#[tokio::test]
async fn test_unknown_refset_is_a_user_content_error() {
    let store = Arc::new(InMemoryTerminology::new(&["A"]));
    store.concepts.lock().unwrap().remove(REFSET);
    let orchestrator = common::orchestrator(store.clone(), &common::config(2));

    let submitted = orchestrator.submit_refset_update(
        CODE_SYSTEM,
        REFSET,
        RefsetKind::Simple,
        simple(&["A"]),
        ctx(),
    );
    submitted.handle.await.unwrap();

    let snapshot = submitted.job.snapshot();
    assert_eq!(snapshot.status, JobStatus::UserContentError);
    assert_eq!(
        snapshot.error_message.as_deref(),
        Some(format!("Refset {REFSET} does not exist.").as_str())
    );
    assert!(store.stored().is_empty());
    assert_eq!(store.upserts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unknown_code_system_fails_the_job() {
    let store = Arc::new(InMemoryTerminology::new(&["A"]));
    let orchestrator = common::orchestrator(store, &common::config(2));

    let submitted =
        orchestrator.submit_refset_update("OTHER", REFSET, RefsetKind::Simple, simple(&["A"]), ctx());
    submitted.handle.await.unwrap();

    assert_eq!(submitted.job.status(), JobStatus::SystemError);
}

#[tokio::test]
async fn test_unreadable_upload_is_a_user_content_error() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = common::config(2);
    config.jobs.temp_dir = Some(temp_dir.path().to_string_lossy().to_string());

    let store = Arc::new(InMemoryTerminology::new(&["A"]));
    let orchestrator = common::orchestrator(store.clone(), &config);

    let submitted = orchestrator
        .submit_refset_upload(
            CODE_SYSTEM,
            REFSET,
            RefsetKind::Simple,
            "members.json",
            &b"not json"[..],
            ctx(),
        )
        .await
        .unwrap();
    submitted.handle.await.unwrap();

    let snapshot = submitted.job.snapshot();
    assert_eq!(snapshot.status, JobStatus::UserContentError);
    assert!(snapshot
        .error_message
        .unwrap()
        .contains("The uploaded member list could not be read"));
    assert_eq!(snapshot.original_filename.as_deref(), Some("members.json"));
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    assert!(store.stored().is_empty());
}

#[tokio::test]
async fn test_uploaded_members_are_reconciled() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = common::config(2);
    config.jobs.temp_dir = Some(temp_dir.path().to_string_lossy().to_string());

    let store = Arc::new(InMemoryTerminology::new(&["A", "B"]));
    let orchestrator = common::orchestrator(store.clone(), &config);
    let upload = br#"[{"referencedComponentId": "A"}, {"referencedComponentId": "B"}]"#;

    let submitted = orchestrator
        .submit_refset_upload(
            CODE_SYSTEM,
            REFSET,
            RefsetKind::Simple,
            "members.json",
            &upload[..],
            ctx(),
        )
        .await
        .unwrap();
    submitted.handle.await.unwrap();

    assert_eq!(submitted.job.status(), JobStatus::Complete);
    assert_eq!(store.active_components(), vec!["A", "B"]);
    assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
}

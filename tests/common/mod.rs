//! In-memory terminology store shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use simplex::adapters::release::{Build, ReleaseService};
use simplex::adapters::terminology::{
    ensure_unique_member_ids, AuthoringStore, Classification, ClassificationState, RefsetStore,
    UpgradeJob, UpgradeState,
};
use simplex::adapters::translation::{LanguageStats, TranslationPlatform};
use simplex::adapters::validation::{
    ReportStatus, TestResult, ValidationReport, ValidationResult, ValidationRunConfig,
    ValidationService,
};
use simplex::config::{parse_config, SimplexConfig};
use simplex::core::jobs::{ExternalServices, JobOrchestrator, TracingActivityLog};
use simplex::domain::{
    CodeSystem, ExecutionContext, RefsetMember, Result, SimplexError, TerminologyError,
};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const CODE_SYSTEM: &str = "SNOMEDCT-XX";
pub const BRANCH: &str = "MAIN/SNOMEDCT-XX";
pub const MODULE: &str = "11000003104";
pub const REFSET: &str = "900000000000509007";

pub fn code_system() -> CodeSystem {
    let mut code_system = CodeSystem::new(CODE_SYSTEM, BRANCH);
    code_system.default_module = Some(MODULE.to_string());
    code_system.content_head_timestamp = 1_000;
    code_system
}

pub fn member(component: &str, active: bool, released: bool) -> RefsetMember {
    let mut member = RefsetMember::new(REFSET, MODULE, component);
    member.active = active;
    member.released = released;
    member
}

/// Terminology store holding one code system and its refset members
pub struct InMemoryTerminology {
    pub code_system: Mutex<CodeSystem>,
    pub members: Mutex<Vec<RefsetMember>>,
    pub concepts: Mutex<HashSet<String>>,
    pub metadata: Mutex<BTreeMap<String, Value>>,
    /// Statuses returned by successive classification polls
    pub classification_states: Mutex<VecDeque<ClassificationState>>,
    pub equivalent_concepts: Mutex<bool>,
    /// Effective dates of created versions
    pub versions: Mutex<Vec<u32>>,
    pub upserts: AtomicUsize,
    pub deletes: AtomicUsize,
    pub saves: AtomicUsize,
}

impl InMemoryTerminology {
    /// Store knowing `concepts` and the refset concept itself
    pub fn new(concepts: &[&str]) -> Self {
        let concepts = concepts
            .iter()
            .chain(&[REFSET])
            .map(|c| c.to_string())
            .collect();
        Self {
            code_system: Mutex::new(code_system()),
            members: Mutex::new(Vec::new()),
            concepts: Mutex::new(concepts),
            metadata: Mutex::new(BTreeMap::new()),
            classification_states: Mutex::new(VecDeque::new()),
            equivalent_concepts: Mutex::new(false),
            versions: Mutex::new(Vec::new()),
            upserts: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn with_members(self, members: Vec<RefsetMember>) -> Self {
        *self.members.lock().unwrap() = members;
        self
    }

    pub fn with_classification_states(self, states: &[ClassificationState]) -> Self {
        self.classification_states
            .lock()
            .unwrap()
            .extend(states.iter().copied());
        self
    }

    pub fn stored(&self) -> Vec<RefsetMember> {
        self.members.lock().unwrap().clone()
    }

    pub fn find(&self, member_id: &str) -> Option<RefsetMember> {
        self.stored().into_iter().find(|m| m.member_id == member_id)
    }

    pub fn metadata_value(&self, key: &str) -> Option<String> {
        self.metadata
            .lock()
            .unwrap()
            .get(key)
            .and_then(|value| value.as_str())
            .map(str::to_string)
    }

    /// Referenced components of active members, sorted
    pub fn active_components(&self) -> Vec<String> {
        let mut components: Vec<String> = self
            .stored()
            .into_iter()
            .filter(|m| m.active)
            .map(|m| m.referenced_component_id)
            .collect();
        components.sort();
        components
    }
}

#[async_trait]
impl RefsetStore for InMemoryTerminology {
    async fn load_members(
        &self,
        _ctx: &ExecutionContext,
        _branch: &str,
        refset_id: &str,
    ) -> Result<Vec<RefsetMember>> {
        Ok(self
            .stored()
            .into_iter()
            .filter(|m| m.refset_id == refset_id)
            .collect())
    }

    async fn existing_concept_ids(
        &self,
        _ctx: &ExecutionContext,
        _branch: &str,
        concept_ids: &[String],
    ) -> Result<HashSet<String>> {
        let concepts = self.concepts.lock().unwrap();
        Ok(concept_ids
            .iter()
            .filter(|id| concepts.contains(*id))
            .cloned()
            .collect())
    }

    async fn count_active_members(
        &self,
        _ctx: &ExecutionContext,
        _branch: &str,
        refset_id: &str,
    ) -> Result<u64> {
        Ok(self
            .stored()
            .iter()
            .filter(|m| m.refset_id == refset_id && m.active)
            .count() as u64)
    }

    async fn bulk_upsert_members(
        &self,
        _ctx: &ExecutionContext,
        _branch: &str,
        members: &[RefsetMember],
    ) -> Result<()> {
        ensure_unique_member_ids(members)?;
        self.upserts.fetch_add(1, Ordering::SeqCst);

        let mut stored = self.members.lock().unwrap();
        for member in members {
            match stored.iter_mut().find(|m| m.member_id == member.member_id) {
                Some(existing) => *existing = member.clone(),
                None => stored.push(member.clone()),
            }
        }
        Ok(())
    }

    async fn bulk_delete_members(
        &self,
        _ctx: &ExecutionContext,
        _branch: &str,
        member_ids: &[String],
    ) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        let mut stored = self.members.lock().unwrap();
        if stored
            .iter()
            .any(|m| m.released && member_ids.contains(&m.member_id))
        {
            return Err(SimplexError::Other("released member deleted".to_string()));
        }
        stored.retain(|m| !member_ids.contains(&m.member_id));
        Ok(())
    }
}

#[async_trait]
impl AuthoringStore for InMemoryTerminology {
    async fn get_code_system(&self, _ctx: &ExecutionContext, short_name: &str) -> Result<CodeSystem> {
        let code_system = self.code_system.lock().unwrap().clone();
        if code_system.short_name != short_name {
            return Err(TerminologyError::NotFound(format!("codesystems/{short_name}")).into());
        }
        Ok(code_system)
    }

    async fn upsert_branch_metadata(
        &self,
        _ctx: &ExecutionContext,
        _branch: &str,
        metadata: &BTreeMap<String, Value>,
    ) -> Result<()> {
        self.metadata
            .lock()
            .unwrap()
            .extend(metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    async fn create_version(
        &self,
        _ctx: &ExecutionContext,
        _short_name: &str,
        effective_date: u32,
    ) -> Result<()> {
        self.versions.lock().unwrap().push(effective_date);
        Ok(())
    }

    async fn create_classification(&self, _ctx: &ExecutionContext, _branch: &str) -> Result<String> {
        Ok("classification-1".to_string())
    }

    async fn get_classification(
        &self,
        _ctx: &ExecutionContext,
        _branch: &str,
        classification_id: &str,
    ) -> Result<Classification> {
        let status = self
            .classification_states
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ClassificationState::Running);
        Ok(Classification {
            id: classification_id.to_string(),
            status,
            equivalent_concepts_found: *self.equivalent_concepts.lock().unwrap(),
        })
    }

    async fn save_classification(
        &self,
        _ctx: &ExecutionContext,
        _branch: &str,
        _classification_id: &str,
    ) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn create_upgrade(
        &self,
        _ctx: &ExecutionContext,
        short_name: &str,
        new_dependant_version: u32,
    ) -> Result<String> {
        Ok(format!("codesystems/{short_name}/upgrade/{new_dependant_version}"))
    }

    async fn get_upgrade(&self, _ctx: &ExecutionContext, _location: &str) -> Result<UpgradeJob> {
        Ok(UpgradeJob {
            status: UpgradeState::Completed,
            error_message: None,
        })
    }
}

pub fn config(concurrency: usize) -> SimplexConfig {
    parse_config(&format!(
        r#"
[terminology]
base_url = "http://localhost:8080/snowstorm/snomed-ct"

[jobs]
concurrency = {concurrency}

[monitor]
initial_delay_seconds = 0
period_seconds = 1
"#
    ))
    .unwrap()
}

/// Only the terminology store; other services unconfigured
pub fn services(store: Arc<InMemoryTerminology>) -> ExternalServices {
    ExternalServices {
        refsets: store.clone(),
        authoring: store,
        release: None,
        validation: None,
        translation: None,
    }
}

pub fn orchestrator(store: Arc<InMemoryTerminology>, config: &SimplexConfig) -> JobOrchestrator {
    orchestrator_with(services(store), config)
}

pub fn orchestrator_with(services: ExternalServices, config: &SimplexConfig) -> JobOrchestrator {
    JobOrchestrator::new(config, services, Arc::new(TracingActivityLog))
}

pub const REPORT_URL: &str = "https://rvf.example.com/api/reports/1";
pub const BUILD_URL: &str = "https://release.example.com/api/builds/1";

pub fn report(status: ReportStatus, failures: u64, warnings: u64) -> ValidationReport {
    ValidationReport {
        status,
        message: None,
        rvf_validation_result: Some(ValidationResult {
            test_result: TestResult {
                total_tests_run: 100,
                total_warnings: warnings,
                total_failures: failures,
            },
            validation_config: ValidationRunConfig {
                content_head_timestamp: Some(1_000),
            },
        }),
    }
}

/// Validation service answering polls from a queue of reports
#[derive(Default)]
pub struct FakeValidation {
    pub reports: Mutex<VecDeque<ValidationReport>>,
}

impl FakeValidation {
    pub fn new(reports: Vec<ValidationReport>) -> Self {
        Self {
            reports: Mutex::new(reports.into()),
        }
    }
}

#[async_trait]
impl ValidationService for FakeValidation {
    async fn start_validation(
        &self,
        _ctx: &ExecutionContext,
        _code_system: &CodeSystem,
    ) -> Result<String> {
        Ok(REPORT_URL.to_string())
    }

    async fn get_validation(
        &self,
        _ctx: &ExecutionContext,
        _report_url: &str,
    ) -> Result<ValidationReport> {
        let report = self.reports.lock().unwrap().pop_front();
        Ok(report.unwrap_or_else(|| report_with_status(ReportStatus::Running)))
    }
}

fn report_with_status(status: ReportStatus) -> ValidationReport {
    ValidationReport {
        status,
        message: None,
        rvf_validation_result: None,
    }
}

pub fn build(status: &str, effective_time: &str) -> Build {
    Build {
        id: "1".to_string(),
        status: Some(status.to_string()),
        effective_time: Some(effective_time.to_string()),
    }
}

/// Release service answering polls from a queue of builds
///
/// The last build keeps being returned once the queue is down to one.
#[derive(Default)]
pub struct FakeRelease {
    pub builds: Mutex<VecDeque<Build>>,
    pub built: Mutex<Vec<u32>>,
    pub published: Mutex<Vec<String>>,
}

impl FakeRelease {
    pub fn new(builds: Vec<Build>) -> Self {
        Self {
            builds: Mutex::new(builds.into()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl ReleaseService for FakeRelease {
    async fn build_product(
        &self,
        _ctx: &ExecutionContext,
        _code_system: &CodeSystem,
        effective_time: u32,
    ) -> Result<String> {
        self.built.lock().unwrap().push(effective_time);
        Ok(BUILD_URL.to_string())
    }

    async fn get_build(&self, _ctx: &ExecutionContext, _build_url: &str) -> Result<Build> {
        let mut builds = self.builds.lock().unwrap();
        let build = if builds.len() > 1 {
            builds.pop_front()
        } else {
            builds.front().cloned()
        };
        build.ok_or_else(|| SimplexError::Other("no build".to_string()))
    }

    async fn publish_build(&self, _ctx: &ExecutionContext, build_url: &str) -> Result<()> {
        self.published.lock().unwrap().push(build_url.to_string());
        Ok(())
    }
}

/// Translation platform reporting translation unit totals from a queue
#[derive(Default)]
pub struct FakeTranslation {
    pub creation_error: Option<String>,
    pub totals: Mutex<VecDeque<u64>>,
    pub initialised: Mutex<Vec<String>>,
}

impl FakeTranslation {
    pub fn new(totals: &[u64]) -> Self {
        Self {
            totals: Mutex::new(totals.iter().copied().collect()),
            ..Self::default()
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            creation_error: Some(error.to_string()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl TranslationPlatform for FakeTranslation {
    async fn initialise_language(
        &self,
        _ctx: &ExecutionContext,
        language_code: &str,
        _name: &str,
    ) -> Result<()> {
        self.initialised
            .lock()
            .unwrap()
            .push(language_code.to_string());
        match &self.creation_error {
            Some(error) => Err(SimplexError::Other(error.clone())),
            None => Ok(()),
        }
    }

    async fn language_stats(
        &self,
        _ctx: &ExecutionContext,
        _language_code: &str,
    ) -> Result<LanguageStats> {
        let total = self.totals.lock().unwrap().pop_front().unwrap_or(0);
        Ok(LanguageStats {
            total,
            translated: 0,
        })
    }
}

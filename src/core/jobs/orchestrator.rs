//! Caller facing entry point for jobs
//!
//! The orchestrator owns the registry, the executor and the monitor and
//! wires the external service clients into the operations. Everything a
//! route handler or the CLI needs goes through it.

use super::activity::{ActivityLog, TracingActivityLog};
use super::executor::{JobExecutor, WorkOutcome};
use super::model::{ContentDetails, Job, JobSnapshot};
use super::registry::{JobFilter, JobRegistry};
use crate::adapters::release::{ReleaseService, ReleaseServiceClient};
use crate::adapters::terminology::{AuthoringStore, RefsetStore, TerminologyClient};
use crate::adapters::translation::{TranslationClient, TranslationPlatform};
use crate::adapters::validation::{ValidationService, ValidationServiceClient};
use crate::config::{JobsConfig, MonitorConfig, SimplexConfig};
use crate::core::monitor::operations::{
    classification, validation, ClassificationOperation, LanguageInitOperation,
    LanguageInitRequest, PublishOperation, ReleaseCandidateOperation, ReleaseCandidateRequest,
    UpgradeOperation, UpgradeRequest, ValidationOperation,
};
use crate::core::monitor::{status, ExternalOperation, OperationMonitor};
use crate::core::reconcile::{ReconciliationEngine, RefsetKind};
use crate::domain::{
    ClassificationStatus, ExecutionContext, JobId, MemberIntent, Result, SimplexError,
    ValidationStatus,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Boxed work future of a refset reconciliation job
type WorkFuture = Pin<Box<dyn Future<Output = Result<WorkOutcome>> + Send>>;

/// Where a refset update job gets its desired members from
enum MemberSource {
    Provided(Vec<MemberIntent>),
    /// JSON member list in the job's staged payload file
    Payload,
}

impl MemberSource {
    async fn load(self, job: &Job) -> Result<Vec<MemberIntent>> {
        match self {
            Self::Provided(desired) => Ok(desired),
            Self::Payload => {
                let path = job
                    .payload()
                    .ok_or_else(|| SimplexError::Job(format!("Job {} has no payload", job.id())))?;
                let text = tokio::fs::read_to_string(&path).await?;
                serde_json::from_str(&text).map_err(|e| {
                    SimplexError::user_content(format!(
                        "The uploaded member list could not be read: {e}"
                    ))
                })
            }
        }
    }
}

/// Display name of refset reconciliation jobs
pub const REFSET_UPDATE_DISPLAY: &str = "Update refset";

/// Clients of the services jobs talk to
///
/// Only the terminology store is mandatory; operations needing a missing
/// service fail to start with a configuration error.
#[derive(Clone)]
pub struct ExternalServices {
    pub refsets: Arc<dyn RefsetStore>,
    pub authoring: Arc<dyn AuthoringStore>,
    pub release: Option<Arc<dyn ReleaseService>>,
    pub validation: Option<Arc<dyn ValidationService>>,
    pub translation: Option<Arc<dyn TranslationPlatform>>,
}

impl ExternalServices {
    /// HTTP clients for every configured service
    pub fn from_config(config: &SimplexConfig) -> Result<Self> {
        let terminology = Arc::new(TerminologyClient::new(&config.terminology)?);

        let release = match &config.release_service {
            Some(release) => {
                Some(Arc::new(ReleaseServiceClient::new(release)?) as Arc<dyn ReleaseService>)
            }
            None => None,
        };
        let validation = match &config.validation_service {
            Some(validation) => Some(
                Arc::new(ValidationServiceClient::new(validation)?) as Arc<dyn ValidationService>,
            ),
            None => None,
        };
        let translation = match &config.translation {
            Some(translation) => Some(
                Arc::new(TranslationClient::new(translation)?) as Arc<dyn TranslationPlatform>,
            ),
            None => None,
        };

        Ok(Self {
            refsets: terminology.clone(),
            authoring: terminology,
            release,
            validation,
            translation,
        })
    }
}

/// A registered content job and the task driving it
pub struct SubmittedJob {
    pub job: Arc<Job>,
    pub handle: JoinHandle<()>,
}

struct Operations {
    classification: Arc<ClassificationOperation>,
    upgrade: Arc<UpgradeOperation>,
    validation: Option<Arc<ValidationOperation>>,
    release_candidate: Option<Arc<ReleaseCandidateOperation>>,
    publish: Option<Arc<PublishOperation>>,
    language_init: Option<Arc<LanguageInitOperation>>,
}

impl Operations {
    fn new(services: &ExternalServices) -> Self {
        let authoring = &services.authoring;
        Self {
            classification: Arc::new(ClassificationOperation::new(Arc::clone(authoring))),
            upgrade: Arc::new(UpgradeOperation::new(Arc::clone(authoring))),
            validation: services.validation.as_ref().map(|validation| {
                Arc::new(ValidationOperation::new(
                    Arc::clone(authoring),
                    Arc::clone(validation),
                ))
            }),
            release_candidate: services.release.as_ref().map(|release| {
                Arc::new(ReleaseCandidateOperation::new(
                    Arc::clone(authoring),
                    Arc::clone(release),
                ))
            }),
            publish: services.release.as_ref().map(|release| {
                Arc::new(PublishOperation::new(Arc::clone(authoring), Arc::clone(release)))
            }),
            language_init: services.translation.as_ref().map(|translation| {
                Arc::new(LanguageInitOperation::new(
                    Arc::clone(&services.refsets),
                    Arc::clone(authoring),
                    Arc::clone(translation),
                ))
            }),
        }
    }
}

pub struct JobOrchestrator {
    jobs_config: JobsConfig,
    monitor_config: MonitorConfig,
    registry: Arc<JobRegistry>,
    executor: JobExecutor,
    monitor: Arc<OperationMonitor>,
    engine: Arc<ReconciliationEngine>,
    refsets: Arc<dyn RefsetStore>,
    authoring: Arc<dyn AuthoringStore>,
    validation: Option<Arc<dyn ValidationService>>,
    operations: Operations,
}

impl JobOrchestrator {
    pub fn new(
        config: &SimplexConfig,
        services: ExternalServices,
        activity: Arc<dyn ActivityLog>,
    ) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let executor = JobExecutor::new(&config.jobs, Arc::clone(&activity));
        let monitor = Arc::new(OperationMonitor::new(Arc::clone(&registry), activity));
        let engine = Arc::new(ReconciliationEngine::new(
            Arc::clone(&services.refsets),
            config.jobs.serialize_refset_updates,
        ));
        let operations = Operations::new(&services);

        tracing::debug!(
            concurrency = executor.concurrency(),
            release_service = services.release.is_some(),
            validation_service = services.validation.is_some(),
            translation = services.translation.is_some(),
            "Job orchestrator created"
        );

        Self {
            jobs_config: config.jobs.clone(),
            monitor_config: config.monitor.clone(),
            registry,
            executor,
            monitor,
            engine,
            refsets: services.refsets,
            authoring: services.authoring,
            validation: services.validation,
            operations,
        }
    }

    /// Orchestrator backed by HTTP clients built from `config`
    pub fn from_config(config: &SimplexConfig) -> Result<Self> {
        let services = ExternalServices::from_config(config)?;
        Ok(Self::new(config, services, Arc::new(TracingActivityLog)))
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn monitor(&self) -> &Arc<OperationMonitor> {
        &self.monitor
    }

    /// Registers a `QUEUED` content job and hands it to the executor
    pub fn submit_content_job<F, Fut>(
        &self,
        code_system: &str,
        display: &str,
        details: ContentDetails,
        ctx: ExecutionContext,
        work: F,
    ) -> SubmittedJob
    where
        F: FnOnce(Arc<Job>, ExecutionContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<WorkOutcome>> + Send + 'static,
    {
        let job = Arc::new(Job::content(code_system, display, details, ctx));
        self.enqueue(job, work)
    }

    fn enqueue<F, Fut>(&self, job: Arc<Job>, work: F) -> SubmittedJob
    where
        F: FnOnce(Arc<Job>, ExecutionContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<WorkOutcome>> + Send + 'static,
    {
        self.registry.put(Arc::clone(&job));
        let handle = self.executor.submit(Arc::clone(&job), work);
        SubmittedJob { job, handle }
    }

    /// Reconciles a refset to `desired` as a content job
    pub fn submit_refset_update(
        &self,
        code_system: &str,
        refset_id: &str,
        kind: RefsetKind,
        desired: Vec<MemberIntent>,
        ctx: ExecutionContext,
    ) -> SubmittedJob {
        let details = ContentDetails {
            refset_id: Some(refset_id.to_string()),
            original_filename: None,
        };
        let job = Arc::new(Job::content(code_system, REFSET_UPDATE_DISPLAY, details, ctx));
        let work = self.refset_work(code_system, refset_id, kind, MemberSource::Provided(desired));
        self.enqueue(job, work)
    }

    /// Reconciles a refset to an uploaded JSON member list
    ///
    /// The upload is copied to a temporary file first; it is parsed when the
    /// job runs and deleted when it ends. A staging failure is returned and
    /// nothing is registered.
    pub async fn submit_refset_upload<R>(
        &self,
        code_system: &str,
        refset_id: &str,
        kind: RefsetKind,
        original_filename: &str,
        upload: R,
        ctx: ExecutionContext,
    ) -> Result<SubmittedJob>
    where
        R: AsyncRead + Unpin,
    {
        let details = ContentDetails {
            refset_id: Some(refset_id.to_string()),
            original_filename: Some(original_filename.to_string()),
        };
        let job = Arc::new(Job::content(code_system, REFSET_UPDATE_DISPLAY, details, ctx));
        self.executor.stage_payload(&job, upload).await?;

        let work = self.refset_work(code_system, refset_id, kind, MemberSource::Payload);
        Ok(self.enqueue(job, work))
    }

    fn refset_work(
        &self,
        code_system: &str,
        refset_id: &str,
        kind: RefsetKind,
        source: MemberSource,
    ) -> impl FnOnce(Arc<Job>, ExecutionContext) -> WorkFuture + Send + 'static {
        let engine = Arc::clone(&self.engine);
        let authoring = Arc::clone(&self.authoring);
        let refsets = Arc::clone(&self.refsets);
        let code_system = code_system.to_string();
        let refset_id = refset_id.to_string();

        move |job: Arc<Job>, ctx: ExecutionContext| -> WorkFuture {
            Box::pin(async move {
                let code_system = authoring.get_code_system(&ctx, &code_system).await?;
                let found = refsets
                    .existing_concept_ids(
                        &ctx,
                        code_system.working_branch_path(),
                        std::slice::from_ref(&refset_id),
                    )
                    .await?;
                if !found.contains(&refset_id) {
                    return Err(SimplexError::user_content(format!(
                        "Refset {refset_id} does not exist."
                    )));
                }

                let desired = source.load(&job).await?;
                job.set_records_total(desired.len() as u64);
                let refset_type = kind.refset_type();
                let result = engine
                    .reconcile(
                        &ctx,
                        &code_system,
                        &refset_id,
                        refset_type.as_ref(),
                        desired,
                        job.as_ref(),
                    )
                    .await?;
                Ok::<_, SimplexError>(result.into_outcome())
            })
        }
    }

    async fn start_operation<O>(
        &self,
        operation: Option<&Arc<O>>,
        service: &str,
        code_system: &str,
        request: O::Request,
        ctx: ExecutionContext,
    ) -> Result<Arc<Job>>
    where
        O: ExternalOperation,
    {
        let operation = operation
            .ok_or_else(|| SimplexError::Configuration(format!("{service} is not configured")))?;
        let code_system = self.authoring.get_code_system(&ctx, code_system).await?;
        self.monitor
            .start(Arc::clone(operation), &code_system, request, ctx)
            .await
    }

    pub async fn start_classification(
        &self,
        code_system: &str,
        ctx: ExecutionContext,
    ) -> Result<Arc<Job>> {
        self.start_operation(
            Some(&self.operations.classification),
            "Terminology server",
            code_system,
            (),
            ctx,
        )
        .await
    }

    pub async fn start_validation(
        &self,
        code_system: &str,
        ctx: ExecutionContext,
    ) -> Result<Arc<Job>> {
        self.start_operation(
            self.operations.validation.as_ref(),
            "Validation service",
            code_system,
            (),
            ctx,
        )
        .await
    }

    pub async fn start_release_candidate(
        &self,
        code_system: &str,
        request: ReleaseCandidateRequest,
        ctx: ExecutionContext,
    ) -> Result<Arc<Job>> {
        self.start_operation(
            self.operations.release_candidate.as_ref(),
            "Release service",
            code_system,
            request,
            ctx,
        )
        .await
    }

    pub async fn start_upgrade(
        &self,
        code_system: &str,
        request: UpgradeRequest,
        ctx: ExecutionContext,
    ) -> Result<Arc<Job>> {
        self.start_operation(
            Some(&self.operations.upgrade),
            "Terminology server",
            code_system,
            request,
            ctx,
        )
        .await
    }

    pub async fn start_language_init(
        &self,
        code_system: &str,
        request: LanguageInitRequest,
        ctx: ExecutionContext,
    ) -> Result<Arc<Job>> {
        self.start_operation(
            self.operations.language_init.as_ref(),
            "Translation platform",
            code_system,
            request,
            ctx,
        )
        .await
    }

    pub async fn publish_release(
        &self,
        code_system: &str,
        ctx: ExecutionContext,
    ) -> Result<Arc<Job>> {
        self.start_operation(
            self.operations.publish.as_ref(),
            "Release service",
            code_system,
            (),
            ctx,
        )
        .await
    }

    pub fn get_job(&self, code_system: &str, id: &JobId) -> Option<JobSnapshot> {
        self.registry.get(code_system, id).map(|job| job.snapshot())
    }

    /// Jobs of one code system, or of all, most recent first
    pub fn list_jobs(&self, code_system: Option<&str>, filter: &JobFilter) -> Vec<JobSnapshot> {
        self.registry
            .list(code_system, filter)
            .iter()
            .map(|job| job.snapshot())
            .collect()
    }

    pub async fn classification_status(
        &self,
        code_system: &str,
        ctx: &ExecutionContext,
    ) -> Result<ClassificationStatus> {
        let code_system = self.authoring.get_code_system(ctx, code_system).await?;
        let latest = self
            .registry
            .latest(&code_system.short_name, |job| job.display() == classification::DISPLAY);
        Ok(status::classification_status(&code_system, latest.as_deref()))
    }

    /// Validation status from the latest validation job
    ///
    /// After a restart no job is known; the status is then recovered from the
    /// report recorded in branch metadata, if the validation service is
    /// configured and the report can be fetched.
    pub async fn validation_status(
        &self,
        code_system: &str,
        ctx: &ExecutionContext,
    ) -> Result<ValidationStatus> {
        let code_system = self.authoring.get_code_system(ctx, code_system).await?;
        if let Some(job) = self
            .registry
            .latest(&code_system.short_name, |job| job.display() == validation::DISPLAY)
        {
            return Ok(status::validation_status_from_job(&code_system, &job));
        }

        let (Some(service), Some(report_url)) = (
            self.validation.as_ref(),
            code_system.latest_validation_report.as_deref(),
        ) else {
            return Ok(ValidationStatus::Todo);
        };
        match service.get_validation(ctx, report_url).await {
            Ok(report) => Ok(status::validation_status_from_report(&code_system, &report)),
            Err(e) => {
                tracing::warn!(
                    code_system = %code_system.short_name,
                    report = report_url,
                    error = %e,
                    "Failed to recover validation status from report"
                );
                Ok(ValidationStatus::Todo)
            }
        }
    }

    /// Removes jobs older than the configured expiry
    pub fn expire_jobs(&self) -> usize {
        expire(&self.registry, self.jobs_config.expiry_days)
    }

    /// Starts the monitor sweep and the expiry sweep
    ///
    /// Both stop when `shutdown` flips to true or its sender is dropped.
    pub fn spawn_schedulers(&self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let monitor = self
            .monitor
            .spawn_scheduler(&self.monitor_config, shutdown.clone());

        let registry = Arc::clone(&self.registry);
        let expiry_days = self.jobs_config.expiry_days;
        let period = Duration::from_secs(self.jobs_config.expiry_interval_seconds.max(1));
        let mut shutdown = shutdown;
        let expiry = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        expire(&registry, expiry_days);
                    }
                    _ = shutdown.changed() => break,
                }
            }
            tracing::debug!("Expiry scheduler stopped");
        });

        vec![monitor, expiry]
    }
}

fn expire(registry: &JobRegistry, expiry_days: u32) -> usize {
    let removed = registry.expire(expiry_days);
    if removed > 0 {
        tracing::info!(removed, expiry_days, remaining = registry.len(), "Expired old jobs");
    }
    removed
}

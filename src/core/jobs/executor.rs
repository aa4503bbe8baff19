//! Bounded executor for content jobs
//!
//! Each submitted job gets its own tokio task, but only `concurrency` of
//! them run their work at once. The rest wait on the semaphore, which hands
//! out permits in FIFO order. Submission never blocks.

use super::activity::ActivityLog;
use super::model::Job;
use super::support::SupportRegister;
use crate::config::JobsConfig;
use crate::domain::{ChangeSummary, ExecutionContext, JobStatus, Result, SimplexError};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncRead;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Prefix of the temporary copy of an uploaded payload
const PAYLOAD_FILE_PREFIX: &str = "user-temp-file_";

/// What a successful work function reports back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkOutcome {
    pub summary: ChangeSummary,
    /// Non-fatal content problems; ends the job as `CONTENT_ISSUE`
    pub content_issue: Option<String>,
}

impl WorkOutcome {
    pub fn complete(summary: ChangeSummary) -> Self {
        Self {
            summary,
            content_issue: None,
        }
    }

    pub fn with_content_issue(summary: ChangeSummary, message: impl Into<String>) -> Self {
        Self {
            summary,
            content_issue: Some(message.into()),
        }
    }
}

/// Runs content jobs on a fixed number of workers
pub struct JobExecutor {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    temp_dir: PathBuf,
    support: SupportRegister,
    activity: Arc<dyn ActivityLog>,
}

impl JobExecutor {
    pub fn new(config: &JobsConfig, activity: Arc<dyn ActivityLog>) -> Self {
        let concurrency = config.concurrency.max(1);
        let temp_dir = config
            .temp_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);

        Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            temp_dir,
            support: SupportRegister::new(),
            activity,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Copies an uploaded payload to a temporary file owned by the job
    ///
    /// The file is deleted when the job finishes, whatever the outcome.
    pub async fn stage_payload<R>(&self, job: &Job, mut reader: R) -> Result<PathBuf>
    where
        R: AsyncRead + Unpin,
    {
        let path = self
            .temp_dir
            .join(format!("{PAYLOAD_FILE_PREFIX}{}", job.id()));
        let mut file = tokio::fs::File::create(&path).await?;
        let bytes = tokio::io::copy(&mut reader, &mut file).await?;
        job.set_payload(path.clone());

        tracing::debug!(job_id = %job.id(), bytes, path = %path.display(), "Staged job payload");
        Ok(path)
    }

    /// Queues a job that is already `QUEUED` and registered
    ///
    /// `work` receives the job and the caller's execution context. Its
    /// result, error or panic decides the job's terminal status.
    pub fn submit<F, Fut>(&self, job: Arc<Job>, work: F) -> JoinHandle<()>
    where
        F: FnOnce(Arc<Job>, ExecutionContext) -> Fut + Send + 'static,
        Fut: Future<Output = Result<WorkOutcome>> + Send + 'static,
    {
        let semaphore = Arc::clone(&self.semaphore);
        let support = self.support;
        let activity = Arc::clone(&self.activity);

        activity.started(&job);
        tracing::debug!(job_id = %job.id(), "Job queued");

        tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    support.handle_system_error(&job, "Job could not be scheduled.", Some(&e));
                    finish_job(&job, activity.as_ref()).await;
                    return;
                }
            };
            run_job(job, work, support, activity).await;
        })
    }
}

async fn run_job<F, Fut>(
    job: Arc<Job>,
    work: F,
    support: SupportRegister,
    activity: Arc<dyn ActivityLog>,
) where
    F: FnOnce(Arc<Job>, ExecutionContext) -> Fut + Send + 'static,
    Fut: Future<Output = Result<WorkOutcome>> + Send + 'static,
{
    let started = Instant::now();
    job.transition_to(JobStatus::InProgress);
    crate::log_job_start!(job.code_system(), job.id(), job.display());

    // Run the work on its own task so a panic surfaces as a join error
    let ctx = job.context().clone();
    let worker_job = Arc::clone(&job);
    let result = tokio::spawn(async move { work(worker_job, ctx).await }).await;

    match result {
        Ok(Ok(outcome)) => {
            job.set_change_summary(outcome.summary);
            match outcome.content_issue {
                Some(message) => job.finish(JobStatus::ContentIssue, message),
                None => job.transition_to(JobStatus::Complete),
            };
        }
        Ok(Err(e)) => handle_failure(&job, &e, &support),
        Err(join_error) => {
            support.handle_system_error(&job, "Unexpected error.", Some(&join_error));
        }
    }

    finish_job(&job, activity.as_ref()).await;
    crate::log_job_finish!(job.code_system(), job.id(), job.status(), started.elapsed());
}

/// Maps a work error to the job's terminal status
fn handle_failure(job: &Job, error: &SimplexError, support: &SupportRegister) {
    job.set_cause(error);
    match error.job_status() {
        JobStatus::SystemError => support.handle_system_error(job, &error.to_string(), None),
        JobStatus::TechnicalContentIssue => {
            support.handle_technical_content_issue(job, &error.to_string())
        }
        status => {
            job.finish(status, error.to_string());
        }
    }
}

async fn finish_job(job: &Job, activity: &dyn ActivityLog) {
    if let Some(path) = job.take_payload() {
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::info!(
                job_id = %job.id(),
                path = %path.display(),
                error = %e,
                "Failed to delete temp file"
            );
        }
    }
    activity.ended(job);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::jobs::activity::TracingActivityLog;
    use crate::core::jobs::model::ContentDetails;

    fn executor(temp_dir: Option<String>) -> JobExecutor {
        let config = JobsConfig {
            concurrency: 2,
            temp_dir,
            ..JobsConfig::default()
        };
        JobExecutor::new(&config, Arc::new(TracingActivityLog))
    }

    fn job() -> Arc<Job> {
        Arc::new(Job::content(
            "SNOMEDCT-XX",
            "Update refset",
            ContentDetails::default(),
            ExecutionContext::new("author"),
        ))
    }

    #[tokio::test]
    async fn test_successful_work_records_summary() {
        let job = job();
        executor(None)
            .submit(job.clone(), |_, _| async {
                Ok(WorkOutcome::complete(ChangeSummary::new(2, 1, 0, 3)))
            })
            .await
            .unwrap();

        assert_eq!(job.status(), JobStatus::Complete);
        assert_eq!(job.change_summary(), Some(ChangeSummary::new(2, 1, 0, 3)));
    }

    #[tokio::test]
    async fn test_work_receives_caller_context() {
        let job = job();
        executor(None)
            .submit(job.clone(), |_, ctx| async move {
                if ctx.username() == "author" {
                    Ok(WorkOutcome::complete(ChangeSummary::default()))
                } else {
                    Err(SimplexError::Other("wrong user".to_string()))
                }
            })
            .await
            .unwrap();
        assert_eq!(job.status(), JobStatus::Complete);
    }

    #[tokio::test]
    async fn test_content_issue_outcome() {
        let job = job();
        executor(None)
            .submit(job.clone(), |_, _| async {
                Ok(WorkOutcome::with_content_issue(
                    ChangeSummary::new(1, 0, 0, 1),
                    "1 concept was not found",
                ))
            })
            .await
            .unwrap();

        assert_eq!(job.status(), JobStatus::ContentIssue);
        assert_eq!(job.error_message().as_deref(), Some("1 concept was not found"));
    }

    #[tokio::test]
    async fn test_user_content_error_is_not_escalated() {
        let job = job();
        executor(None)
            .submit(job.clone(), |_, _| async {
                Err(SimplexError::user_content("Column B is empty"))
            })
            .await
            .unwrap();

        assert_eq!(job.status(), JobStatus::UserContentError);
        assert_eq!(job.error_message().as_deref(), Some("Column B is empty"));
    }

    #[tokio::test]
    async fn test_unrecognised_error_is_system_error() {
        let job = job();
        executor(None)
            .submit(job.clone(), |_, _| async {
                Err(SimplexError::Other("socket closed".to_string()))
            })
            .await
            .unwrap();

        assert_eq!(job.status(), JobStatus::SystemError);
        assert!(job
            .error_message()
            .unwrap()
            .contains("The support team have been made aware"));
    }

    #[tokio::test]
    async fn test_panic_becomes_system_error() {
        let job = job();
        executor(None)
            .submit(job.clone(), |_, _| async {
                if true {
                    panic!("worker exploded");
                }
                Ok(WorkOutcome::complete(ChangeSummary::default()))
            })
            .await
            .unwrap();

        assert_eq!(job.status(), JobStatus::SystemError);
        assert!(job.error_message().unwrap().starts_with("Unexpected error."));
    }

    #[tokio::test]
    async fn test_payload_deleted_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let executor = executor(Some(dir.path().to_string_lossy().to_string()));
        let job = job();

        let path = executor
            .stage_payload(&job, &b"conceptId\n123456"[..])
            .await
            .unwrap();
        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("user-temp-file_"));

        executor
            .submit(job.clone(), |job, _| async move {
                let payload = job.payload().unwrap();
                let text = tokio::fs::read_to_string(payload).await?;
                assert!(text.contains("123456"));
                Err(SimplexError::user_content("Bad file"))
            })
            .await
            .unwrap();

        assert!(!path.exists());
        assert_eq!(job.status(), JobStatus::UserContentError);
    }
}

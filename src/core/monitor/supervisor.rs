//! Polling supervisor for external service jobs
//!
//! Jobs with an external id are kept in the jobs-to-monitor map next to the
//! registry entry for the same `Arc<Job>`. One background task sweeps the
//! map: it polls each job in turn with the job's own execution context and
//! drops the ones that are done. A failing or panicking poll ends
//! monitoring for that job only.

use super::operation::{ExternalOperation, OperationPoller};
use crate::config::MonitorConfig;
use crate::core::jobs::{ActivityLog, ExternalDetails, Job, JobRegistry, SupportRegister};
use crate::domain::{CodeSystem, ExecutionContext, JobStatus, Result};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// (operation display name, external id)
type MonitorKey = (&'static str, String);

#[derive(Clone)]
struct MonitoredJob {
    job: Arc<Job>,
    external_id: String,
    poller: Arc<dyn OperationPoller>,
}

/// Supervises every kind of external operation
pub struct OperationMonitor {
    registry: Arc<JobRegistry>,
    support: SupportRegister,
    activity: Arc<dyn ActivityLog>,
    jobs_to_monitor: Mutex<HashMap<MonitorKey, MonitoredJob>>,
}

impl OperationMonitor {
    pub fn new(registry: Arc<JobRegistry>, activity: Arc<dyn ActivityLog>) -> Self {
        Self {
            registry,
            support: SupportRegister::new(),
            activity,
            jobs_to_monitor: Mutex::new(HashMap::new()),
        }
    }

    fn monitored(&self) -> MutexGuard<'_, HashMap<MonitorKey, MonitoredJob>> {
        self.jobs_to_monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts an operation and tracks the resulting job
    ///
    /// The job is registered whenever the operation starts without error, and
    /// monitored only when an external id came back. A start error is
    /// returned to the caller and the job is not registered.
    pub async fn start<O>(
        &self,
        operation: Arc<O>,
        code_system: &CodeSystem,
        request: O::Request,
        ctx: ExecutionContext,
    ) -> Result<Arc<Job>>
    where
        O: ExternalOperation,
    {
        let job = Arc::new(Job::external(
            code_system.short_name.clone(),
            operation.display(),
            ExternalDetails {
                branch: code_system.working_branch_path().to_string(),
                content_head_timestamp: code_system.content_head_timestamp,
            },
            ctx.clone(),
        ));

        let external_id = match operation.start(&job, code_system, &request, &ctx).await {
            Ok(external_id) => external_id,
            Err(e) => {
                match e.job_status() {
                    JobStatus::SystemError => self.support.handle_system_error(
                        &job,
                        &format!("Failed to create {}.", operation.function_name()),
                        Some(&e),
                    ),
                    status => {
                        job.finish(status, e.to_string());
                    }
                }
                return Err(e);
            }
        };

        self.registry.put(Arc::clone(&job));
        self.activity.started(&job);

        match external_id {
            Some(external_id) => {
                tracing::info!(
                    code_system = %job.code_system(),
                    job_id = %job.id(),
                    operation = operation.display(),
                    external_id = %external_id,
                    "Monitoring external operation"
                );
                let poller: Arc<dyn OperationPoller> = operation;
                self.monitored().insert(
                    (poller.name(), external_id.clone()),
                    MonitoredJob {
                        job: Arc::clone(&job),
                        external_id,
                        poller,
                    },
                );
            }
            None => {
                tracing::debug!(
                    job_id = %job.id(),
                    status = %job.status(),
                    "Operation returned nothing to monitor"
                );
                self.activity.ended(&job);
            }
        }

        Ok(job)
    }

    /// Polls every monitored job once, returning how many finished
    pub async fn sweep(&self) -> usize {
        let snapshot: Vec<(MonitorKey, MonitoredJob)> = self
            .monitored()
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();

        let mut finished = 0;
        for (key, entry) in snapshot {
            let job = &entry.job;
            let poll = entry.poller.check(job, &entry.external_id, job.context());
            let done = match AssertUnwindSafe(poll).catch_unwind().await {
                Ok(Ok(done)) => done || job.is_terminal(),
                Ok(Err(e)) => {
                    tracing::warn!(
                        job_id = %job.id(),
                        operation = entry.poller.name(),
                        error = %e,
                        "Polling external operation failed"
                    );
                    self.support
                        .handle_system_error(job, entry.poller.failure_message(), Some(&e));
                    true
                }
                Err(panic) => {
                    let reason = panic_reason(panic.as_ref());
                    tracing::error!(
                        job_id = %job.id(),
                        operation = entry.poller.name(),
                        panic = %reason,
                        "Polling external operation panicked"
                    );
                    self.support.handle_system_error(job, "Unexpected error.", Some(&reason));
                    true
                }
            };

            if done {
                self.monitored().remove(&key);
                self.activity.ended(job);
                tracing::info!(
                    code_system = %job.code_system(),
                    job_id = %job.id(),
                    status = %job.status(),
                    "External operation finished"
                );
                finished += 1;
            }
        }
        finished
    }

    pub fn is_monitored(&self, job: &Job) -> bool {
        self.monitored()
            .values()
            .any(|entry| entry.job.id() == job.id())
    }

    pub fn monitored_count(&self) -> usize {
        self.monitored().len()
    }

    /// Sweeps on a fixed delay until `shutdown` flips or its sender drops
    pub fn spawn_scheduler(
        self: &Arc<Self>,
        config: &MonitorConfig,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        let initial_delay = Duration::from_secs(config.initial_delay_seconds);
        let period = Duration::from_secs(config.period_seconds.max(1));

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(initial_delay) => {}
                _ = shutdown.changed() => return,
            }

            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        monitor.sweep().await;
                    }
                    _ = shutdown.changed() => break,
                }
            }
            tracing::debug!("Monitor scheduler stopped");
        })
    }
}

fn panic_reason(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|reason| reason.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

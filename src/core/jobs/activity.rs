//! Activity hooks fired around job execution

use super::model::Job;

/// Receives job start and end events for the user activity log
pub trait ActivityLog: Send + Sync {
    /// A job was accepted (queued or started)
    fn started(&self, job: &Job);

    /// A job reached a terminal status or stopped being monitored
    fn ended(&self, job: &Job);
}

/// Activity log that writes events through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingActivityLog;

impl ActivityLog for TracingActivityLog {
    fn started(&self, job: &Job) {
        tracing::info!(
            code_system = %job.code_system(),
            job_id = %job.id(),
            username = %job.context().username(),
            display = %job.display(),
            "Activity started"
        );
    }

    fn ended(&self, job: &Job) {
        tracing::info!(
            code_system = %job.code_system(),
            job_id = %job.id(),
            username = %job.context().username(),
            status = %job.status(),
            "Activity ended"
        );
    }
}

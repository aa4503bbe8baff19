//! Progress reporting out of a reconciliation run

use crate::core::jobs::Job;

/// Receives the percentage checkpoints of a run
pub trait ProgressSink: Send + Sync {
    fn report(&self, percent: u8);
}

impl ProgressSink for Job {
    fn report(&self, percent: u8) {
        self.set_progress_percent(percent);
    }
}

/// Discards progress, for runs without a job
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _percent: u8) {}
}

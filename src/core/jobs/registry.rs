//! In-memory job registry keyed by code system
//!
//! Every operation takes the single registry lock for its duration only.

use super::model::Job;
use crate::domain::{JobId, JobType};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Optional filters for [`JobRegistry::list`]
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub job_type: Option<JobType>,
    pub refset_id: Option<String>,
}

impl JobFilter {
    fn matches(&self, job: &Job) -> bool {
        if let Some(job_type) = self.job_type {
            if job.job_type() != job_type {
                return false;
            }
        }
        match &self.refset_id {
            Some(refset_id) => job.refset_id() == Some(refset_id.as_str()),
            None => true,
        }
    }
}

/// Jobs per scope, in insertion order
#[derive(Default)]
pub struct JobRegistry {
    scopes: Mutex<HashMap<String, Vec<Arc<Job>>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn scopes(&self) -> MutexGuard<'_, HashMap<String, Vec<Arc<Job>>>> {
        self.scopes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a job to its code system scope
    ///
    /// A job already registered under the same id is replaced in place.
    pub fn put(&self, job: Arc<Job>) {
        let mut scopes = self.scopes();
        let jobs = scopes.entry(job.code_system().to_string()).or_default();
        match jobs.iter_mut().find(|existing| existing.id() == job.id()) {
            Some(existing) => *existing = job,
            None => jobs.push(job),
        }
    }

    pub fn get(&self, scope: &str, id: &JobId) -> Option<Arc<Job>> {
        self.scopes()
            .get(scope)
            .and_then(|jobs| jobs.iter().find(|job| job.id() == id).cloned())
    }

    /// Jobs of one scope, or of all scopes, most recent first
    pub fn list(&self, scope: Option<&str>, filter: &JobFilter) -> Vec<Arc<Job>> {
        let scopes = self.scopes();
        let mut jobs: Vec<Arc<Job>> = match scope {
            Some(scope) => scopes.get(scope).map(|jobs| jobs.to_vec()).unwrap_or_default(),
            None => scopes.values().flatten().cloned().collect(),
        };
        drop(scopes);

        jobs.retain(|job| filter.matches(job));
        jobs.sort_by(|a, b| b.created().cmp(&a.created()));
        jobs
    }

    /// Most recently registered job of a scope matching `predicate`
    pub fn latest<P>(&self, scope: &str, predicate: P) -> Option<Arc<Job>>
    where
        P: Fn(&Job) -> bool,
    {
        self.scopes()
            .get(scope)
            .and_then(|jobs| jobs.iter().rev().find(|job| predicate(job)).cloned())
    }

    /// Removes jobs created more than `max_age_days` ago, returning how many
    pub fn expire(&self, max_age_days: u32) -> usize {
        self.expire_before(Utc::now() - Duration::days(i64::from(max_age_days)))
    }

    pub fn expire_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut scopes = self.scopes();
        let mut removed = 0;
        for jobs in scopes.values_mut() {
            let before = jobs.len();
            jobs.retain(|job| job.created() >= cutoff);
            removed += before - jobs.len();
        }
        scopes.retain(|_, jobs| !jobs.is_empty());
        removed
    }

    pub fn len(&self) -> usize {
        self.scopes().values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

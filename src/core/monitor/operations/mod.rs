//! One [`ExternalOperation`](super::ExternalOperation) per kind of external work

pub mod classification;
pub mod language_init;
pub mod publish;
pub mod release_candidate;
pub mod upgrade;
pub mod validation;

pub use classification::ClassificationOperation;
pub use language_init::{LanguageInitOperation, LanguageInitRequest};
pub use publish::PublishOperation;
pub use release_candidate::{ReleaseCandidateOperation, ReleaseCandidateRequest};
pub use upgrade::{UpgradeOperation, UpgradeRequest};
pub use validation::ValidationOperation;

use crate::core::jobs::Job;
use crate::domain::{Result, SimplexError};
use serde_json::Value;
use std::collections::BTreeMap;

/// Branch an external job was started on
fn job_branch(job: &Job) -> Result<&str> {
    job.branch()
        .ok_or_else(|| SimplexError::Job(format!("Job {} has no branch", job.id())))
}

/// Branch metadata map with string values
fn metadata<const N: usize>(entries: [(&str, &str); N]) -> BTreeMap<String, Value> {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
        .collect()
}

//! Wire models for the terminology server REST API

use crate::domain::code_system::CodeSystemVersion;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One page of a search result
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub search_after: Option<String>,
}

/// Status of a bulk member change job
#[derive(Debug, Clone, Deserialize)]
pub struct BulkJobStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl BulkJobStatus {
    pub fn is_running(&self) -> bool {
        self.status == "RUNNING"
    }

    pub fn is_completed(&self) -> bool {
        self.status == "COMPLETED"
    }
}

/// Lifecycle of a classification run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationState {
    Scheduled,
    Running,
    Failed,
    Completed,
    Stale,
    SavingInProgress,
    Saved,
    SaveFailed,
}

/// A classification run on a branch
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    #[serde(default)]
    pub id: String,
    pub status: ClassificationState,
    #[serde(default)]
    pub equivalent_concepts_found: bool,
}

/// Lifecycle of a code system upgrade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpgradeState {
    Running,
    Failed,
    Completed,
}

/// A code system upgrade job
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeJob {
    pub status: UpgradeState,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Code system resource as returned by `GET /codesystems/{shortName}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CodeSystemResource {
    #[serde(default)]
    pub name: String,
    pub short_name: String,
    pub branch_path: String,
    #[serde(default)]
    pub dependant_version_effective_time: Option<u32>,
    #[serde(default)]
    pub latest_version: Option<CodeSystemVersion>,
}

/// Branch resource as returned by `GET /branches/{path}`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BranchResource {
    #[serde(default)]
    pub head_timestamp: i64,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl BranchResource {
    pub fn metadata_str(&self, key: &str) -> Option<String> {
        match self.metadata.get(key) {
            Some(Value::String(value)) if !value.is_empty() => Some(value.clone()),
            _ => None,
        }
    }

    pub fn metadata_flag(&self, key: &str) -> bool {
        match self.metadata.get(key) {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(value)) => value.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }
}

//! Code system (authoring scope) model and derived status enums

use crate::domain::errors::SimplexError;
use serde::{Deserialize, Serialize};

/// Branch metadata key holding the latest validation report URL
pub const LATEST_VALIDATION_REPORT_KEY: &str = "latestValidationReport";

/// Branch metadata key holding the latest release candidate build URL
pub const LATEST_BUILD_KEY: &str = "latestReleaseCandidateBuild";

/// Branch metadata key holding the release candidate build status
pub const BUILD_STATUS_KEY: &str = "buildStatus";

/// A published version of a code system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSystemVersion {
    pub effective_date: u32,
    #[serde(default)]
    pub branch_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_package: Option<String>,
}

/// A code system as reported by the terminology store
///
/// `short_name` is the registry scope for its jobs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSystem {
    #[serde(default)]
    pub name: String,
    pub short_name: String,
    pub branch_path: String,
    #[serde(default, rename = "simplexWorkingBranch")]
    pub working_branch: Option<String>,
    #[serde(default)]
    pub default_module: Option<String>,
    #[serde(default)]
    pub content_head_timestamp: i64,
    #[serde(default)]
    pub classified: bool,
    #[serde(default)]
    pub latest_validation_report: Option<String>,
    #[serde(default)]
    pub latest_release_candidate_build: Option<String>,
    #[serde(default)]
    pub dependant_version_effective_time: Option<u32>,
    #[serde(default)]
    pub latest_version: Option<CodeSystemVersion>,
}

impl CodeSystem {
    pub fn new(short_name: impl Into<String>, branch_path: impl Into<String>) -> Self {
        let short_name = short_name.into();
        Self {
            name: short_name.clone(),
            short_name,
            branch_path: branch_path.into(),
            ..Self::default()
        }
    }

    /// The branch authoring happens on; falls back to the code system branch
    pub fn working_branch_path(&self) -> &str {
        match self.working_branch.as_deref() {
            Some(branch) if !branch.trim().is_empty() => branch,
            _ => &self.branch_path,
        }
    }

    /// The module new components are created in
    pub fn default_module_or_err(&self) -> Result<&str, SimplexError> {
        self.default_module.as_deref().ok_or_else(|| {
            SimplexError::user_content("No default module set for this code system.")
        })
    }

    /// Effective date of the latest published version, if any
    pub fn latest_version_effective_date(&self) -> Option<u32> {
        self.latest_version.as_ref().map(|v| v.effective_date)
    }
}

/// Classification state of a code system, derived from its latest classify job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationStatus {
    Todo,
    InProgress,
    SystemError,
    EquivalentConcepts,
    Complete,
}

/// Validation state of a code system, derived from its latest validation job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Todo,
    InProgress,
    ContentError,
    ContentWarning,
    SystemError,
    Complete,
    Stale,
}

impl ValidationStatus {
    /// Outcomes that describe the content as it was when validated
    pub fn can_turn_stale(self) -> bool {
        matches!(self, Self::ContentError | Self::ContentWarning | Self::Complete)
    }
}

/// Release candidate build state stored in branch metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildStatus {
    Todo,
    InProgress,
    Failed,
    Complete,
}

impl BuildStatus {
    /// Maps a release service build status string
    pub fn from_release_service(status: Option<&str>) -> Self {
        match status {
            None => Self::Todo,
            Some(s) if s.contains("CANCELLED") || s.contains("FAILED") => Self::Failed,
            Some(s) if s.starts_with("RELEASE_COMPLETE") => Self::Complete,
            Some(_) => Self::InProgress,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Failed => "FAILED",
            Self::Complete => "COMPLETE",
        }
    }
}

//! Domain identifier types with validation
//!
//! Newtype wrappers for job and concept identifiers. Each type keeps the
//! different id spaces apart and validates format on construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Job identifier newtype wrapper
///
/// Opaque, generated on submission and immutable afterwards.
///
/// # Examples
///
/// ```
/// use simplex::domain::ids::JobId;
///
/// let a = JobId::generate();
/// let b = JobId::generate();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generates a fresh random job id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an existing id, rejecting blank strings
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Job ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the job ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// SNOMED CT concept identifier
///
/// Used for refset ids, module ids and referenced concepts. A concept id is
/// 6 to 18 decimal digits with no leading zero.
///
/// # Examples
///
/// ```
/// use simplex::domain::ids::ConceptId;
/// use std::str::FromStr;
///
/// let refset = ConceptId::from_str("734138000").unwrap();
/// assert_eq!(refset.as_str(), "734138000");
/// assert!(ConceptId::from_str("12ab").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ConceptId(String);

impl ConceptId {
    /// Creates a new ConceptId, validating the SCTID shape
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err("Concept ID cannot be empty".to_string());
        }
        if !(6..=18).contains(&trimmed.len())
            || !trimmed.bytes().all(|b| b.is_ascii_digit())
            || trimmed.starts_with('0')
        {
            return Err(format!("Invalid concept ID: {trimmed}"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the concept ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ConceptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConceptId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ConceptId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ConceptId> for String {
    fn from(id: ConceptId) -> Self {
        id.0
    }
}

impl AsRef<str> for ConceptId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

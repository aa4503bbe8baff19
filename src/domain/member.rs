//! Reference set member types
//!
//! [`RefsetMember`] mirrors the terminology store's member representation.
//! [`MemberIntent`] is one row of desired content fed into reconciliation.

use crate::domain::errors::SimplexError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Additional field holding the map source code of a correlation map member
pub const MAP_SOURCE_FIELD: &str = "mapSource";

/// Additional field holding the correlation concept id of a correlation map member
pub const CORRELATION_ID_FIELD: &str = "correlationId";

/// A stored reference set member
///
/// Released members (part of a published version) are never physically
/// deleted; only `active` may change on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefsetMember {
    pub member_id: String,
    pub refset_id: String,
    pub referenced_component_id: String,
    #[serde(default)]
    pub module_id: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub released: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_time: Option<String>,
    #[serde(default)]
    pub additional_fields: BTreeMap<String, String>,
}

fn default_active() -> bool {
    true
}

impl RefsetMember {
    /// Creates a new, active, unreleased member with a client-generated UUID
    pub fn new(
        refset_id: impl Into<String>,
        module_id: impl Into<String>,
        referenced_component_id: impl Into<String>,
    ) -> Self {
        Self {
            member_id: Uuid::new_v4().to_string(),
            refset_id: refset_id.into(),
            referenced_component_id: referenced_component_id.into(),
            module_id: module_id.into(),
            active: true,
            released: false,
            effective_time: None,
            additional_fields: BTreeMap::new(),
        }
    }

    /// Builder-style setter for one additional field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_fields.insert(key.into(), value.into());
        self
    }

    /// Looks up an additional field
    pub fn field(&self, key: &str) -> Option<&str> {
        self.additional_fields.get(key).map(String::as_str)
    }

    /// Sets an additional field, returning true if the stored value changed
    pub fn set_field(&mut self, key: &str, value: &str) -> bool {
        if self.field(key) == Some(value) {
            return false;
        }
        self.additional_fields
            .insert(key.to_string(), value.to_string());
        true
    }
}

/// One desired member
///
/// The referenced component plus whatever fields the refset type matches on
/// or maintains. For correlation maps these are [`MAP_SOURCE_FIELD`] and
/// [`CORRELATION_ID_FIELD`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberIntent {
    pub referenced_component_id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl MemberIntent {
    /// Intent for a simple refset: membership only
    pub fn simple(referenced_component_id: impl Into<String>) -> Self {
        Self {
            referenced_component_id: referenced_component_id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Intent for a map-to-concept refset with a correlation
    pub fn correlation_map(
        referenced_component_id: impl Into<String>,
        map_source: impl Into<String>,
        correlation: MapCorrelation,
    ) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(MAP_SOURCE_FIELD.to_string(), map_source.into());
        fields.insert(
            CORRELATION_ID_FIELD.to_string(),
            correlation.concept_id().to_string(),
        );
        Self {
            referenced_component_id: referenced_component_id.into(),
            fields,
        }
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// How closely a map source corresponds to its target concept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MapCorrelation {
    TargetEquivalent,
    TargetBroader,
    TargetNarrower,
    TargetInexact,
    TargetNotMappable,
    NotSpecified,
}

impl MapCorrelation {
    pub const ALL: [MapCorrelation; 6] = [
        Self::TargetEquivalent,
        Self::TargetBroader,
        Self::TargetNarrower,
        Self::TargetInexact,
        Self::TargetNotMappable,
        Self::NotSpecified,
    ];

    /// The concept id stored in the `correlationId` field
    pub fn concept_id(self) -> &'static str {
        match self {
            Self::TargetEquivalent => "1193548004",
            Self::TargetBroader => "1193549007",
            Self::TargetNarrower => "1193547009",
            Self::TargetInexact => "1193550007",
            Self::TargetNotMappable => "1193551006",
            Self::NotSpecified => "1193552004",
        }
    }

    pub fn from_concept_id(concept_id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|correlation| correlation.concept_id() == concept_id)
    }
}

impl fmt::Display for MapCorrelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TargetEquivalent => "TARGET_EQUIVALENT",
            Self::TargetBroader => "TARGET_BROADER",
            Self::TargetNarrower => "TARGET_NARROWER",
            Self::TargetInexact => "TARGET_INEXACT",
            Self::TargetNotMappable => "TARGET_NOT_MAPPABLE",
            Self::NotSpecified => "NOT_SPECIFIED",
        };
        f.write_str(name)
    }
}

/// Accepts either the enum name or the correlation concept id
impl FromStr for MapCorrelation {
    type Err = SimplexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(correlation) = Self::from_concept_id(trimmed) {
            return Ok(correlation);
        }
        let normalized = trimmed.to_ascii_uppercase().replace([' ', '-'], "_");
        Self::ALL
            .into_iter()
            .find(|correlation| correlation.to_string() == normalized)
            .ok_or_else(|| SimplexError::user_content(format!("Unrecognised map correlation '{s}'")))
    }
}

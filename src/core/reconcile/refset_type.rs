//! Refset type specific matching and field handling
//!
//! The reconciliation algorithm is shared; what differs between refset types
//! is which stored member counts as "the same" as a desired one, and which
//! fields may be updated in place.

use crate::domain::member::{CORRELATION_ID_FIELD, MAP_SOURCE_FIELD};
use crate::domain::{MemberIntent, RefsetMember, SimplexError};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub trait RefsetType: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether `member` carries the identity of `intent`
    ///
    /// Only called for members of the same referenced component.
    fn matches(&self, member: &RefsetMember, intent: &MemberIntent) -> bool;

    /// Copies the intent's mutable fields onto `member`
    ///
    /// Returns `true` when any field changed.
    fn apply(&self, member: &mut RefsetMember, intent: &MemberIntent) -> bool;

    /// A new member for an intent nothing stored matched
    fn create(&self, refset_id: &str, module_id: &str, intent: &MemberIntent) -> RefsetMember {
        let mut member = RefsetMember::new(refset_id, module_id, &intent.referenced_component_id);
        self.apply(&mut member, intent);
        member
    }
}

/// Membership only; the referenced component is the whole identity
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleRefset;

impl RefsetType for SimpleRefset {
    fn name(&self) -> &'static str {
        "simple"
    }

    fn matches(&self, _member: &RefsetMember, _intent: &MemberIntent) -> bool {
        true
    }

    fn apply(&self, _member: &mut RefsetMember, _intent: &MemberIntent) -> bool {
        false
    }
}

/// Map from an external code to a concept, with a correlation
///
/// Identity is the referenced component plus the map source code.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationMapRefset;

impl RefsetType for CorrelationMapRefset {
    fn name(&self) -> &'static str {
        "correlation-map"
    }

    fn matches(&self, member: &RefsetMember, intent: &MemberIntent) -> bool {
        member.field(MAP_SOURCE_FIELD) == intent.field(MAP_SOURCE_FIELD)
    }

    fn apply(&self, member: &mut RefsetMember, intent: &MemberIntent) -> bool {
        let mut changed = false;
        for key in [MAP_SOURCE_FIELD, CORRELATION_ID_FIELD] {
            if let Some(value) = intent.field(key) {
                changed |= member.set_field(key, value);
            }
        }
        changed
    }
}

/// Refset types selectable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefsetKind {
    #[default]
    Simple,
    CorrelationMap,
}

impl RefsetKind {
    pub fn refset_type(self) -> Arc<dyn RefsetType> {
        match self {
            Self::Simple => Arc::new(SimpleRefset),
            Self::CorrelationMap => Arc::new(CorrelationMapRefset),
        }
    }
}

impl fmt::Display for RefsetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.refset_type().name())
    }
}

impl FromStr for RefsetKind {
    type Err = SimplexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "simple" => Ok(Self::Simple),
            "correlation-map" | "map" => Ok(Self::CorrelationMap),
            _ => Err(SimplexError::Validation(format!("Unknown refset type: {s}"))),
        }
    }
}

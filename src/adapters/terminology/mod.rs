//! Terminology server adapter
//!
//! Refset member reads and writes, code system metadata, classification and
//! upgrade jobs over the server's REST API.

pub mod client;
pub mod models;
pub mod store;

pub use client::TerminologyClient;
pub use models::{Classification, ClassificationState, UpgradeJob, UpgradeState};
pub use store::{AuthoringStore, RefsetStore};

use crate::domain::{RefsetMember, Result, TerminologyError};
use std::collections::HashSet;

/// Maximum member ids sent in one delete request
pub const DELETE_BATCH_SIZE: usize = 1000;

/// Rejects a create/update request in which two members share an id
pub fn ensure_unique_member_ids(members: &[RefsetMember]) -> Result<()> {
    let mut seen = HashSet::with_capacity(members.len());
    for member in members {
        if !seen.insert(member.member_id.as_str()) {
            return Err(TerminologyError::DuplicateMemberId(member.member_id.clone()).into());
        }
    }
    Ok(())
}

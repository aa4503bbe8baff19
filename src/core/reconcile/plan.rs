//! Computing the changes that bring stored membership to the desired state

use super::refset_type::RefsetType;
use crate::domain::{ChangeSummary, MemberIntent, RefsetMember};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Writes needed to converge a refset
///
/// `creates`, `updates` and `inactivations` go to the store in one bulk
/// create-or-update call; `deletions` are member ids removed afterwards.
#[derive(Debug, Default)]
pub struct ReconciliationPlan {
    pub creates: Vec<RefsetMember>,
    pub updates: Vec<RefsetMember>,
    pub inactivations: Vec<RefsetMember>,
    pub deletions: Vec<String>,
    /// Stored members already in the desired state
    pub kept: usize,
}

impl ReconciliationPlan {
    /// Matches desired intents against stored members
    ///
    /// For each component, stored candidates are tried unreleased before
    /// released and inactive before active. A stored member may satisfy only
    /// one intent. Unclaimed released members are inactivated, unclaimed
    /// unreleased members are deleted.
    pub fn build(
        refset_type: &dyn RefsetType,
        refset_id: &str,
        module_id: &str,
        stored: Vec<RefsetMember>,
        desired: &[MemberIntent],
    ) -> Self {
        let mut by_component: HashMap<&str, Vec<usize>> = HashMap::new();
        for (index, member) in stored.iter().enumerate() {
            by_component
                .entry(member.referenced_component_id.as_str())
                .or_default()
                .push(index);
        }
        for candidates in by_component.values_mut() {
            candidates.sort_by_key(|&i| (stored[i].released, stored[i].active));
        }

        let mut plan = Self::default();
        let mut claimed = vec![false; stored.len()];
        let mut seen: HashSet<(&str, &BTreeMap<String, String>)> = HashSet::new();

        for intent in desired {
            if !seen.insert((intent.referenced_component_id.as_str(), &intent.fields)) {
                continue;
            }

            let matched = by_component
                .get(intent.referenced_component_id.as_str())
                .and_then(|candidates| {
                    candidates
                        .iter()
                        .copied()
                        .find(|&i| !claimed[i] && refset_type.matches(&stored[i], intent))
                });

            match matched {
                Some(index) => {
                    claimed[index] = true;
                    let mut member = stored[index].clone();
                    let mut changed = refset_type.apply(&mut member, intent);
                    if !member.active {
                        member.active = true;
                        changed = true;
                    }
                    if changed {
                        plan.updates.push(member);
                    } else {
                        plan.kept += 1;
                    }
                }
                None => plan
                    .creates
                    .push(refset_type.create(refset_id, module_id, intent)),
            }
        }

        for (mut member, claimed) in stored.into_iter().zip(claimed) {
            if claimed {
                continue;
            }
            if !member.released {
                plan.deletions.push(member.member_id);
            } else if member.active {
                member.active = false;
                plan.inactivations.push(member);
            }
        }

        plan
    }

    /// Members for the bulk create-or-update call
    pub fn upserts(&self) -> Vec<RefsetMember> {
        self.creates
            .iter()
            .chain(&self.updates)
            .chain(&self.inactivations)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.creates.is_empty()
            && self.updates.is_empty()
            && self.inactivations.is_empty()
            && self.deletions.is_empty()
    }

    pub fn summary(&self, new_total: usize) -> ChangeSummary {
        ChangeSummary::new(
            self.creates.len(),
            self.updates.len(),
            self.inactivations.len() + self.deletions.len(),
            new_total,
        )
    }
}

//! Decision making
//!
//! Compares the merged tag plan of a service with the image snapshot and
//! decides whether a new build is needed, which tags are missing, or whether
//! the service is already satisfied.

use crate::merger::ServiceTagPlan;
use crate::model::{Decision, ImageSnapshot};
use std::collections::BTreeSet;

/// Decide what a service needs.
///
/// Returns `None` when every planned tag already exists and none is
/// enforced; such a service needs no registry call at all.
pub fn decide(plan: &ServiceTagPlan, snapshot: &ImageSnapshot) -> Option<Decision> {
    if plan.tags.is_empty() {
        return None;
    }

    // enforce は常に優先。未知のサービスにはタグを付ける先がない
    if plan.any_enforced() || !snapshot.contains(&plan.service) {
        return Some(Decision::build_new(&plan.service, plan.tag_names()));
    }

    // any identity counts, identities are not reconciled with each other
    let existing = snapshot.tags_of(&plan.service);
    let missing: BTreeSet<String> = plan
        .tags
        .keys()
        .filter(|tag| !existing.contains(*tag))
        .cloned()
        .collect();

    if missing.is_empty() {
        None
    } else {
        Some(Decision::attach(&plan.service, missing))
    }
}

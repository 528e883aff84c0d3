//! Request merging
//!
//! Folds the requests of one round into a tag plan per service. Enforcement
//! is a one-way ratchet: once any request enforces a tag, a later
//! non-enforcing duplicate cannot undo it.

use crate::model::BuildRequest;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// `tag → enforce` for a single service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceTagPlan {
    pub service: String,
    pub tags: BTreeMap<String, bool>,
}

impl ServiceTagPlan {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            tags: BTreeMap::new(),
        }
    }

    /// Add a tag; `enforce` is OR-ed into an existing entry.
    pub fn add(&mut self, tag: impl Into<String>, enforce: bool) {
        let entry = self.tags.entry(tag.into()).or_insert(false);
        *entry |= enforce;
    }

    pub fn with_tag(mut self, tag: impl Into<String>, enforce: bool) -> Self {
        self.add(tag, enforce);
        self
    }

    pub fn any_enforced(&self) -> bool {
        self.tags.values().any(|enforce| *enforce)
    }

    pub fn requests(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    pub fn tag_names(&self) -> BTreeSet<String> {
        self.tags.keys().cloned().collect()
    }
}

/// Plans keyed by normalized service name
pub type TagPlans = BTreeMap<String, ServiceTagPlan>;

/// Trim and lower-case a service name; blank names yield `None`.
pub fn normalize_service_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

pub fn merge_requests<'a, I>(requests: I) -> TagPlans
where
    I: IntoIterator<Item = &'a BuildRequest>,
{
    let mut plans = TagPlans::new();

    for request in requests {
        let Some(service) = normalize_service_name(&request.service) else {
            warn!(tag = %request.tag, "Ignoring request with a blank service name");
            continue;
        };

        let tag = request.tag.trim();
        if tag.is_empty() {
            warn!(service = %service, "Ignoring request with a blank tag");
            continue;
        }

        plans
            .entry(service.clone())
            .or_insert_with(|| ServiceTagPlan::new(service))
            .add(tag, request.enforce);
    }

    plans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(service: &str, tag: &str, enforce: bool) -> BuildRequest {
        BuildRequest::new(service, tag, enforce)
    }

    #[test]
    fn test_merge_groups_by_normalized_service() {
        let requests = vec![
            req("Svc1", "v1", false),
            req("  svc1 ", "v2", false),
            req("svc2", "v1", false),
        ];

        let plans = merge_requests(&requests);

        assert_eq!(plans.len(), 2);
        assert_eq!(plans["svc1"].tag_names().len(), 2);
        assert!(plans["svc2"].requests("v1"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let once = merge_requests(&[req("svc", "v1", true)]);
        let twice = merge_requests(&[req("svc", "v1", true), req("svc", "v1", true)]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_enforce_is_logical_or() {
        for (a, b) in [(false, false), (false, true), (true, false), (true, true)] {
            let plans = merge_requests(&[req("svc", "v1", a), req("svc", "v1", b)]);
            assert_eq!(plans["svc"].tags["v1"], a || b, "{} || {}", a, b);
        }
    }

    #[test]
    fn test_blank_service_and_tag_are_dropped() {
        let plans = merge_requests(&[req("   ", "v1", false), req("svc", "  ", true)]);
        assert!(plans.is_empty());
    }

    #[test]
    fn test_tags_are_trimmed() {
        let plans = merge_requests(&[req("svc", " v1 ", false), req("svc", "v1", true)]);
        assert_eq!(plans["svc"].tags.len(), 1);
        assert!(plans["svc"].tags["v1"]);
    }
}

//! Round report

use crate::model::{BuiltImage, CleanupOperation, Decision, TagOperation};
use serde::Serialize;

/// Kind of a per-service failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The build tool does not know the service
    Resolution,
    /// No build strategy produced an image
    Build,
    /// A tag or build call against the registry failed
    Registry,
    /// A reported build is missing from the refreshed snapshot
    Consistency,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Resolution => write!(f, "resolution"),
            FailureKind::Build => write!(f, "build"),
            FailureKind::Registry => write!(f, "registry"),
            FailureKind::Consistency => write!(f, "consistency"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceFailure {
    pub service: String,
    pub kind: FailureKind,
    pub message: String,
}

impl ServiceFailure {
    pub fn new(service: impl Into<String>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            kind,
            message: message.into(),
        }
    }
}

/// Everything one round did
#[derive(Debug, Clone, Default, Serialize)]
pub struct RoundReport {
    pub decisions: Vec<Decision>,
    /// Services whose requested tags all existed already
    pub satisfied: Vec<String>,
    pub builds: Vec<BuiltImage>,
    pub tag_operations: Vec<TagOperation>,
    pub cleanup_operations: Vec<CleanupOperation>,
    pub failures: Vec<ServiceFailure>,
    /// Non-fatal problems, e.g. a transient tag that could not be deleted
    pub warnings: Vec<String>,
    pub duration_ms: u64,
}

impl RoundReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if any service needed work this round
    pub fn work_attempted(&self) -> bool {
        !self.decisions.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn add_failure(&mut self, failure: ServiceFailure) {
        self.failures.push(failure);
    }

    pub fn failed(&self, service: &str) -> bool {
        self.failures.iter().any(|f| f.service == service)
    }

    pub fn summary(&self) -> RoundSummary {
        RoundSummary {
            built: self.builds.len(),
            tagged: self.tag_operations.len(),
            cleaned: self.cleanup_operations.len(),
            satisfied: self.satisfied.len(),
            failed: self.failures.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundSummary {
    pub built: usize,
    pub tagged: usize,
    pub cleaned: usize,
    pub satisfied: usize,
    pub failed: usize,
}

impl std::fmt::Display for RoundSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} built, {} tagged, {} cleaned, {} up to date, {} failed",
            self.built, self.tagged, self.cleaned, self.satisfied, self.failed
        )
    }
}

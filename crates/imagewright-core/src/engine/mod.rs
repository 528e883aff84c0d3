//! Reconciliation engine
//!
//! One round runs: merge → validate → snapshot → decide → build → refresh
//! snapshot → retag → cleanup. Rounds never overlap; builds inside a round may.

mod build;
mod cleanup;
mod retag;
mod snapshot;

pub use snapshot::SnapshotProvider;

use crate::adapter::{BuildAdapter, DescriptorRenderer, ImageMaterializer};
use crate::error::{Error, Result};
use crate::merger::{ServiceTagPlan, TagPlans, merge_requests};
use crate::model::{BuildRequest, Decision, ImageSnapshot};
use crate::observer::{RoundObserver, TracingObserver};
use crate::planner::decide;
use crate::report::{FailureKind, RoundReport, ServiceFailure};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

static TRACING_OBSERVER: TracingObserver = TracingObserver;

/// Tunables of the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Upper bound of concurrent builds within one round
    pub max_parallel_builds: usize,
    /// Tag given to images built from a rendered descriptor
    pub manual_source_tag: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_parallel_builds: 1,
            manual_source_tag: "latest".to_string(),
        }
    }
}

/// Result of a dry run
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlannedRound {
    pub plans: Vec<ServiceTagPlan>,
    pub invalid: Vec<String>,
    pub decisions: Vec<Decision>,
    pub satisfied: Vec<String>,
}

/// Drives the build adapter and the image materializer for each round.
///
/// Collaborators are owned by the caller and only borrowed here.
pub struct Reconciler<'a> {
    adapter: &'a dyn BuildAdapter,
    materializer: &'a dyn ImageMaterializer,
    renderer: &'a dyn DescriptorRenderer,
    observer: &'a dyn RoundObserver,
    snapshots: SnapshotProvider<'a>,
    options: EngineOptions,
    round_lock: Mutex<()>,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        adapter: &'a dyn BuildAdapter,
        materializer: &'a dyn ImageMaterializer,
        renderer: &'a dyn DescriptorRenderer,
    ) -> Self {
        Self {
            adapter,
            materializer,
            renderer,
            observer: &TRACING_OBSERVER,
            snapshots: SnapshotProvider::new(materializer),
            options: EngineOptions::default(),
            round_lock: Mutex::new(()),
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn RoundObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn snapshots(&self) -> &SnapshotProvider<'a> {
        &self.snapshots
    }

    /// Run one full round for `requests`.
    ///
    /// Per-service failures are collected in the report. Only a failure to
    /// list the registry before deciding aborts the round.
    pub async fn reconcile(&self, requests: &[BuildRequest]) -> Result<RoundReport> {
        let _round = self.round_lock.lock().await;
        let started = Instant::now();
        let mut report = RoundReport::new();

        let (plans, invalid) = self.resolve_plans(requests);
        for service in invalid {
            let message = Error::InvalidService(service.clone()).to_string();
            report.add_failure(ServiceFailure::new(service, FailureKind::Resolution, message));
        }

        if !plans.is_empty() {
            let snapshot = self.snapshots.take().await?;
            self.run_round(&plans, snapshot, &mut report).await;
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        self.observer.round_finished(&report);
        Ok(report)
    }

    /// Merge, validate and decide without touching the registry.
    pub async fn plan(&self, requests: &[BuildRequest]) -> Result<PlannedRound> {
        let _round = self.round_lock.lock().await;

        let (plans, invalid) = self.resolve_plans(requests);
        let snapshot = if plans.is_empty() {
            Arc::new(ImageSnapshot::empty())
        } else {
            self.snapshots.take().await?
        };

        let mut planned = PlannedRound {
            invalid,
            ..Default::default()
        };
        for plan in plans.into_values() {
            match decide(&plan, &snapshot) {
                Some(decision) => planned.decisions.push(decision),
                None => planned.satisfied.push(plan.service.clone()),
            }
            planned.plans.push(plan);
        }

        Ok(planned)
    }

    /// Merge requests and drop services unknown to the build tool.
    fn resolve_plans(&self, requests: &[BuildRequest]) -> (TagPlans, Vec<String>) {
        let mut plans = merge_requests(requests);

        let invalid: Vec<String> = plans
            .keys()
            .filter(|service| !self.adapter.is_valid_service(service))
            .cloned()
            .collect();

        for service in &invalid {
            plans.remove(service);
            self.observer.invalid_service(service);
        }

        (plans, invalid)
    }

    async fn run_round(
        &self,
        plans: &TagPlans,
        snapshot: Arc<ImageSnapshot>,
        report: &mut RoundReport,
    ) {
        for plan in plans.values() {
            match decide(plan, &snapshot) {
                Some(decision) => {
                    self.observer.decision_made(&decision);
                    report.decisions.push(decision);
                }
                None => {
                    self.observer.service_satisfied(&plan.service);
                    report.satisfied.push(plan.service.clone());
                }
            }
        }

        if report.decisions.is_empty() {
            return;
        }

        let decisions = report.decisions.clone();
        let (to_build, to_attach): (Vec<&Decision>, Vec<&Decision>) =
            decisions.iter().partition(|d| d.must_build_new);

        let built = self.build_services(&to_build, report).await;

        // 新しい identity が増えたので古い snapshot は使えない
        let refreshed = if built.is_empty() {
            Some(Arc::clone(&snapshot))
        } else {
            match self.snapshots.take().await {
                Ok(fresh) => Some(fresh),
                Err(e) => {
                    for image in &built {
                        report.add_failure(ServiceFailure::new(
                            &image.service,
                            FailureKind::Registry,
                            format!("snapshot refresh failed: {}", e),
                        ));
                    }
                    None
                }
            }
        };

        let mut retagged = Vec::new();
        if let Some(current) = &refreshed {
            for image in &built {
                let Some(decision) = to_build.iter().find(|d| d.service == image.service) else {
                    continue;
                };
                if self
                    .retag_built(image, &decision.tags_to_create, current, report)
                    .await
                {
                    retagged.push(image);
                }
            }
        }

        let current = refreshed.as_ref().unwrap_or(&snapshot);
        for decision in to_attach {
            self.retag_existing(decision, current, report).await;
        }

        self.cleanup(&retagged, plans, report).await;
    }
}

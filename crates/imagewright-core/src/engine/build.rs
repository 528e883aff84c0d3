//! Build executor

use super::Reconciler;
use crate::model::{Attempt, BuiltImage, Decision};
use crate::report::{FailureKind, RoundReport, ServiceFailure};
use futures_util::stream::{self, StreamExt};
use tracing::{debug, warn};

type BuildResult = std::result::Result<BuiltImage, ServiceFailure>;

impl Reconciler<'_> {
    /// Build every service that needs a new image.
    ///
    /// Services are independent, so up to `max_parallel_builds` run at once.
    /// A service that cannot be built is recorded and dropped for this round.
    pub(super) async fn build_services(
        &self,
        decisions: &[&Decision],
        report: &mut RoundReport,
    ) -> Vec<BuiltImage> {
        let parallelism = self.options.max_parallel_builds.max(1);

        let mut outcomes: Vec<(String, BuildResult)> = stream::iter(decisions.iter())
            .map(|decision| async move {
                let service = decision.service.clone();
                let outcome = self.build_service(&service).await;
                (service, outcome)
            })
            .buffer_unordered(parallelism)
            .collect()
            .await;

        outcomes.sort_by(|a, b| a.0.cmp(&b.0));

        let mut built = Vec::new();
        for (_, outcome) in outcomes {
            match outcome {
                Ok(image) => {
                    report.builds.push(image.clone());
                    built.push(image);
                }
                Err(failure) => report.add_failure(failure),
            }
        }
        built
    }

    async fn build_service(&self, service: &str) -> BuildResult {
        self.observer.build_started(service);

        let outcome = self.try_build(service).await;
        match &outcome {
            Ok(image) => self.observer.build_succeeded(image),
            Err(failure) => self.observer.build_failed(service, &failure.message),
        }
        outcome
    }

    /// Buildpack path first, descriptor based path as fallback.
    async fn try_build(&self, service: &str) -> BuildResult {
        let mut reasons = Vec::new();

        match self.adapter.create_image_from_buildpack(service).await {
            Attempt::Success(image) => return Ok(BuiltImage::from_buildpack(service, image)),
            Attempt::NotApplicable => {
                debug!(service = %service, "Buildpack image not supported, packaging artifact");
            }
            Attempt::Failed(reason) => {
                warn!(service = %service, reason = %reason, "Buildpack image failed, packaging artifact");
                reasons.push(format!("buildpack: {}", reason));
            }
        }

        let artifact = match self.adapter.create_packaged_artifact(service).await {
            Attempt::Success(artifact) => artifact,
            Attempt::NotApplicable => {
                if reasons.is_empty() {
                    reasons.push(format!(
                        "{} can neither build an image nor package an artifact",
                        self.adapter.tool_name()
                    ));
                }
                return Err(ServiceFailure::new(service, FailureKind::Build, reasons.join("; ")));
            }
            Attempt::Failed(reason) => {
                reasons.push(format!("package: {}", reason));
                return Err(ServiceFailure::new(service, FailureKind::Build, reasons.join("; ")));
            }
        };

        let descriptor = self
            .renderer
            .render(service, &artifact)
            .map_err(|e| ServiceFailure::new(service, FailureKind::Build, e.to_string()))?;

        let tag = &self.options.manual_source_tag;
        let image_id = self
            .materializer
            .build_image_from_descriptor(service, &descriptor, tag)
            .await
            .map_err(|e| ServiceFailure::new(service, FailureKind::Registry, e.to_string()))?;

        debug!(
            service = %service,
            image_id = %image_id,
            artifact = %artifact.path().display(),
            "Image built from descriptor"
        );
        Ok(BuiltImage::from_descriptor(service, tag.as_str()))
    }
}

//! Cleanup executor

use super::Reconciler;
use crate::merger::{ServiceTagPlan, TagPlans};
use crate::model::{BuiltImage, CleanupOperation};
use crate::report::RoundReport;
use tracing::debug;

/// The source tag of a fresh build is removed unless it was requested.
pub(crate) fn cleanup_operation(
    image: &BuiltImage,
    plan: &ServiceTagPlan,
) -> Option<CleanupOperation> {
    let requested = image.repository == image.service && plan.requests(&image.source_tag);
    if requested {
        None
    } else {
        Some(CleanupOperation::new(&image.repository, &image.source_tag))
    }
}

impl Reconciler<'_> {
    /// Delete transient build tags. Failures only produce warnings.
    pub(super) async fn cleanup(
        &self,
        images: &[&BuiltImage],
        plans: &TagPlans,
        report: &mut RoundReport,
    ) {
        for image in images {
            let Some(plan) = plans.get(&image.service) else {
                continue;
            };
            let Some(operation) = cleanup_operation(image, plan) else {
                debug!(service = %image.service, tag = %image.source_tag, "Source tag was requested, keeping it");
                continue;
            };

            match self
                .materializer
                .delete_image_tag(&operation.repository, &operation.tag)
                .await
            {
                Ok(()) => {
                    self.observer.cleanup_performed(&operation);
                    report.cleanup_operations.push(operation);
                }
                Err(e) => {
                    self.observer.cleanup_failed(&operation, &e);
                    report
                        .warnings
                        .push(format!("could not remove {}: {}", operation, e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BuildpackImage;

    fn buildpack(service: &str, repository: &str, tag: &str) -> BuiltImage {
        BuiltImage::from_buildpack(
            service,
            BuildpackImage {
                repository: repository.into(),
                tag: tag.into(),
            },
        )
    }

    #[test]
    fn test_unrequested_source_tag_is_cleaned() {
        let plan = ServiceTagPlan::new("svc1")
            .with_tag("a", false)
            .with_tag("b", false);
        let image = buildpack("svc1", "svc1", "s");

        assert_eq!(
            cleanup_operation(&image, &plan),
            Some(CleanupOperation::new("svc1", "s"))
        );
    }

    #[test]
    fn test_requested_source_tag_is_kept() {
        let plan = ServiceTagPlan::new("svc1")
            .with_tag("a", false)
            .with_tag("s", false);
        let image = buildpack("svc1", "svc1", "s");

        assert_eq!(cleanup_operation(&image, &plan), None);
    }

    #[test]
    fn test_source_in_other_repository_is_cleaned() {
        // 要求されたのは svc1:s であって acme/app:s ではない
        let plan = ServiceTagPlan::new("svc1").with_tag("s", false);
        let image = buildpack("svc1", "acme/app", "s");

        assert_eq!(
            cleanup_operation(&image, &plan),
            Some(CleanupOperation::new("acme/app", "s"))
        );
    }
}

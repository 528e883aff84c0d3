//! Retag executor

use super::Reconciler;
use crate::error::{Error, Result};
use crate::model::{BuiltImage, Decision, ImageSnapshot, TagOperation};
use crate::report::{FailureKind, RoundReport, ServiceFailure};
use std::collections::BTreeSet;

/// Tag operations that give a fresh build its requested tags.
///
/// The identity is looked up in the refreshed snapshot by the build's source
/// tag. A target equal to the source is already satisfied and skipped.
pub(crate) fn operations_for_build(
    image: &BuiltImage,
    tags: &BTreeSet<String>,
    snapshot: &ImageSnapshot,
) -> Result<Vec<TagOperation>> {
    let image_id = snapshot
        .identity_with_tag(&image.repository, &image.source_tag)
        .ok_or_else(|| Error::Consistency {
            repository: image.repository.clone(),
            tag: image.source_tag.clone(),
        })?;

    Ok(tags
        .iter()
        .filter(|tag| !(image.repository == image.service && **tag == image.source_tag))
        .map(|tag| {
            TagOperation::new(
                image_id,
                &image.repository,
                &image.source_tag,
                &image.service,
                tag,
            )
        })
        .collect())
}

/// Tag operations that attach missing tags to an existing image.
///
/// The first tagged identity of the service is the source (ascending image
/// id, then ascending tag).
pub(crate) fn operations_for_existing(
    decision: &Decision,
    snapshot: &ImageSnapshot,
) -> Option<Vec<TagOperation>> {
    let (image_id, source_tag) = snapshot.first_tagged(&decision.service)?;

    Some(
        decision
            .tags_to_create
            .iter()
            .map(|tag| {
                TagOperation::new(
                    image_id,
                    &decision.service,
                    source_tag,
                    &decision.service,
                    tag,
                )
            })
            .collect(),
    )
}

impl Reconciler<'_> {
    /// Returns true when every tag of the fresh build was created.
    pub(super) async fn retag_built(
        &self,
        image: &BuiltImage,
        tags: &BTreeSet<String>,
        snapshot: &ImageSnapshot,
        report: &mut RoundReport,
    ) -> bool {
        match operations_for_build(image, tags, snapshot) {
            Ok(operations) => self.apply_tags(&image.service, &operations, report).await,
            Err(e) => {
                self.observer.retag_abandoned(&image.service, &e);
                report.add_failure(ServiceFailure::new(
                    &image.service,
                    FailureKind::Consistency,
                    e.to_string(),
                ));
                false
            }
        }
    }

    pub(super) async fn retag_existing(
        &self,
        decision: &Decision,
        snapshot: &ImageSnapshot,
        report: &mut RoundReport,
    ) {
        match operations_for_existing(decision, snapshot) {
            Some(operations) => {
                self.apply_tags(&decision.service, &operations, report).await;
            }
            None => {
                let e = Error::Consistency {
                    repository: decision.service.clone(),
                    tag: "<any>".to_string(),
                };
                self.observer.retag_abandoned(&decision.service, &e);
                report.add_failure(ServiceFailure::new(
                    &decision.service,
                    FailureKind::Consistency,
                    e.to_string(),
                ));
            }
        }
    }

    /// Apply in order; the first failure abandons the rest for this service.
    async fn apply_tags(
        &self,
        service: &str,
        operations: &[TagOperation],
        report: &mut RoundReport,
    ) -> bool {
        for operation in operations {
            let result = self
                .materializer
                .add_tag(
                    &operation.image_id,
                    &operation.source_ref(),
                    &operation.target_ref(),
                )
                .await;

            match result {
                Ok(()) => {
                    self.observer.tag_applied(operation);
                    report.tag_operations.push(operation.clone());
                }
                Err(e) => {
                    self.observer.tag_failed(operation, &e);
                    report.add_failure(ServiceFailure::new(
                        service,
                        FailureKind::Registry,
                        e.to_string(),
                    ));
                    return false;
                }
            }
        }
        true
    }
}

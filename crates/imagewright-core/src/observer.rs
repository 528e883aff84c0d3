//! Observability boundary
//!
//! The engine reports what it does through [`RoundObserver`] instead of
//! logging inline. Every method has an empty default so observers only
//! implement the events they care about.

use crate::error::Error;
use crate::model::{BuiltImage, CleanupOperation, Decision, TagOperation};
use crate::report::RoundReport;
use tracing::{debug, error, info, warn};

pub trait RoundObserver: Send + Sync {
    fn invalid_service(&self, _service: &str) {}

    fn decision_made(&self, _decision: &Decision) {}

    /// Every requested tag already exists, nothing to do
    fn service_satisfied(&self, _service: &str) {}

    fn build_started(&self, _service: &str) {}

    fn build_succeeded(&self, _image: &BuiltImage) {}

    fn build_failed(&self, _service: &str, _reason: &str) {}

    fn tag_applied(&self, _operation: &TagOperation) {}

    fn tag_failed(&self, _operation: &TagOperation, _error: &Error) {}

    /// No tag operation could be derived for the service
    fn retag_abandoned(&self, _service: &str, _error: &Error) {}

    fn cleanup_performed(&self, _operation: &CleanupOperation) {}

    fn cleanup_failed(&self, _operation: &CleanupOperation, _error: &Error) {}

    fn round_finished(&self, _report: &RoundReport) {}
}

/// Logs every event through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl RoundObserver for TracingObserver {
    fn invalid_service(&self, service: &str) {
        error!(service = %service, "Invalid service name");
    }

    fn decision_made(&self, decision: &Decision) {
        info!(
            service = %decision.service,
            must_build_new = decision.must_build_new,
            tags = ?decision.tags_to_create,
            "Decision made"
        );
    }

    fn service_satisfied(&self, service: &str) {
        info!(service = %service, "No need to create new image");
    }

    fn build_started(&self, service: &str) {
        info!(service = %service, "Building image");
    }

    fn build_succeeded(&self, image: &BuiltImage) {
        info!(
            service = %image.service,
            strategy = %image.strategy,
            source = %image.source_ref(),
            "Image built"
        );
    }

    fn build_failed(&self, service: &str, reason: &str) {
        error!(service = %service, reason = %reason, "Image could not be created");
    }

    fn tag_applied(&self, operation: &TagOperation) {
        info!(
            image_id = %operation.image_id,
            source = %operation.source_ref(),
            target = %operation.target_ref(),
            "Tag created"
        );
    }

    fn tag_failed(&self, operation: &TagOperation, error: &Error) {
        error!(
            source = %operation.source_ref(),
            target = %operation.target_ref(),
            error = %error,
            "Tag creation failed"
        );
    }

    fn retag_abandoned(&self, service: &str, error: &Error) {
        error!(service = %service, error = %error, "Retagging abandoned");
    }

    fn cleanup_performed(&self, operation: &CleanupOperation) {
        debug!(image = %operation, "Transient tag removed");
    }

    fn cleanup_failed(&self, operation: &CleanupOperation, error: &Error) {
        warn!(image = %operation, error = %error, "Transient tag could not be removed");
    }

    fn round_finished(&self, report: &RoundReport) {
        info!(
            duration_ms = report.duration_ms,
            summary = %report.summary(),
            "Round finished"
        );
    }
}

//! imagewright core
//!
//! This crate decides which service images have to be built, which tags can be
//! attached to images that already exist, and which transient build tags have
//! to be removed afterwards.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 imagewright CLI                  │
//! │           (imagewright reconcile / plan)         │
//! └─────────────────┬────────────────────────────────┘
//!                   │ [BuildRequest]
//! ┌─────────────────▼────────────────────────────────┐
//! │                imagewright-core                  │
//! │  merger ─▶ planner ─▶ build ─▶ retag ─▶ cleanup  │
//! │             ▲                   ▲                │
//! │             └── SnapshotProvider┘                │
//! └───────┬──────────────────────────┬───────────────┘
//!         │ BuildAdapter             │ ImageMaterializer
//! ┌───────▼───────┐          ┌───────▼───────┐
//! │ gradle/maven  │          │ docker engine │
//! └───────────────┘          └───────────────┘
//! ```

pub mod adapter;
pub mod engine;
pub mod error;
pub mod merger;
pub mod model;
pub mod observer;
pub mod planner;
pub mod report;

// Re-exports
pub use adapter::{BuildAdapter, Descriptor, DescriptorRenderer, ImageMaterializer};
pub use engine::{EngineOptions, PlannedRound, Reconciler, SnapshotProvider};
pub use error::{Error, Result};
pub use merger::{ServiceTagPlan, TagPlans, merge_requests, normalize_service_name};
pub use model::{
    Attempt, BuildRequest, BuildStrategy, BuildpackImage, BuiltImage, CleanupOperation, Decision,
    ImageRecord, ImageSnapshot, PackagedArtifact, TagOperation, TagSet, normalize_repository,
    split_repo_tag,
};
pub use observer::{RoundObserver, TracingObserver};
pub use planner::decide;
pub use report::{FailureKind, RoundReport, RoundSummary, ServiceFailure};

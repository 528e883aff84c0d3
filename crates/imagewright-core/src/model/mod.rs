//! Data model shared by the planner and the engine

mod build;
mod decision;
mod operation;
mod request;
mod snapshot;

pub use build::{Attempt, BuildStrategy, BuildpackImage, BuiltImage, PackagedArtifact};
pub use decision::Decision;
pub use operation::{CleanupOperation, TagOperation};
pub use request::BuildRequest;
pub use snapshot::{ImageRecord, ImageSnapshot, TagSet, normalize_repository, split_repo_tag};

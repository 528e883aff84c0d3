//! Collaborator traits
//!
//! The engine never talks to a build tool or to Docker directly. The
//! composition root constructs one implementation of each trait and lends it
//! to the [`crate::Reconciler`].

use crate::error::Result;
use crate::model::{Attempt, BuildpackImage, ImageRecord, PackagedArtifact};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Build tool bound to one project directory (Gradle, Maven, ...)
#[async_trait]
pub trait BuildAdapter: Send + Sync {
    /// Returns the build tool name (e.g., "gradle", "maven")
    fn tool_name(&self) -> &str;

    /// Whether `service` is a project known to the build tool
    fn is_valid_service(&self, service: &str) -> bool;

    /// All projects known to the build tool
    fn services(&self) -> Vec<String>;

    /// Let the build tool produce a runnable image directly.
    async fn create_image_from_buildpack(&self, service: &str) -> Attempt<BuildpackImage>;

    /// Let the build tool package an artifact for a descriptor based build.
    async fn create_packaged_artifact(&self, service: &str) -> Attempt<PackagedArtifact>;
}

/// Local image registry / runtime endpoint
#[async_trait]
pub trait ImageMaterializer: Send + Sync {
    async fn list_images(&self) -> Result<Vec<ImageRecord>>;

    /// Point `new_repo_tag` at the identity `image_id`, currently reachable as
    /// `existing_repo_tag`.
    async fn add_tag(&self, image_id: &str, existing_repo_tag: &str, new_repo_tag: &str)
    -> Result<()>;

    /// Build `service:tag` from a descriptor and return the new image id.
    async fn build_image_from_descriptor(
        &self,
        service: &str,
        descriptor: &Descriptor,
        tag: &str,
    ) -> Result<String>;

    async fn delete_image_tag(&self, repository: &str, tag: &str) -> Result<()>;
}

/// Renders the file based image descriptor for a packaged artifact
pub trait DescriptorRenderer: Send + Sync {
    fn render(&self, service: &str, artifact: &PackagedArtifact) -> Result<Descriptor>;
}

/// A rendered descriptor file. The file is removed when this value is dropped.
#[derive(Debug)]
pub struct Descriptor {
    file: NamedTempFile,
    context_dir: PathBuf,
}

impl Descriptor {
    pub fn new(file: NamedTempFile, context_dir: impl Into<PathBuf>) -> Self {
        Self {
            file,
            context_dir: context_dir.into(),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Directory whose content is sent as the build context
    pub fn context_dir(&self) -> &Path {
        &self.context_dir
    }
}

//! Results of build attempts

use serde::Serialize;
use std::path::PathBuf;

/// Outcome of one build-tool strategy
///
/// `NotApplicable` means the build tool has no such capability for the
/// service; `Failed` means it tried and did not produce anything usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    Success(T),
    NotApplicable,
    Failed(String),
}

impl<T> Attempt<T> {
    pub fn failed(reason: impl Into<String>) -> Self {
        Attempt::Failed(reason.into())
    }
}

/// Image produced directly by the build tool (buildpack path)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildpackImage {
    pub repository: String,
    pub tag: String,
}

/// Packaged artifact produced by the build tool (manual path)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackagedArtifact {
    pub dir: PathBuf,
    pub file_name: String,
}

impl PackagedArtifact {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStrategy {
    Buildpack,
    Manual,
}

impl std::fmt::Display for BuildStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStrategy::Buildpack => write!(f, "buildpack"),
            BuildStrategy::Manual => write!(f, "manual"),
        }
    }
}

/// A freshly built image and the tag that currently carries it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltImage {
    pub service: String,
    pub repository: String,
    pub source_tag: String,
    pub strategy: BuildStrategy,
}

impl BuiltImage {
    pub fn from_buildpack(service: impl Into<String>, image: BuildpackImage) -> Self {
        Self {
            service: service.into(),
            repository: super::normalize_repository(&image.repository),
            source_tag: image.tag,
            strategy: BuildStrategy::Buildpack,
        }
    }

    pub fn from_descriptor(service: impl Into<String>, source_tag: impl Into<String>) -> Self {
        let service = service.into();
        Self {
            repository: service.clone(),
            service,
            source_tag: source_tag.into(),
            strategy: BuildStrategy::Manual,
        }
    }

    pub fn source_ref(&self) -> String {
        format!("{}:{}", self.repository, self.source_tag)
    }
}

use serde::Serialize;

/// Add `target_repository:target_tag` to the identity currently addressed by
/// `source_repository:source_tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagOperation {
    pub image_id: String,
    pub source_repository: String,
    pub source_tag: String,
    pub target_repository: String,
    pub target_tag: String,
}

impl TagOperation {
    pub fn new(
        image_id: impl Into<String>,
        source_repository: impl Into<String>,
        source_tag: impl Into<String>,
        target_repository: impl Into<String>,
        target_tag: impl Into<String>,
    ) -> Self {
        Self {
            image_id: image_id.into(),
            source_repository: source_repository.into(),
            source_tag: source_tag.into(),
            target_repository: target_repository.into(),
            target_tag: target_tag.into(),
        }
    }

    pub fn source_ref(&self) -> String {
        format!("{}:{}", self.source_repository, self.source_tag)
    }

    pub fn target_ref(&self) -> String {
        format!("{}:{}", self.target_repository, self.target_tag)
    }
}

impl std::fmt::Display for TagOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.source_ref(), self.target_ref())
    }
}

/// Delete a `repository:tag` pair that only carried a fresh build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanupOperation {
    pub repository: String,
    pub tag: String,
}

impl CleanupOperation {
    pub fn new(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            tag: tag.into(),
        }
    }
}

impl std::fmt::Display for CleanupOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

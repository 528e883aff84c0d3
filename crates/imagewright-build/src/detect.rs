//! ビルドツールの検出

use crate::error::{BuildToolError, Result};
use crate::gradle::GradleAdapter;
use crate::maven::MavenAdapter;
use imagewright_core::BuildAdapter;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const GRADLE_MARKERS: &[&str] = &[
    "gradlew",
    "build.gradle",
    "build.gradle.kts",
    "settings.gradle",
    "settings.gradle.kts",
];

const MAVEN_MARKERS: &[&str] = &["mvnw", "pom.xml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildToolKind {
    Gradle,
    Maven,
}

impl std::fmt::Display for BuildToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildToolKind::Gradle => write!(f, "gradle"),
            BuildToolKind::Maven => write!(f, "maven"),
        }
    }
}

/// Detect the build tool from marker files. Gradle wins when both exist.
pub fn detect(root: &Path) -> Result<BuildToolKind> {
    let has_any = |markers: &[&str]| markers.iter().any(|m| root.join(m).is_file());

    if has_any(GRADLE_MARKERS) {
        Ok(BuildToolKind::Gradle)
    } else if has_any(MAVEN_MARKERS) {
        Ok(BuildToolKind::Maven)
    } else {
        Err(BuildToolError::UnresolvedBuildTool(root.to_path_buf()))
    }
}

/// Resolve the build tool for `root` and load its project index.
///
/// `kind` overrides detection.
pub async fn connect(root: &Path, kind: Option<BuildToolKind>) -> Result<Box<dyn BuildAdapter>> {
    if !root.is_dir() {
        return Err(BuildToolError::UnresolvedBuildTool(root.to_path_buf()));
    }

    let kind = match kind {
        Some(kind) => kind,
        None => detect(root)?,
    };
    info!(root = %root.display(), tool = %kind, "Resolved build tool");

    let adapter: Box<dyn BuildAdapter> = match kind {
        BuildToolKind::Gradle => Box::new(GradleAdapter::connect(root).await?),
        BuildToolKind::Maven => Box::new(MavenAdapter::connect(root).await?),
    };
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) {
        std::fs::write(dir.path().join(name), "").unwrap();
    }

    #[test]
    fn test_detect_gradle_wrapper() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "gradlew");
        assert_eq!(detect(dir.path()).unwrap(), BuildToolKind::Gradle);
    }

    #[test]
    fn test_detect_gradle_kotlin_settings() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "settings.gradle.kts");
        assert_eq!(detect(dir.path()).unwrap(), BuildToolKind::Gradle);
    }

    #[test]
    fn test_detect_maven() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "pom.xml");
        assert_eq!(detect(dir.path()).unwrap(), BuildToolKind::Maven);
    }

    #[test]
    fn test_gradle_preferred_over_maven() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "pom.xml");
        touch(&dir, "build.gradle");
        assert_eq!(detect(dir.path()).unwrap(), BuildToolKind::Gradle);
    }

    #[test]
    fn test_detect_nothing() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "package.json");
        assert!(matches!(
            detect(dir.path()),
            Err(BuildToolError::UnresolvedBuildTool(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_missing_root() {
        let result = connect(Path::new("/nonexistent/imagewright/project"), None).await;
        assert!(matches!(result, Err(BuildToolError::UnresolvedBuildTool(_))));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(BuildToolKind::Gradle.to_string(), "gradle");
        assert_eq!(BuildToolKind::Maven.to_string(), "maven");
    }
}

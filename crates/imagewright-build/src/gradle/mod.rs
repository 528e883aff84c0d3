//! Gradle アダプタ
//!
//! - ビルドパック: `bootBuildImage` タスク
//! - 手動ビルド: `bootJar` タスク + `properties` で成果物の場所を解決

mod index;

pub use index::{GradleIndex, GradleProject};

use crate::command::{CommandOutput, ToolCommand};
use crate::error::{BuildToolError, Result};
use crate::output::{parse_built_image, parse_properties};
use async_trait::async_trait;
use imagewright_core::{Attempt, BuildAdapter, BuildpackImage, PackagedArtifact};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const BOOT_BUILD_IMAGE: &str = "bootBuildImage";
const BOOT_JAR: &str = "bootJar";
const PROPERTIES: &str = "properties";

const SETTINGS_FILES: &[&str] = &["settings.gradle.kts", "settings.gradle"];

/// Gradle が付けるバージョン未設定時の値
const UNSPECIFIED_VERSION: &str = "unspecified";

pub struct GradleAdapter {
    root: PathBuf,
    program: PathBuf,
    index: GradleIndex,
}

impl GradleAdapter {
    /// Read the settings script and ask Gradle for every project's tasks.
    pub async fn connect(root: &Path) -> Result<Self> {
        let program = launcher(root);
        let settings = read_settings(root).await?;
        let mut index = GradleIndex::from_settings(root, settings.as_deref());

        let output = ToolCommand::new(&program)
            .current_dir(root)
            .args(["tasks", "--all", "-q", "--console=plain"])
            .run()
            .await?;
        index.add_tasks(&output.stdout);

        info!(
            root = %root.display(),
            projects = index.len(),
            "Loaded Gradle project index"
        );

        Ok(Self::with_index(root, program, index))
    }

    pub fn with_index(root: &Path, program: impl Into<PathBuf>, index: GradleIndex) -> Self {
        Self {
            root: root.to_path_buf(),
            program: program.into(),
            index,
        }
    }

    pub fn index(&self) -> &GradleIndex {
        &self.index
    }

    fn project(&self, service: &str) -> Result<&GradleProject> {
        self.index
            .get(service)
            .ok_or_else(|| BuildToolError::ProjectNotFound {
                tool: "Gradle".to_string(),
                project: service.to_string(),
            })
    }

    async fn run_task(&self, project: &GradleProject, task: &str) -> Result<CommandOutput> {
        ToolCommand::new(&self.program)
            .current_dir(&self.root)
            .arg("--console=plain")
            .arg(project.task_path(task))
            .run()
            .await
    }

    async fn build_image(&self, service: &str) -> Result<Option<BuildpackImage>> {
        let project = self.project(service)?;
        if !project.has_task(BOOT_BUILD_IMAGE) {
            return Ok(None);
        }

        let output = self.run_task(project, BOOT_BUILD_IMAGE).await?;
        parse_built_image(&output.stdout).map(Some).ok_or_else(|| {
            BuildToolError::UnexpectedOutput(format!(
                "{} did not report a built image",
                project.task_path(BOOT_BUILD_IMAGE)
            ))
        })
    }

    async fn package(&self, service: &str) -> Result<Option<PackagedArtifact>> {
        let project = self.project(service)?;
        if !project.has_task(BOOT_JAR) {
            return Ok(None);
        }

        self.run_task(project, BOOT_JAR).await?;
        let output = self.run_task(project, PROPERTIES).await?;
        let artifact = artifact_from_properties(project, &parse_properties(&output.stdout))?;

        if !artifact.path().is_file() {
            warn!(
                service = %service,
                path = %artifact.path().display(),
                "Packaged artifact not found where Gradle reported it"
            );
        }
        Ok(Some(artifact))
    }
}

#[async_trait]
impl BuildAdapter for GradleAdapter {
    fn tool_name(&self) -> &str {
        "gradle"
    }

    fn is_valid_service(&self, service: &str) -> bool {
        self.index.contains(service)
    }

    fn services(&self) -> Vec<String> {
        self.index.names()
    }

    async fn create_image_from_buildpack(&self, service: &str) -> Attempt<BuildpackImage> {
        match self.build_image(service).await {
            Ok(Some(image)) => Attempt::Success(image),
            Ok(None) => {
                debug!(service = %service, "No {} task", BOOT_BUILD_IMAGE);
                Attempt::NotApplicable
            }
            Err(e) => Attempt::failed(e.to_string()),
        }
    }

    async fn create_packaged_artifact(&self, service: &str) -> Attempt<PackagedArtifact> {
        match self.package(service).await {
            Ok(Some(artifact)) => Attempt::Success(artifact),
            Ok(None) => Attempt::NotApplicable,
            Err(e) => Attempt::failed(e.to_string()),
        }
    }
}

/// Prefer the project's wrapper over a `gradle` on PATH.
fn launcher(root: &Path) -> PathBuf {
    let wrapper = if cfg!(windows) {
        "gradlew.bat"
    } else {
        "gradlew"
    };
    let path = root.join(wrapper);
    if path.is_file() {
        path
    } else {
        PathBuf::from("gradle")
    }
}

async fn read_settings(root: &Path) -> Result<Option<String>> {
    for name in SETTINGS_FILES {
        let path = root.join(name);
        if path.is_file() {
            return Ok(Some(tokio::fs::read_to_string(&path).await?));
        }
    }
    Ok(None)
}

/// `<buildDir>/<libsDirName>/<archivesBaseName>[-<version>].jar`
fn artifact_from_properties(
    project: &GradleProject,
    props: &HashMap<String, String>,
) -> Result<PackagedArtifact> {
    let build_dir = props
        .get("buildDir")
        .map(PathBuf::from)
        .unwrap_or_else(|| project.dir.join("build"));
    let libs_dir = props
        .get("libsDirName")
        .map(String::as_str)
        .unwrap_or("libs");
    let base_name = props
        .get("archivesBaseName")
        .or_else(|| props.get("name"))
        .ok_or_else(|| {
            BuildToolError::UnexpectedOutput(format!(
                "archivesBaseName missing from {}",
                project.task_path(PROPERTIES)
            ))
        })?;

    let file_name = match props.get("version").map(String::as_str) {
        None | Some(UNSPECIFIED_VERSION) | Some("") => format!("{}.jar", base_name),
        Some(version) => format!("{}-{}.jar", base_name, version),
    };

    Ok(PackagedArtifact::new(build_dir.join(libs_dir), file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> GradleProject {
        let mut index = GradleIndex::from_settings(
            Path::new("/work/shop"),
            Some("rootProject.name = 'shop'\ninclude 'orders'\n"),
        );
        index.add_tasks("orders:bootJar - Assembles an executable jar\n");
        index.get("orders").cloned().unwrap()
    }

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_artifact_with_version() {
        let artifact = artifact_from_properties(
            &project(),
            &props(&[
                ("buildDir", "/work/shop/orders/build"),
                ("libsDirName", "libs"),
                ("archivesBaseName", "orders"),
                ("version", "1.4.0"),
            ]),
        )
        .unwrap();
        assert_eq!(artifact.dir, PathBuf::from("/work/shop/orders/build/libs"));
        assert_eq!(artifact.file_name, "orders-1.4.0.jar");
    }

    #[test]
    fn test_artifact_unspecified_version() {
        let artifact = artifact_from_properties(
            &project(),
            &props(&[
                ("buildDir", "/out"),
                ("archivesBaseName", "orders"),
                ("version", "unspecified"),
            ]),
        )
        .unwrap();
        assert_eq!(artifact.path(), PathBuf::from("/out/libs/orders.jar"));
    }

    #[test]
    fn test_artifact_defaults_build_dir() {
        let artifact =
            artifact_from_properties(&project(), &props(&[("archivesBaseName", "orders")]))
                .unwrap();
        assert_eq!(artifact.dir, PathBuf::from("/work/shop/orders/build/libs"));
    }

    #[test]
    fn test_artifact_requires_base_name() {
        let result = artifact_from_properties(&project(), &props(&[("buildDir", "/out")]));
        assert!(matches!(result, Err(BuildToolError::UnexpectedOutput(_))));
    }

    #[test]
    fn test_launcher_prefers_wrapper() {
        let dir = TempDir::new().unwrap();
        assert_eq!(launcher(dir.path()), PathBuf::from("gradle"));

        let wrapper = if cfg!(windows) { "gradlew.bat" } else { "gradlew" };
        std::fs::write(dir.path().join(wrapper), "").unwrap();
        assert_eq!(launcher(dir.path()), dir.path().join(wrapper));
    }

    #[tokio::test]
    async fn test_unknown_service_fails_attempts() {
        let adapter = GradleAdapter::with_index(
            Path::new("/work/shop"),
            "gradle",
            GradleIndex::from_settings(Path::new("/work/shop"), None),
        );
        assert!(!adapter.is_valid_service("orders"));
        assert!(matches!(
            adapter.create_image_from_buildpack("orders").await,
            Attempt::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_tasks_are_not_applicable() {
        let adapter = GradleAdapter::with_index(
            Path::new("/work/shop"),
            "gradle",
            GradleIndex::from_settings(Path::new("/work/shop"), None),
        );
        assert!(adapter.is_valid_service("shop"));
        assert_eq!(
            adapter.create_image_from_buildpack("shop").await,
            Attempt::NotApplicable
        );
        assert_eq!(
            adapter.create_packaged_artifact("shop").await,
            Attempt::NotApplicable
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_buildpack_with_scripted_gradle() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let script = dir.path().join("gradlew");
        std::fs::write(
            &script,
            "#!/bin/sh\n\
             case \"$*\" in\n\
             *tasks*) echo 'bootBuildImage - Builds an OCI image' ;;\n\
             *bootBuildImage*) echo \"Successfully built image 'docker.io/library/demo:0.1.0'\" ;;\n\
             esac\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        std::fs::write(
            dir.path().join("settings.gradle"),
            "rootProject.name = 'demo'\n",
        )
        .unwrap();

        let adapter = GradleAdapter::connect(dir.path()).await.unwrap();
        assert_eq!(adapter.services(), vec!["demo".to_string()]);
        assert_eq!(
            adapter.create_image_from_buildpack("demo").await,
            Attempt::Success(BuildpackImage {
                repository: "demo".to_string(),
                tag: "0.1.0".to_string(),
            })
        );
        assert_eq!(
            adapter.create_packaged_artifact("demo").await,
            Attempt::NotApplicable
        );
    }
}

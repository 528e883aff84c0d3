//! Maven アダプタ
//!
//! - ビルドパック: `spring-boot:build-image` (spring-boot-maven-plugin がある場合のみ)
//! - 手動ビルド: `package` + `help:evaluate` で finalName を解決

mod pom;

pub use pom::PomSummary;

use crate::command::ToolCommand;
use crate::error::{BuildToolError, Result};
use crate::output::parse_built_image;
use async_trait::async_trait;
use imagewright_core::{Attempt, BuildAdapter, BuildpackImage, PackagedArtifact};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const POM_FILE: &str = "pom.xml";
const BUILD_IMAGE_GOAL: &str = "spring-boot:build-image";
const TARGET_DIR: &str = "target";

/// One Maven module (the reactor root included)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenModule {
    pub artifact_id: String,
    pub dir: PathBuf,
    pub spring_boot_plugin: bool,
}

impl MavenModule {
    pub fn pom(&self) -> PathBuf {
        self.dir.join(POM_FILE)
    }
}

/// Modules keyed by lowercase artifactId
#[derive(Debug, Clone, Default)]
pub struct MavenIndex {
    modules: BTreeMap<String, MavenModule>,
}

impl MavenIndex {
    /// Walk the reactor starting at `root/pom.xml`.
    ///
    /// The spring-boot plugin declared in a parent is inherited by its modules.
    pub async fn load(root: &Path) -> Result<Self> {
        let mut index = Self::default();
        let mut pending = vec![(root.to_path_buf(), false)];

        while let Some((dir, inherited_plugin)) = pending.pop() {
            let pom_path = dir.join(POM_FILE);
            let content = match tokio::fs::read_to_string(&pom_path).await {
                Ok(content) => content,
                Err(e) if dir != root => {
                    warn!(path = %pom_path.display(), error = %e, "Skipping unreadable module");
                    continue;
                }
                Err(_) => return Err(BuildToolError::UnresolvedBuildTool(root.to_path_buf())),
            };

            let summary = PomSummary::parse(&content);
            let spring_boot_plugin = inherited_plugin || summary.spring_boot_plugin;
            let artifact_id = summary.artifact_id.unwrap_or_else(|| {
                dir.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });

            for module in &summary.modules {
                pending.push((dir.join(module), spring_boot_plugin));
            }
            index.insert(MavenModule {
                artifact_id,
                dir,
                spring_boot_plugin,
            });
        }

        Ok(index)
    }

    pub fn insert(&mut self, module: MavenModule) {
        self.modules
            .insert(module.artifact_id.to_lowercase(), module);
    }

    pub fn get(&self, name: &str) -> Option<&MavenModule> {
        self.modules.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.modules.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

pub struct MavenAdapter {
    root: PathBuf,
    program: PathBuf,
    index: MavenIndex,
}

impl MavenAdapter {
    pub async fn connect(root: &Path) -> Result<Self> {
        let index = MavenIndex::load(root).await?;
        info!(
            root = %root.display(),
            modules = index.len(),
            "Loaded Maven module index"
        );
        Ok(Self::with_index(root, launcher(root), index))
    }

    pub fn with_index(root: &Path, program: impl Into<PathBuf>, index: MavenIndex) -> Self {
        Self {
            root: root.to_path_buf(),
            program: program.into(),
            index,
        }
    }

    pub fn index(&self) -> &MavenIndex {
        &self.index
    }

    fn module(&self, service: &str) -> Result<&MavenModule> {
        self.index
            .get(service)
            .ok_or_else(|| BuildToolError::ProjectNotFound {
                tool: "Maven".to_string(),
                project: service.to_string(),
            })
    }

    fn command(&self, module: &MavenModule) -> ToolCommand {
        ToolCommand::new(&self.program)
            .current_dir(&self.root)
            .arg("--batch-mode")
            .arg("-f")
            .arg(module.pom())
    }

    async fn build_image(&self, service: &str) -> Result<Option<BuildpackImage>> {
        let module = self.module(service)?;
        if !module.spring_boot_plugin {
            return Ok(None);
        }

        let output = self
            .command(module)
            .args([BUILD_IMAGE_GOAL, "-DskipTests"])
            .run()
            .await?;
        parse_built_image(&output.stdout).map(Some).ok_or_else(|| {
            BuildToolError::UnexpectedOutput(format!(
                "{} did not report a built image for {}",
                BUILD_IMAGE_GOAL, module.artifact_id
            ))
        })
    }

    async fn package(&self, service: &str) -> Result<PackagedArtifact> {
        let module = self.module(service)?;

        self.command(module)
            .args(["package", "-DskipTests"])
            .run()
            .await?;

        let output = self
            .command(module)
            .args([
                "help:evaluate",
                "-Dexpression=project.build.finalName",
                "-q",
                "-DforceStdout",
            ])
            .run()
            .await?;
        let final_name = output.stdout.trim();
        if final_name.is_empty() {
            return Err(BuildToolError::UnexpectedOutput(format!(
                "empty finalName for {}",
                module.artifact_id
            )));
        }

        let artifact = PackagedArtifact::new(
            module.dir.join(TARGET_DIR),
            format!("{}.jar", final_name),
        );
        if !artifact.path().is_file() {
            warn!(
                service = %service,
                path = %artifact.path().display(),
                "Packaged artifact not found where Maven reported it"
            );
        }
        Ok(artifact)
    }
}

#[async_trait]
impl BuildAdapter for MavenAdapter {
    fn tool_name(&self) -> &str {
        "maven"
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
                debug!(service = %service, "spring-boot-maven-plugin not configured");
                Attempt::NotApplicable
            }
            Err(e) => Attempt::failed(e.to_string()),
        }
    }

    async fn create_packaged_artifact(&self, service: &str) -> Attempt<PackagedArtifact> {
        match self.package(service).await {
            Ok(artifact) => Attempt::Success(artifact),
            Err(e) => Attempt::failed(e.to_string()),
        }
    }
}

/// Prefer the project's wrapper over an `mvn` on PATH.
fn launcher(root: &Path) -> PathBuf {
    let wrapper = if cfg!(windows) { "mvnw.cmd" } else { "mvnw" };
    let path = root.join(wrapper);
    if path.is_file() {
        path
    } else {
        PathBuf::from("mvn")
    }
}

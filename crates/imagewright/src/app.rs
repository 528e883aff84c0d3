//! Composition root: settings, build tool, Docker and the Dockerfile renderer

use anyhow::Context;
use imagewright_build::{BuildToolKind, DockerfileRenderer};
use imagewright_config::{BuildToolSetting, Settings};
use imagewright_container::DockerMaterializer;
use imagewright_core::{BuildAdapter, EngineOptions};
use std::path::PathBuf;
use tracing::{debug, info};

/// Global CLI options that shape the composition
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub config: Option<PathBuf>,
    pub project: Option<PathBuf>,
}

impl AppOptions {
    pub fn load_settings(&self) -> anyhow::Result<Settings> {
        let settings = match &self.config {
            Some(path) => Settings::from_file(path)
                .with_context(|| format!("設定ファイルを読み込めません: {}", path.display()))?,
            None => imagewright_config::load()?,
        };
        debug!(?settings, "Settings loaded");
        Ok(settings)
    }

    pub fn project_root(&self, settings: &Settings) -> anyhow::Result<PathBuf> {
        if let Some(project) = &self.project {
            return Ok(project.clone());
        }
        Ok(settings.project_root_or(&std::env::current_dir()?))
    }
}

pub fn engine_options(settings: &Settings, jobs: Option<usize>) -> EngineOptions {
    EngineOptions {
        max_parallel_builds: jobs.unwrap_or(settings.max_parallel_builds).max(1),
        manual_source_tag: settings.manual_source_tag.clone(),
    }
}

fn build_tool_kind(setting: BuildToolSetting) -> Option<BuildToolKind> {
    match setting {
        BuildToolSetting::Auto => None,
        BuildToolSetting::Gradle => Some(BuildToolKind::Gradle),
        BuildToolSetting::Maven => Some(BuildToolKind::Maven),
    }
}

/// Resolve the build tool and load its project index.
pub async fn connect_build_tool(
    options: &AppOptions,
    settings: &Settings,
) -> anyhow::Result<Box<dyn BuildAdapter>> {
    let root = options.project_root(settings)?;
    info!(root = %root.display(), "Using project");
    Ok(imagewright_build::connect(&root, build_tool_kind(settings.build_tool)).await?)
}

/// Connect to Docker and check that the daemon answers.
pub async fn connect_docker(settings: &Settings) -> anyhow::Result<DockerMaterializer> {
    let materializer = DockerMaterializer::connect(settings.docker.host.as_deref())?;
    materializer.ping().await?;
    Ok(materializer)
}

pub fn renderer(settings: &Settings) -> anyhow::Result<DockerfileRenderer> {
    let renderer = match &settings.descriptor.template {
        Some(path) => DockerfileRenderer::from_template_file(path)?,
        None => DockerfileRenderer::new()?,
    };
    Ok(renderer.with_images(
        settings.descriptor.builder_image.clone(),
        settings.descriptor.runtime_image.clone(),
    ))
}

/// Renderer for dry runs: nothing is rendered, so the configured template is not loaded.
pub fn dry_run_renderer() -> anyhow::Result<DockerfileRenderer> {
    Ok(DockerfileRenderer::new()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_options_from_settings() {
        let settings = Settings {
            max_parallel_builds: 3,
            manual_source_tag: "snapshot".to_string(),
            ..Default::default()
        };
        let options = engine_options(&settings, None);
        assert_eq!(options.max_parallel_builds, 3);
        assert_eq!(options.manual_source_tag, "snapshot");
    }

    #[test]
    fn test_jobs_flag_overrides_settings() {
        let settings = Settings::default();
        assert_eq!(engine_options(&settings, Some(8)).max_parallel_builds, 8);
        assert_eq!(engine_options(&settings, Some(0)).max_parallel_builds, 1);
    }

    #[test]
    fn test_build_tool_kind() {
        assert_eq!(build_tool_kind(BuildToolSetting::Auto), None);
        assert_eq!(
            build_tool_kind(BuildToolSetting::Maven),
            Some(BuildToolKind::Maven)
        );
    }

    #[test]
    fn test_project_flag_wins() {
        let options = AppOptions {
            config: None,
            project: Some(PathBuf::from("/work/flag")),
        };
        let settings = Settings {
            project_root: Some(PathBuf::from("/work/config")),
            ..Default::default()
        };
        assert_eq!(
            options.project_root(&settings).unwrap(),
            PathBuf::from("/work/flag")
        );
    }

    #[test]
    fn test_renderer_uses_configured_images() {
        let mut settings = Settings::default();
        settings.descriptor.runtime_image = Some("eclipse-temurin:21-jre".to_string());
        let renderer = renderer(&settings).unwrap();
        let artifact = imagewright_core::PackagedArtifact::new("/tmp", "app.jar");
        let content = renderer.render_to_string("app", &artifact).unwrap();
        assert!(content.contains("FROM eclipse-temurin:21-jre"));
    }

    #[test]
    fn test_dry_run_ignores_broken_template() {
        let mut settings = Settings::default();
        settings.descriptor.template = Some(PathBuf::from("/nonexistent/imagewright/Dockerfile.tera"));

        assert!(renderer(&settings).is_err());
        assert!(dry_run_renderer().is_ok());
    }
}

//! 設定値

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_PARALLEL_BUILDS: usize = 1;
pub const DEFAULT_MANUAL_SOURCE_TAG: &str = "latest";

/// Which build tool to drive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildToolSetting {
    /// マーカーファイルから検出
    #[default]
    Auto,
    Gradle,
    Maven,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DockerSettings {
    /// `unix://...` or `tcp://host:port`; the local defaults apply when unset
    pub host: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DescriptorSettings {
    pub builder_image: Option<String>,
    pub runtime_image: Option<String>,
    /// Tera template used instead of the built-in Dockerfile
    pub template: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub project_root: Option<PathBuf>,
    pub build_tool: BuildToolSetting,
    pub max_parallel_builds: usize,
    pub manual_source_tag: String,
    pub docker: DockerSettings,
    pub descriptor: DescriptorSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_root: None,
            build_tool: BuildToolSetting::Auto,
            max_parallel_builds: DEFAULT_MAX_PARALLEL_BUILDS,
            manual_source_tag: DEFAULT_MANUAL_SOURCE_TAG.to_string(),
            docker: DockerSettings::default(),
            descriptor: DescriptorSettings::default(),
        }
    }
}

impl Settings {
    /// Parse and validate YAML. An empty document yields the defaults.
    pub fn from_yaml(content: &str, origin: &Path) -> Result<Self> {
        let settings: Settings = if content.trim().is_empty() {
            Settings::default()
        } else {
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: origin.to_path_buf(),
                source,
            })?
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Load a file; relative paths inside it are resolved against its directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_yaml(&content, path)?;
        Ok(match path.parent() {
            Some(base) => settings.resolve_paths(base),
            None => settings,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_parallel_builds == 0 {
            return Err(ConfigError::Invalid(
                "max_parallel_builds は 1 以上を指定してください".to_string(),
            ));
        }
        if self.manual_source_tag.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "manual_source_tag が空です".to_string(),
            ));
        }
        Ok(())
    }

    fn resolve_paths(mut self, base: &Path) -> Self {
        let resolve = |path: PathBuf| {
            if path.is_relative() {
                base.join(path)
            } else {
                path
            }
        };
        self.project_root = self.project_root.map(resolve);
        self.descriptor.template = self.descriptor.template.map(resolve);
        self
    }

    /// The project directory, falling back to `cwd`
    pub fn project_root_or(&self, cwd: &Path) -> PathBuf {
        self.project_root
            .clone()
            .unwrap_or_else(|| cwd.to_path_buf())
    }
}

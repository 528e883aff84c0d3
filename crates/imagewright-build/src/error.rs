use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildToolError {
    #[error("Gradle or Maven build configuration not found in {0}")]
    UnresolvedBuildTool(PathBuf),

    #[error("{project} is not configured as a {tool} project")]
    ProjectNotFound { tool: String, project: String },

    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Unexpected build tool output: {0}")]
    UnexpectedOutput(String),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildToolError {
    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            BuildToolError::UnresolvedBuildTool(path) => format!(
                "ビルドツールを特定できません: {}\n\
                 \n\
                 解決方法:\n\
                 1. gradlew / build.gradle / pom.xml があるディレクトリで実行してください\n\
                 2. 設定ファイルで project_root を指定してください",
                path.display()
            ),
            BuildToolError::Spawn { command, .. } => format!(
                "{} を実行できません\n\
                 \n\
                 Gradle / Maven がインストールされているか確認してください。",
                command
            ),
            _ => format!("{}", self),
        }
    }
}

impl From<BuildToolError> for imagewright_core::Error {
    fn from(err: BuildToolError) -> Self {
        match err {
            BuildToolError::ProjectNotFound { project, .. } => {
                imagewright_core::Error::InvalidService(project)
            }
            BuildToolError::Template(e) => imagewright_core::Error::Descriptor(e.to_string()),
            BuildToolError::Io(e) => imagewright_core::Error::Io(e),
            other => imagewright_core::Error::BuildTool(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, BuildToolError>;

//! Core error types

use thiserror::Error;

/// Errors raised by the engine and by its collaborators.
///
/// Adapter crates convert their own error enums into this type at the trait
/// boundary, so the engine only has to reason about these kinds.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Service is not managed by the build tool: {0}")]
    InvalidService(String),

    #[error("Build tool error: {0}")]
    BuildTool(String),

    #[error("Registry error during {operation}: {message}")]
    Registry { operation: String, message: String },

    #[error("Descriptor error: {0}")]
    Descriptor(String),

    #[error("Image '{repository}:{tag}' was reported as built but is missing from the registry")]
    Consistency { repository: String, tag: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn registry(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Registry {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// ユーザー向けの分かりやすいエラーメッセージ
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidService(name) => format!(
                "サービス '{}' はビルドツールのプロジェクトとして見つかりません\n\
                 \n\
                 ヒント:\n  • settings.gradle / pom.xml のプロジェクト名を確認してください",
                name
            ),
            Error::Registry { operation, message } => format!(
                "Dockerの操作 ({}) に失敗しました: {}\n\
                 \n\
                 ヒント:\n  • Dockerが起動しているか確認してください",
                operation, message
            ),
            Error::Consistency { repository, tag } => format!(
                "ビルド済みのイメージ '{}:{}' がレジストリに見つかりません\n\
                 \n\
                 ビルドツールの出力とDockerの状態を確認してください。",
                repository, tag
            ),
            _ => format!("{}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

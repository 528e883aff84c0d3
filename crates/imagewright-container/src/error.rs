use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error(
        "Dockerに接続できません: {0}\n\nヒント:\n  • Dockerが起動しているか確認してください\n  • docker.host の設定または DOCKER_HOST を確認してください"
    )]
    DockerConnectionFailed(String),

    #[error("Docker ホストの指定が不正です: {0}")]
    InvalidHost(String),

    #[error("イメージ '{image}' が見つかりません")]
    ImageNotFound { image: String },

    #[error("イメージのビルドに失敗しました: {0}")]
    BuildFailed(String),

    #[error("Docker APIエラー: {0}")]
    DockerApiError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContainerError {
    /// Registry error for the engine, labelled with the failed operation
    pub fn into_registry(self, operation: &str) -> imagewright_core::Error {
        imagewright_core::Error::registry(operation, self.to_string())
    }
}

impl From<bollard::errors::Error> for ContainerError {
    fn from(err: bollard::errors::Error) -> Self {
        match &err {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                message,
            } => ContainerError::ImageNotFound {
                image: message.clone(),
            },
            _ => {
                // 接続エラーの可能性をチェック
                let err_str = err.to_string();
                if err_str.contains("Connection refused")
                    || err_str.contains("No such file or directory")
                {
                    ContainerError::DockerConnectionFailed(err_str)
                } else {
                    ContainerError::DockerApiError(err_str)
                }
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ContainerError>;

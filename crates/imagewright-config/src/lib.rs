pub mod error;
pub mod settings;

pub use error::*;
pub use settings::*;

use std::path::PathBuf;
use tracing::debug;

/// 設定ファイルのパスを直接指定する環境変数
pub const CONFIG_ENV: &str = "IMAGEWRIGHT_CONFIG";

const CANDIDATES: &[&str] = &["imagewright.yaml", ".imagewright.yaml"];

/// imagewright のユーザー設定ディレクトリ (`~/.config/imagewright` など)
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("imagewright"))
}

/// 設定ファイルを探す
///
/// 以下の優先順位で検索:
/// 1. 環境変数 IMAGEWRIGHT_CONFIG (直接パス指定、存在しなければエラー)
/// 2. カレントディレクトリ: imagewright.yaml, .imagewright.yaml
/// 3. <config_dir>/imagewright/config.yaml (グローバル設定)
///
/// どれも無ければ `None` (組み込みのデフォルトを使う)
pub fn find_config_file() -> Result<Option<PathBuf>> {
    if let Some(config_path) = std::env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        let path = PathBuf::from(config_path);
        if path.is_file() {
            return Ok(Some(path));
        }
        return Err(ConfigError::ConfigFileNotFound(path));
    }

    let current_dir = std::env::current_dir()?;
    for filename in CANDIDATES {
        let path = current_dir.join(filename);
        if path.is_file() {
            return Ok(Some(path));
        }
    }

    if let Ok(config_dir) = get_config_dir() {
        let global_config = config_dir.join("config.yaml");
        if global_config.is_file() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// 設定を読み込む。設定ファイルが無ければデフォルト値。
pub fn load() -> Result<Settings> {
    match find_config_file()? {
        Some(path) => {
            debug!(path = %path.display(), "Loading configuration");
            Settings::from_file(&path)
        }
        None => {
            debug!("No configuration file found, using defaults");
            Ok(Settings::default())
        }
    }
}

//! 設定管理
//!
//! `$CONFIG_DIR/dired/config.json` から読み込み、コマンドライン指定で上書きする

use crate::error::{ConfigError, Result};
use crate::file::path::expand_path;
use crate::logging::LogLevel;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// dired の設定
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiredConfig {
    /// 起動時にディレクトリを尋ねるか
    pub ask_directory: bool,
    /// 全ディレクトリで一つのウィンドウを使い回すか
    pub fixed_window: bool,
    /// `.` で始まるファイルを表示するか
    pub show_dot_files: bool,
    /// 一括選択に `.` / `..` を含めるか
    pub allow_select_dot: bool,
    /// ログ出力先
    pub log_file: Option<PathBuf>,
    /// ログレベル
    pub log_level: LogLevel,
}

impl Default for DiredConfig {
    fn default() -> Self {
        Self {
            ask_directory: true,
            fixed_window: false,
            show_dot_files: true,
            allow_select_dot: false,
            log_file: None,
            log_level: LogLevel::Info,
        }
    }
}

/// コマンドライン指定による上書き
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub fixed_window: Option<bool>,
    pub ask_directory: Option<bool>,
    pub log_file: Option<PathBuf>,
}

impl DiredConfig {
    /// 既定の設定ファイルパス
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("dired").join("config.json"))
    }

    /// 既定の場所から読み込む（ファイルがなければデフォルト）
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// 指定ファイルから読み込む
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("no config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::InvalidFile {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
                .into())
            }
        };
        Self::from_json(&content).map_err(|e| match e {
            crate::error::DiredError::Config(ConfigError::InvalidFile { message, .. }) => {
                ConfigError::InvalidFile {
                    path: path.display().to_string(),
                    message,
                }
                .into()
            }
            other => other,
        })
    }

    /// JSON 文字列から読み込む
    pub fn from_json(content: &str) -> Result<Self> {
        let mut config: DiredConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::InvalidFile {
                path: String::from("<inline>"),
                message: e.to_string(),
            })?;

        if let Some(log_file) = config.log_file.take() {
            let raw = log_file.to_str().ok_or_else(|| ConfigError::InvalidValue {
                key: "log_file".to_string(),
                value: log_file.display().to_string(),
            })?;
            config.log_file = Some(expand_path(raw));
        }
        Ok(config)
    }

    /// コマンドライン指定を適用
    pub fn merged_with(&self, overrides: &CliOverrides) -> DiredConfig {
        DiredConfig {
            fixed_window: overrides.fixed_window.unwrap_or(self.fixed_window),
            ask_directory: overrides.ask_directory.unwrap_or(self.ask_directory),
            log_file: overrides
                .log_file
                .clone()
                .or_else(|| self.log_file.clone()),
            ..self.clone()
        }
    }
}

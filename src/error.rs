//! エラーハンドリングシステム
//!
//! dired 全体で使用される統一されたエラー型とユーティリティを定義
//! 列挙中の個別エントリの失敗は呼び出し側で握りつぶし、ディレクトリ単位の失敗は遷移を中断する

use std::io;
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;

/// アプリケーション全体のエラー型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiredError {
    /// ディレクトリではないパスを開こうとした
    #[error("Not a directory: {path}")]
    NotADirectory { path: String },

    /// パスが存在しない
    #[error("No such file or directory: {path}")]
    NotFound { path: String },

    /// アクセス権限がない
    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    /// 作成先が既に存在する
    #[error("Already exists: {path}")]
    AlreadyExists { path: String },

    /// バッファ行の解析失敗
    #[error("Unparsable listing line: {0}")]
    Format(#[from] FormatError),

    /// カーソル位置にエントリがない
    #[error("No entry at cursor")]
    NoEntryAtCursor,

    /// ディレクトリをまだ開いていない
    #[error("No directory is open")]
    NotOpened,

    /// 対象外の操作（`.` / `..` への変更、ディレクトリの再帰コピーなど）
    #[error("{operation} is not supported for {path}")]
    Unsupported { operation: String, path: String },

    /// その他のI/Oエラー
    #[error("I/O error on {path}: {message}")]
    Io { path: String, message: String },

    /// 設定エラー
    #[error("Configuration error")]
    Config(#[from] ConfigError),

    /// 端末操作エラー
    #[error("Terminal error: {0}")]
    Ui(String),
}

impl DiredError {
    /// `io::Error` をパス付きで分類
    pub fn from_io(error: io::Error, path: &Path) -> Self {
        let path = path.display().to_string();
        match error.kind() {
            io::ErrorKind::NotFound => DiredError::NotFound { path },
            io::ErrorKind::PermissionDenied => DiredError::PermissionDenied { path },
            io::ErrorKind::AlreadyExists => DiredError::AlreadyExists { path },
            _ => DiredError::Io {
                path,
                message: error.to_string(),
            },
        }
    }

    pub fn unsupported(operation: &str, path: &Path) -> Self {
        DiredError::Unsupported {
            operation: operation.to_string(),
            path: path.display().to_string(),
        }
    }
}

/// 固定幅行フォーマットの解析エラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("line is too short ({length} chars)")]
    LineTooShort { length: usize },

    #[error("invalid number in {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: u64 },

    #[error("empty file name")]
    EmptyName,
}

/// 設定固有のエラー
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid configuration file {path}: {message}")]
    InvalidFile { path: String, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// プロジェクト標準のResult型
pub type Result<T> = std::result::Result<T, DiredError>;

/// 通知レベル分類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// ミニバッファに表示する通知
#[derive(Debug, Clone)]
pub struct Notice {
    /// 表示メッセージ
    pub message: String,
    /// 通知レベル
    pub level: NoticeLevel,
    /// 表示開始時刻
    pub start_time: Instant,
    /// 表示持続時間
    pub duration: Duration,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self::with_level(message, NoticeLevel::Info)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::with_level(message, NoticeLevel::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_level(message, NoticeLevel::Error)
    }

    /// エラーから通知を作成
    pub fn from_error(error: &DiredError) -> Self {
        let (message, level) = Self::format_error(error);
        Self::with_level(message, level)
    }

    fn with_level(message: impl Into<String>, level: NoticeLevel) -> Self {
        Self {
            message: message.into(),
            level,
            start_time: Instant::now(),
            duration: Duration::from_secs(5),
        }
    }

    fn format_error(error: &DiredError) -> (String, NoticeLevel) {
        match error {
            DiredError::NotADirectory { path } => {
                (format!("ディレクトリではありません: {}", path), NoticeLevel::Error)
            }
            DiredError::NotFound { path } => {
                (format!("ファイルが見つかりません: {}", path), NoticeLevel::Error)
            }
            DiredError::PermissionDenied { path } => {
                (format!("アクセス権限がありません: {}", path), NoticeLevel::Error)
            }
            DiredError::AlreadyExists { path } => {
                (format!("既に存在します: {}", path), NoticeLevel::Error)
            }
            DiredError::Format(err) => {
                (format!("行を解析できません: {}", err), NoticeLevel::Warning)
            }
            DiredError::NoEntryAtCursor => {
                ("カーソル位置にファイルがありません".to_string(), NoticeLevel::Warning)
            }
            DiredError::NotOpened => {
                ("ディレクトリが開かれていません".to_string(), NoticeLevel::Warning)
            }
            DiredError::Unsupported { operation, path } => (
                format!("{} は {} に対して実行できません", operation, path),
                NoticeLevel::Warning,
            ),
            _ => (format!("エラーが発生しました: {}", error), NoticeLevel::Error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }

    pub fn is_expired(&self) -> bool {
        self.start_time.elapsed() >= self.duration
    }
}

/// パニックハンドラの設定
///
/// raw モードのまま終了すると端末が壊れるため、出力前に端末を復帰させる
pub fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let _ = crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen);
        log::error!("panic: {}", panic_info);
        default_hook(panic_info);
    }));
}

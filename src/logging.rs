//! ロギングシステム
//!
//! `log` ファサードのバックエンド。TUI 実行中は端末を占有するため、通常はファイルへ出力する

use serde::Deserialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// ログレベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn tag(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }

    fn from_log(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warning,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug | log::Level::Trace => LogLevel::Debug,
        }
    }

    fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// ロガー
#[derive(Debug, Clone)]
pub struct Logger {
    level: LogLevel,
    output_stderr: bool,
    output_file: Option<PathBuf>,
}

impl Logger {
    /// デフォルト構築（stderr のみ）
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            output_stderr: true,
            output_file: None,
        }
    }

    /// ファイル専用ロガー（TUI 向け）
    pub fn to_file<P: Into<PathBuf>>(level: LogLevel, path: P) -> Self {
        Self {
            level,
            output_stderr: false,
            output_file: Some(path.into()),
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn file(&self) -> Option<&Path> {
        self.output_file.as_deref()
    }

    /// 標準エラー出力を無効化
    pub fn without_stderr(mut self) -> Self {
        self.output_stderr = false;
        self
    }

    fn should_log(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    fn write_line(&self, message: &str) {
        if self.output_stderr {
            eprintln!("{}", message);
        }

        if let Some(path) = &self.output_file {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
                let _ = writeln!(file, "{}", message);
            }
        }
    }

    /// `log` ファサードに登録する
    pub fn install(self) -> std::result::Result<(), log::SetLoggerError> {
        if let Some(parent) = self.output_file.as_deref().and_then(Path::parent) {
            let _ = std::fs::create_dir_all(parent);
        }
        let filter = self.level.to_filter();
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(filter);
        Ok(())
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        self.should_log(LogLevel::from_log(metadata.level()))
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = LogLevel::from_log(record.level());
        self.write_line(&format!(
            "{} {}: {}",
            level.tag(),
            record.target(),
            record.args()
        ));
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;
    use tempfile::tempdir;

    #[test]
    fn logger_respects_log_level() {
        let logger = Logger::new(LogLevel::Debug).without_stderr();
        assert!(logger.should_log(LogLevel::Debug));
        assert!(logger.should_log(LogLevel::Error));

        let info_logger = Logger::new(LogLevel::Info).without_stderr();
        assert!(!info_logger.should_log(LogLevel::Debug));
        assert!(info_logger.should_log(LogLevel::Warning));
    }

    #[test]
    fn file_sink_appends_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dired.log");
        let logger = Logger::to_file(LogLevel::Info, &path);

        logger.log(
            &log::Record::builder()
                .level(log::Level::Warn)
                .target("dired::listing")
                .args(format_args!("dropped {}", "ghost"))
                .build(),
        );
        logger.log(
            &log::Record::builder()
                .level(log::Level::Debug)
                .target("dired::listing")
                .args(format_args!("filtered"))
                .build(),
        );

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "WARNING dired::listing: dropped ghost\n");
    }

    #[test]
    fn install_routes_facade_records_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("dired.log");

        // テストバイナリ内で facade に登録するのはここだけ
        Logger::to_file(LogLevel::Info, &path).install().unwrap();
        log::warn!(target: "dired::listing", "dropping ghost");

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("WARNING dired::listing: dropping ghost"));
    }

    #[test]
    fn level_parses_from_config_names() {
        let level: LogLevel = serde_json::from_str("\"warning\"").unwrap();
        assert_eq!(level, LogLevel::Warning);
    }
}

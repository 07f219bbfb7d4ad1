//! アプリケーションの組み立て
//!
//! コマンドライン引数と設定を読み、ロガー・識別情報・ビューを組み立てて TUI を起動する

use crate::config::{CliOverrides, DiredConfig};
use crate::error::{ConfigError, Result};
use crate::file::io::LocalFileSystem;
use crate::file::path::expand_path;
use crate::frontend::{StartupOptions, TuiApplication};
use crate::identity::IdentityResolver;
use crate::input::CommandProcessor;
use crate::logging::Logger;
use crate::view::{ViewController, ViewOptions};
use std::path::PathBuf;
use std::sync::Arc;

/// 使い方
pub const USAGE: &str = "\
usage: dired [OPTIONS] [DIRECTORY]

options:
  --fixed-window      reuse one view for every directory
  --no-ask            open DIRECTORY without prompting
  --debug-log PATH    append log output to PATH
  --config PATH       read configuration from PATH
  -h, --help          show this help
  -V, --version       show version";

/// コマンドライン引数
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub directory: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub overrides: CliOverrides,
    pub show_help: bool,
    pub show_version: bool,
}

impl CliArgs {
    /// 引数列（プログラム名を除く）を解析
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = CliArgs::default();
        let mut iter = args.into_iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--fixed-window" => parsed.overrides.fixed_window = Some(true),
                "--no-ask" => parsed.overrides.ask_directory = Some(false),
                "--debug-log" => {
                    let path = iter.next().ok_or_else(|| missing_value("--debug-log"))?;
                    parsed.overrides.log_file = Some(expand_path(&path));
                }
                "--config" => {
                    let path = iter.next().ok_or_else(|| missing_value("--config"))?;
                    parsed.config = Some(expand_path(&path));
                }
                "-h" | "--help" => parsed.show_help = true,
                "-V" | "--version" => parsed.show_version = true,
                flag if flag.starts_with('-') && flag != "-" => {
                    return Err(ConfigError::InvalidValue {
                        key: "option".to_string(),
                        value: flag.to_string(),
                    }
                    .into())
                }
                path => {
                    if parsed.directory.is_some() {
                        return Err(ConfigError::InvalidValue {
                            key: "directory".to_string(),
                            value: path.to_string(),
                        }
                        .into());
                    }
                    parsed.directory = Some(expand_path(path));
                }
            }
        }

        Ok(parsed)
    }
}

fn missing_value(flag: &str) -> crate::error::DiredError {
    ConfigError::InvalidValue {
        key: flag.to_string(),
        value: String::from("<missing>"),
    }
    .into()
}

/// アプリケーション
#[derive(Debug)]
pub struct App {
    config: DiredConfig,
    directory: Option<PathBuf>,
}

impl App {
    /// 設定を読み込み、引数で上書きする
    pub fn new(args: &CliArgs) -> Result<Self> {
        let base = match &args.config {
            Some(path) => DiredConfig::load_from(path)?,
            None => DiredConfig::load()?,
        };
        Ok(Self::with_config(base.merged_with(&args.overrides), args.directory.clone()))
    }

    pub fn with_config(config: DiredConfig, directory: Option<PathBuf>) -> Self {
        Self { config, directory }
    }

    pub fn config(&self) -> &DiredConfig {
        &self.config
    }

    /// ログ出力先が設定されていればロガーを登録する
    ///
    /// 端末は TUI が占有するため、標準エラーには出さない
    pub fn init_logging(&self) {
        if let Some(path) = &self.config.log_file {
            let logger = Logger::to_file(self.config.log_level, path.clone());
            if let Err(e) = logger.install() {
                eprintln!("logger already installed: {}", e);
            }
            log::info!("dired {} starting", env!("CARGO_PKG_VERSION"));
        }
    }

    /// ビューとコマンド処理器を組み立てる
    pub fn build_processor(&self, resolver: Arc<IdentityResolver>) -> CommandProcessor<LocalFileSystem> {
        let view = ViewController::new(LocalFileSystem::new(), resolver, ViewOptions::from(&self.config));
        CommandProcessor::new(view)
    }

    /// TUI を起動する
    pub fn run(self) -> Result<()> {
        self.init_logging();
        let resolver = Arc::new(IdentityResolver::from_system());
        let processor = self.build_processor(resolver);
        let startup = StartupOptions {
            directory: self.directory.clone(),
            ask_directory: self.config.ask_directory,
        };
        TuiApplication::new(processor, startup).run()
    }
}

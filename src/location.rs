//! ロケーター
//!
//! ディレクトリパスと仮想ドキュメントのアドレスとの相互変換。
//! 固定ウィンドウモードでは全てのディレクトリが一つのアドレスを共有する。

use crate::file::path::normalize_path;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// ロケーターのスキーム
pub const SCHEME: &str = "dired";

const FIXED_AUTHORITY: &str = "fixed_window";

/// 仮想ドキュメントのアドレス
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// 固定ウィンドウ（表示中のディレクトリを指す）
    Fixed,
    /// ディレクトリごとのアドレス（絶対パス）
    Directory(PathBuf),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Fixed => write!(f, "{}://{}", SCHEME, FIXED_AUTHORITY),
            Locator::Directory(path) => write!(f, "{}://{}", SCHEME, path.display()),
        }
    }
}

/// ロケーター文字列の解析エラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid locator: {0}")]
pub struct LocatorParseError(pub String);

impl FromStr for Locator {
    type Err = LocatorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(SCHEME)
            .and_then(|r| r.strip_prefix("://"))
            .ok_or_else(|| LocatorParseError(s.to_string()))?;

        if rest == FIXED_AUTHORITY {
            return Ok(Locator::Fixed);
        }
        let path = Path::new(rest);
        if !path.is_absolute() {
            return Err(LocatorParseError(s.to_string()));
        }
        Ok(Locator::Directory(normalize_path(path)))
    }
}

/// パスとロケーターの変換器
pub struct LocationCodec;

impl LocationCodec {
    /// パスをロケーターへ
    pub fn encode(path: &Path, fixed_window: bool) -> Locator {
        if fixed_window {
            Locator::Fixed
        } else {
            Locator::Directory(normalize_path(path))
        }
    }

    /// ロケーターをパスへ。固定ウィンドウは呼び出し側が現在のディレクトリで解決する
    pub fn decode(locator: &Locator) -> Option<PathBuf> {
        match locator {
            Locator::Fixed => None,
            Locator::Directory(path) => Some(path.clone()),
        }
    }
}

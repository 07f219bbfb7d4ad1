//! ファイルシステム操作
//!
//! stat / readdir / mkdir などの生操作をトレイトで抽象化し、ローカル実装を提供

use crate::error::{DiredError, Result};
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// ファイル種別ビットのマスク
pub const S_IFMT: u32 = 0o170000;
pub const S_IFSOCK: u32 = 0o140000;
pub const S_IFLNK: u32 = 0o120000;
pub const S_IFREG: u32 = 0o100000;
pub const S_IFBLK: u32 = 0o060000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFCHR: u32 = 0o020000;
pub const S_IFIFO: u32 = 0o010000;

/// stat 結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStat {
    /// 種別ビットを含むモード
    pub mode: u32,
    /// サイズ（バイト）
    pub size: u64,
    /// 所有ユーザーID
    pub uid: u32,
    /// 所有グループID
    pub gid: u32,
    /// 最終更新時刻
    pub modified: SystemTime,
}

impl RawStat {
    pub fn is_dir(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }

    pub fn is_file(&self) -> bool {
        self.mode & S_IFMT == S_IFREG
    }
}

/// ファイルシステム操作のトレイト
pub trait FileSystem {
    /// パスの stat を取得（シンボリックリンクは辿る）
    fn stat(&self, path: &Path) -> Result<RawStat>;

    /// ディレクトリのメンバー名を列挙（`.` / `..` を含まない）
    fn read_dir(&self, path: &Path) -> Result<Vec<String>>;

    /// ディレクトリを一つ作成
    fn mkdir(&self, path: &Path) -> Result<()>;

    /// 途中のディレクトリも含めて作成
    fn create_directories(&self, path: &Path) -> Result<()>;

    /// 空ファイルを作成（既存ファイルは切り詰めない）
    fn write_empty_file(&self, path: &Path) -> Result<()>;

    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// 通常ファイルを複製
    fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;

    fn remove_file(&self, path: &Path) -> Result<()>;

    /// 空ディレクトリを削除
    fn remove_dir(&self, path: &Path) -> Result<()>;

    fn exists(&self, path: &Path) -> bool {
        self.stat(path).is_ok()
    }
}

/// ローカルファイルシステム
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFileSystem {
    fn stat(&self, path: &Path) -> Result<RawStat> {
        let metadata = fs::metadata(path).map_err(|e| DiredError::from_io(e, path))?;
        Ok(raw_stat(&metadata))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<String>> {
        let reader = fs::read_dir(path).map_err(|e| DiredError::from_io(e, path))?;
        let mut names = Vec::new();
        for item in reader {
            let item = item.map_err(|e| DiredError::from_io(e, path))?;
            match item.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => log::warn!("skipping non UTF-8 name {:?} in {}", raw, path.display()),
            }
        }
        Ok(names)
    }

    fn mkdir(&self, path: &Path) -> Result<()> {
        fs::create_dir(path).map_err(|e| DiredError::from_io(e, path))
    }

    fn create_directories(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| DiredError::from_io(e, path))
    }

    fn write_empty_file(&self, path: &Path) -> Result<()> {
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map(|_| ())
            .map_err(|e| DiredError::from_io(e, path))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        fs::rename(from, to).map_err(|e| DiredError::from_io(e, from))
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        fs::copy(from, to)
            .map(|_| ())
            .map_err(|e| DiredError::from_io(e, from))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| DiredError::from_io(e, path))
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        fs::remove_dir(path).map_err(|e| DiredError::from_io(e, path))
    }
}

#[cfg(unix)]
fn raw_stat(metadata: &fs::Metadata) -> RawStat {
    use std::os::unix::fs::MetadataExt;

    RawStat {
        mode: metadata.mode(),
        size: metadata.size(),
        uid: metadata.uid(),
        gid: metadata.gid(),
        modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
    }
}

#[cfg(not(unix))]
fn raw_stat(metadata: &fs::Metadata) -> RawStat {
    // 権限ビットを持たないプラットフォームでは種別と読み取り専用属性から合成する
    let kind = if metadata.is_dir() { S_IFDIR } else { S_IFREG };
    let perms = match (metadata.is_dir(), metadata.permissions().readonly()) {
        (true, _) => 0o755,
        (false, true) => 0o444,
        (false, false) => 0o644,
    };
    RawStat {
        mode: kind | perms,
        size: metadata.len(),
        uid: 0,
        gid: 0,
        modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
    }
}

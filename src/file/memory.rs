//! インメモリファイルシステム
//!
//! 端末やディスクに依存しない検証用の `FileSystem` 実装

use super::io::{FileSystem, RawStat, S_IFDIR, S_IFMT, S_IFREG};
use crate::error::{DiredError, Result};
use crate::file::path::normalize_path;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// 各ノードの状態
#[derive(Debug, Clone)]
struct Node {
    stat: RawStat,
    /// stat を失敗させる（読めないメンバーの再現用）
    broken: bool,
}

/// インメモリファイルシステム
#[derive(Debug)]
pub struct MemoryFileSystem {
    nodes: RefCell<BTreeMap<PathBuf, Node>>,
    /// 書き込みを拒否するディレクトリ
    read_only: RefCell<BTreeSet<PathBuf>>,
    default_modified: SystemTime,
}

impl MemoryFileSystem {
    /// ルート `/` のみを持つファイルシステム
    pub fn new() -> Self {
        let fs = Self {
            nodes: RefCell::new(BTreeMap::new()),
            read_only: RefCell::new(BTreeSet::new()),
            default_modified: SystemTime::UNIX_EPOCH,
        };
        fs.insert(PathBuf::from("/"), fs.dir_stat());
        fs
    }

    /// 新規ノードの更新時刻を指定
    pub fn with_modified(mut self, modified: SystemTime) -> Self {
        self.default_modified = modified;
        self
    }

    /// ディレクトリを追加（親も作成）
    pub fn add_dir(&self, path: impl AsRef<Path>) -> &Self {
        let path = normalize_path(path);
        self.ensure_parents(&path);
        self.insert(path, self.dir_stat());
        self
    }

    /// ファイルを追加（親も作成）
    pub fn add_file(&self, path: impl AsRef<Path>, size: u64) -> &Self {
        let stat = RawStat {
            size,
            ..self.file_stat()
        };
        self.add_with_stat(path, stat)
    }

    /// 任意の stat でノードを追加
    pub fn add_with_stat(&self, path: impl AsRef<Path>, stat: RawStat) -> &Self {
        let path = normalize_path(path);
        self.ensure_parents(&path);
        self.insert(path, stat);
        self
    }

    /// 指定パスの stat を失敗させる
    pub fn break_stat(&self, path: impl AsRef<Path>) -> &Self {
        if let Some(node) = self.nodes.borrow_mut().get_mut(&normalize_path(path)) {
            node.broken = true;
        }
        self
    }

    /// ディレクトリへの書き込みを拒否する
    pub fn deny_writes(&self, dir: impl AsRef<Path>) -> &Self {
        self.read_only.borrow_mut().insert(normalize_path(dir));
        self
    }

    /// 登録されている全パス
    pub fn paths(&self) -> Vec<PathBuf> {
        self.nodes.borrow().keys().cloned().collect()
    }

    fn dir_stat(&self) -> RawStat {
        RawStat {
            mode: S_IFDIR | 0o755,
            size: 4096,
            uid: 0,
            gid: 0,
            modified: self.default_modified,
        }
    }

    fn file_stat(&self) -> RawStat {
        RawStat {
            mode: S_IFREG | 0o644,
            size: 0,
            uid: 0,
            gid: 0,
            modified: self.default_modified,
        }
    }

    fn insert(&self, path: PathBuf, stat: RawStat) {
        self.nodes
            .borrow_mut()
            .insert(path, Node { stat, broken: false });
    }

    fn ensure_parents(&self, path: &Path) {
        let mut missing = Vec::new();
        let mut current = path.parent();
        while let Some(parent) = current {
            if self.nodes.borrow().contains_key(parent) {
                break;
            }
            missing.push(parent.to_path_buf());
            current = parent.parent();
        }
        for dir in missing.into_iter().rev() {
            self.insert(dir, self.dir_stat());
        }
    }

    fn node(&self, path: &Path) -> Option<Node> {
        self.nodes.borrow().get(&normalize_path(path)).cloned()
    }

    fn children(&self, dir: &Path) -> Vec<PathBuf> {
        self.nodes
            .borrow()
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect()
    }

    fn check_writable(&self, path: &Path) -> Result<()> {
        let parent = path.parent().unwrap_or(path);
        if self.read_only.borrow().contains(parent) {
            return Err(DiredError::PermissionDenied {
                path: path.display().to_string(),
            });
        }
        Ok(())
    }

    fn require_parent_dir(&self, path: &Path) -> Result<()> {
        match path.parent().and_then(|p| self.node(p)) {
            Some(node) if node.stat.mode & S_IFMT == S_IFDIR => Ok(()),
            _ => Err(DiredError::NotFound {
                path: path.display().to_string(),
            }),
        }
    }

    fn not_found(path: &Path) -> DiredError {
        DiredError::NotFound {
            path: path.display().to_string(),
        }
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for MemoryFileSystem {
    fn stat(&self, path: &Path) -> Result<RawStat> {
        match self.node(path) {
            Some(node) if !node.broken => Ok(node.stat),
            Some(_) => Err(DiredError::Io {
                path: path.display().to_string(),
                message: "stat failed".to_string(),
            }),
            None => Err(Self::not_found(path)),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<String>> {
        let path = normalize_path(path);
        let node = self.node(&path).ok_or_else(|| Self::not_found(&path))?;
        if node.stat.mode & S_IFMT != S_IFDIR {
            return Err(DiredError::NotADirectory {
                path: path.display().to_string(),
            });
        }
        Ok(self
            .children(&path)
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect())
    }

    fn mkdir(&self, path: &Path) -> Result<()> {
        let path = normalize_path(path);
        if self.node(&path).is_some() {
            return Err(DiredError::AlreadyExists {
                path: path.display().to_string(),
            });
        }
        self.check_writable(&path)?;
        self.require_parent_dir(&path)?;
        self.insert(path, self.dir_stat());
        Ok(())
    }

    fn create_directories(&self, path: &Path) -> Result<()> {
        let path = normalize_path(path);
        match self.node(&path) {
            Some(node) if node.stat.mode & S_IFMT == S_IFDIR => Ok(()),
            Some(_) => Err(DiredError::AlreadyExists {
                path: path.display().to_string(),
            }),
            None => {
                self.check_writable(&path)?;
                self.add_dir(&path);
                Ok(())
            }
        }
    }

    fn write_empty_file(&self, path: &Path) -> Result<()> {
        let path = normalize_path(path);
        if self.node(&path).is_some() {
            return Err(DiredError::AlreadyExists {
                path: path.display().to_string(),
            });
        }
        self.check_writable(&path)?;
        self.require_parent_dir(&path)?;
        self.insert(path, self.file_stat());
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from = normalize_path(from);
        let to = normalize_path(to);
        if self.node(&from).is_none() {
            return Err(Self::not_found(&from));
        }
        self.check_writable(&from)?;
        self.check_writable(&to)?;
        self.require_parent_dir(&to)?;

        let mut nodes = self.nodes.borrow_mut();
        let moved: Vec<PathBuf> = nodes
            .keys()
            .filter(|p| p.starts_with(&from))
            .cloned()
            .collect();
        for old in moved {
            if let Some(node) = nodes.remove(&old) {
                let suffix = old.strip_prefix(&from).unwrap_or(Path::new(""));
                let new_path = if suffix.as_os_str().is_empty() {
                    to.clone()
                } else {
                    to.join(suffix)
                };
                nodes.insert(new_path, node);
            }
        }
        Ok(())
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        let node = self.node(from).ok_or_else(|| Self::not_found(from))?;
        if node.stat.mode & S_IFMT == S_IFDIR {
            return Err(DiredError::unsupported("copy", from));
        }
        let to = normalize_path(to);
        self.check_writable(&to)?;
        self.require_parent_dir(&to)?;
        self.insert(to, node.stat);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let path = normalize_path(path);
        let node = self.node(&path).ok_or_else(|| Self::not_found(&path))?;
        if node.stat.mode & S_IFMT == S_IFDIR {
            return Err(DiredError::Io {
                path: path.display().to_string(),
                message: "is a directory".to_string(),
            });
        }
        self.check_writable(&path)?;
        self.nodes.borrow_mut().remove(&path);
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        let path = normalize_path(path);
        self.node(&path).ok_or_else(|| Self::not_found(&path))?;
        if !self.children(&path).is_empty() {
            return Err(DiredError::Io {
                path: path.display().to_string(),
                message: "directory not empty".to_string(),
            });
        }
        self.check_writable(&path)?;
        self.nodes.borrow_mut().remove(&path);
        Ok(())
    }
}

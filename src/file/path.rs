//! パス処理ユーティリティ
//!
//! 入力パスの展開、正規化、カレントディレクトリ基準の解決

use std::path::{Component, Path, PathBuf};

/// `~` と環境変数を展開
///
/// 展開できない場合（未定義の変数など）は入力をそのまま使う
pub fn expand_path(input: &str) -> PathBuf {
    match shellexpand::full(input) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            log::warn!("could not expand {:?}: {}", input, e);
            PathBuf::from(input)
        }
    }
}

/// `.` と `..` を字句的に解決する（ファイルシステムには触れない）
///
/// ルートを超える `..` はルートに留まる
pub fn normalize_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.as_ref().components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => {
                let at_root = matches!(
                    result.components().next_back(),
                    None | Some(Component::RootDir) | Some(Component::Prefix(_))
                );
                if at_root {
                    if result.as_os_str().is_empty() {
                        result.push("..");
                    }
                } else if result.ends_with("..") {
                    result.push("..");
                } else {
                    result.pop();
                }
            }
            other => result.push(other),
        }
    }

    result
}

/// 相対パスを `base` 基準の絶対パスに変換
pub fn to_absolute<P: AsRef<Path>>(path: P, base: &Path) -> PathBuf {
    let path = path.as_ref();
    if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(base.join(path))
    }
}

/// ユーザー入力をディレクトリ基準で解決（絶対パス・`~` 形式・相対名のいずれも可）
pub fn resolve_in(directory: &Path, input: &str) -> PathBuf {
    to_absolute(expand_path(input), directory)
}

/// 親ディレクトリ（ルートでは `None`）
pub fn parent_dir(path: &Path) -> Option<PathBuf> {
    normalize_path(path).parent().map(Path::to_path_buf)
}

/// プロセスのカレントディレクトリ、取得できなければホームディレクトリ
pub fn initial_directory() -> PathBuf {
    std::env::current_dir()
        .ok()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("/"))
}

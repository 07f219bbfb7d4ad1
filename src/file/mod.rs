//! ファイル操作モジュール
//!
//! - stat / readdir / mkdir などの生操作（`FileSystem` トレイト）
//! - 入力パスの展開と解決
//! - シンボリックリンクは辿る（リンク自体の扱いは対象外）
//! - 権限不足はエラーとして呼び出し側へ返す

pub mod io;
pub mod memory;
pub mod path;

pub use io::{FileSystem, LocalFileSystem, RawStat};
pub use memory::MemoryFileSystem;
pub use path::{expand_path, normalize_path, parent_dir, resolve_in};

//! ユーザー名・グループ名の解決
//!
//! `/etc/passwd` / `/etc/group` 形式（`name:*:id:...`）のレコードを起動時に一度だけ読み込む。
//! セッション中の変更は反映しない（再読み込みの経路はない）。

use std::collections::HashMap;
use std::path::PathBuf;

/// 識別情報の読み込み元
#[derive(Debug, Clone, PartialEq)]
pub struct IdentitySources {
    /// ユーザーデータベースの候補（先に存在したものを使う）
    pub users: Vec<PathBuf>,
    /// グループデータベースの候補
    pub groups: Vec<PathBuf>,
}

impl IdentitySources {
    /// システムのデータベースと、無い環境向けのキャッシュファイル
    pub fn system() -> Self {
        let cache = dirs::cache_dir().map(|dir| dir.join("dired"));
        let mut users = vec![PathBuf::from("/etc/passwd")];
        let mut groups = vec![PathBuf::from("/etc/group")];
        if let Some(cache) = cache {
            users.push(cache.join("passwd"));
            groups.push(cache.join("group"));
        }
        Self { users, groups }
    }
}

/// uid / gid から表示名への解決器
///
/// 構築後は読み取り専用なので、複数のビューから共有してよい
#[derive(Debug, Clone, Default)]
pub struct IdentityResolver {
    users: HashMap<u32, String>,
    groups: HashMap<u32, String>,
}

impl IdentityResolver {
    /// 空の解決器（全て名前なし）
    pub fn empty() -> Self {
        Self::default()
    }

    /// システムのデータベースから構築
    pub fn from_system() -> Self {
        Self::load(&IdentitySources::system())
    }

    /// 読み込み元から構築。どれも読めなければ空のまま
    pub fn load(sources: &IdentitySources) -> Self {
        Self {
            users: read_first(&sources.users),
            groups: read_first(&sources.groups),
        }
    }

    /// レコード文字列から構築
    pub fn from_records(passwd: &str, group: &str) -> Self {
        Self {
            users: parse_records(passwd),
            groups: parse_records(group),
        }
    }

    pub fn username(&self, uid: u32) -> Option<&str> {
        self.users.get(&uid).map(String::as_str)
    }

    pub fn groupname(&self, gid: u32) -> Option<&str> {
        self.groups.get(&gid).map(String::as_str)
    }
}

fn read_first(candidates: &[PathBuf]) -> HashMap<u32, String> {
    for path in candidates {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                log::debug!("identity records from {}", path.display());
                return parse_records(&content);
            }
            Err(e) => log::debug!("{} unavailable: {}", path.display(), e),
        }
    }
    log::warn!("no identity database found; owner names will be blank");
    HashMap::new()
}

/// `name:*:id:...` 形式の行を解析する。コメント行と不正な行は読み飛ばす
///
/// 同じ ID が複数あれば最初のものを使う
fn parse_records(content: &str) -> HashMap<u32, String> {
    let mut map = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.splitn(4, ':');
        let name = fields.next().unwrap_or_default();
        let _password = fields.next();
        let id = fields.next().and_then(|id| id.trim().parse::<u32>().ok());
        if let (false, Some(id)) = (name.is_empty(), id) {
            map.entry(id).or_insert_with(|| name.to_string());
        }
    }
    map
}

//! リスティングバッファ
//!
//! 一つのディレクトリのスナップショットと、その仮想テキスト表現を保持する。
//! 手編集されるまではメモリ上のエントリを正とし、編集後（dirty）はテキストから再解析する。

use super::entry::Entry;
use crate::error::{DiredError, FormatError, Result};
use crate::file::io::FileSystem;
use crate::file::path::normalize_path;
use crate::identity::IdentityResolver;
use std::path::{Path, PathBuf};

/// スナップショット作成時の設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingOptions {
    /// `.` で始まるメンバーを含めるか（`.` / `..` は常に含む）
    pub show_dot_files: bool,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            show_dot_files: true,
        }
    }
}

/// 一つのディレクトリリスティング
#[derive(Debug, Clone, PartialEq)]
pub struct ListingBuffer {
    directory: PathBuf,
    /// スナップショット時のエントリ（dirty でない間のみ正）
    entries: Vec<Entry>,
    /// ヘッダーを除いた本文行
    lines: Vec<String>,
    /// テキストが手編集されたか
    dirty: bool,
}

impl ListingBuffer {
    /// エントリ列から構築
    pub fn from_entries(directory: impl Into<PathBuf>, entries: Vec<Entry>) -> Self {
        let lines = entries.iter().map(Entry::format).collect();
        Self {
            directory: directory.into(),
            entries,
            lines,
            dirty: false,
        }
    }

    /// ディレクトリを列挙してスナップショットを作る
    ///
    /// 並び順は `.`、`..`、残りを名前順。stat に失敗したメンバーは落とす
    pub fn snapshot<F: FileSystem + ?Sized>(
        fs: &F,
        resolver: &IdentityResolver,
        directory: &Path,
        options: ListingOptions,
    ) -> Result<Self> {
        let directory = normalize_path(directory);
        let stat = fs.stat(&directory)?;
        if !stat.is_dir() {
            return Err(DiredError::NotADirectory {
                path: directory.display().to_string(),
            });
        }

        let mut members: Vec<String> = fs
            .read_dir(&directory)?
            .into_iter()
            .filter(|name| options.show_dot_files || !name.starts_with('.'))
            .filter(|name| {
                let printable = !name.contains('\n');
                if !printable {
                    log::warn!("skipping {:?}: name contains a newline", name);
                }
                printable
            })
            .collect();
        members.sort();

        let mut entries = Vec::with_capacity(members.len() + 2);
        for name in [".", ".."].into_iter().chain(members.iter().map(String::as_str)) {
            let path = normalize_path(directory.join(name));
            match fs.stat(&path) {
                Ok(stat) => match Entry::from_stat(&directory, name, &stat, resolver) {
                    Some(entry) => entries.push(entry),
                    None => log::warn!(
                        "dropping {} from listing: modification time out of range",
                        path.display()
                    ),
                },
                Err(e) => log::warn!("dropping {} from listing: {}", path.display(), e),
            }
        }

        log::debug!(
            "listed {} ({} of {} members)",
            directory.display(),
            entries.len(),
            members.len() + 2
        );
        Ok(Self::from_entries(directory, entries))
    }

    /// 編集済みテキストから再構築する（先頭のヘッダー行は読み飛ばす）
    ///
    /// 各行は参照時に解析されるため、解析できない行があっても他の行は使える
    pub fn reparse(directory: impl Into<PathBuf>, text: &str) -> Self {
        Self {
            directory: directory.into(),
            entries: Vec::new(),
            lines: text.lines().skip(1).map(str::to_string).collect(),
            dirty: true,
        }
    }

    /// 手編集されたテキストで置き換える
    pub fn replace_text(&mut self, text: &str) {
        self.lines = text.lines().skip(1).map(str::to_string).collect();
        self.entries.clear();
        self.dirty = true;
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// ヘッダー行
    pub fn header(&self) -> String {
        format!("{}:", self.directory.display())
    }

    /// ヘッダーを含む行数
    pub fn line_count(&self) -> usize {
        self.lines.len() + 1
    }

    /// 仮想ドキュメントのテキスト
    pub fn render(&self) -> String {
        let mut out = self.header();
        for line in &self.lines {
            out.push('\n');
            out.push_str(line);
        }
        out
    }

    /// 指定行のテキスト（0行目はヘッダー）
    pub fn line(&self, index: usize) -> Option<String> {
        match index {
            0 => Some(self.header()),
            i => self.lines.get(i - 1).cloned(),
        }
    }

    /// 行番号からエントリを得る。ヘッダーや範囲外は `None`
    pub fn entry_at(&self, line: usize) -> std::result::Result<Option<Entry>, FormatError> {
        if line == 0 || line > self.lines.len() {
            return Ok(None);
        }
        if !self.dirty {
            return Ok(self.entries.get(line - 1).cloned());
        }
        Entry::parse(&self.directory, &self.lines[line - 1]).map(Some)
    }

    /// 全エントリ。編集済みで解析できない行は読み飛ばす
    pub fn entries(&self) -> Vec<Entry> {
        if !self.dirty {
            return self.entries.clone();
        }
        self.lines
            .iter()
            .enumerate()
            .filter_map(|(i, line)| match Entry::parse(&self.directory, line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("line {} of {} is unparsable: {}", i + 1, self.directory.display(), e);
                    None
                }
            })
            .collect()
    }

    /// 選択中のエントリ
    pub fn selected_entries(&self) -> Vec<Entry> {
        self.entries()
            .into_iter()
            .filter(Entry::is_selected)
            .collect()
    }

    /// 行範囲 `[start, end)` の選択状態を設定する
    ///
    /// `allow_dot_entries` が偽なら `.` / `..` の行は変更しない。
    /// 解析できない行が一つでもあれば何も変更せずにエラーを返す。
    /// 戻り値は書き換えた行数。
    pub fn set_selection_range(
        &mut self,
        start: usize,
        end: usize,
        value: bool,
        allow_dot_entries: bool,
    ) -> std::result::Result<usize, FormatError> {
        let (start, end) = self.clamp(start, end);
        let mut updates = Vec::new();

        for line in start..end {
            let mut entry = match self.entry_at(line)? {
                Some(entry) => entry,
                None => continue,
            };
            if entry.is_dot() && !allow_dot_entries {
                continue;
            }
            entry.set_selected(value);
            updates.push((line - 1, entry));
        }

        // 全行の解析が済んでから反映する
        let changed = updates.len();
        for (index, entry) in updates {
            self.lines[index] = entry.format();
            if !self.dirty {
                self.entries[index] = entry;
            }
        }
        Ok(changed)
    }

    /// 範囲内の対象行が全て選択済みか（対象が無ければ偽）
    pub fn all_selected(
        &self,
        start: usize,
        end: usize,
        allow_dot_entries: bool,
    ) -> std::result::Result<bool, FormatError> {
        let (start, end) = self.clamp(start, end);
        let mut any = false;
        for line in start..end {
            if let Some(entry) = self.entry_at(line)? {
                if entry.is_dot() && !allow_dot_entries {
                    continue;
                }
                if !entry.is_selected() {
                    return Ok(false);
                }
                any = true;
            }
        }
        Ok(any)
    }

    fn clamp(&self, start: usize, end: usize) -> (usize, usize) {
        let start = start.max(1);
        let end = end.min(self.line_count());
        (start, end.max(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::io::{RawStat, S_IFREG};
    use crate::file::memory::MemoryFileSystem;
    use crate::listing::entry::ModifiedAt;
    use std::time::{Duration, SystemTime};

    fn listing() -> ListingBuffer {
        let fs = MemoryFileSystem::new();
        fs.add_file("/tmp/d/a.txt", 42).add_dir("/tmp/d/b");
        ListingBuffer::snapshot(
            &fs,
            &IdentityResolver::empty(),
            Path::new("/tmp/d"),
            ListingOptions::default(),
        )
        .unwrap()
    }

    fn names(buffer: &ListingBuffer) -> Vec<String> {
        buffer.entries().iter().map(|e| e.name().to_string()).collect()
    }

    #[test]
    fn snapshot_orders_dot_entries_first() {
        let buffer = listing();
        assert_eq!(names(&buffer), vec![".", "..", "a.txt", "b"]);
        assert!(!buffer.is_dirty());
    }

    #[test]
    fn render_starts_with_header() {
        let text = listing().render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "/tmp/d:");
        assert_eq!(lines.len(), 5);
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn unstatable_members_are_dropped() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/d/ok", 1)
            .add_file("/d/ghost", 1)
            .add_file("/d/zz", 1)
            .break_stat("/d/ghost");

        let buffer = ListingBuffer::snapshot(
            &fs,
            &IdentityResolver::empty(),
            Path::new("/d"),
            ListingOptions::default(),
        )
        .unwrap();
        assert_eq!(names(&buffer), vec![".", "..", "ok", "zz"]);
    }

    #[test]
    fn member_with_out_of_range_mtime_is_dropped() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/d/ok", 1).add_with_stat(
            "/d/future",
            RawStat {
                mode: S_IFREG | 0o644,
                size: 1,
                uid: 0,
                gid: 0,
                modified: SystemTime::UNIX_EPOCH + Duration::from_secs(10_000_000_000_000),
            },
        );

        let buffer = ListingBuffer::snapshot(
            &fs,
            &IdentityResolver::empty(),
            Path::new("/d"),
            ListingOptions::default(),
        )
        .unwrap();
        assert_eq!(names(&buffer), vec![".", "..", "ok"]);
    }

    #[test]
    fn hidden_members_can_be_filtered() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/d/.hidden", 1).add_file("/d/shown", 1);

        let buffer = ListingBuffer::snapshot(
            &fs,
            &IdentityResolver::empty(),
            Path::new("/d"),
            ListingOptions {
                show_dot_files: false,
            },
        )
        .unwrap();
        assert_eq!(names(&buffer), vec![".", "..", "shown"]);
    }

    #[test]
    fn snapshot_of_file_is_not_a_directory() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/d/file", 1);
        let result = ListingBuffer::snapshot(
            &fs,
            &IdentityResolver::empty(),
            Path::new("/d/file"),
            ListingOptions::default(),
        );
        assert!(matches!(result, Err(DiredError::NotADirectory { .. })));
    }

    #[test]
    fn entry_at_maps_lines() {
        let buffer = listing();
        assert_eq!(buffer.entry_at(0).unwrap(), None);
        assert_eq!(buffer.entry_at(1).unwrap().unwrap().name(), ".");
        assert_eq!(buffer.entry_at(3).unwrap().unwrap().name(), "a.txt");
        assert_eq!(buffer.entry_at(99).unwrap(), None);
    }

    #[test]
    fn selection_range_skips_dot_entries() {
        let mut buffer = listing();
        let changed = buffer.set_selection_range(0, buffer.line_count(), true, false).unwrap();
        assert_eq!(changed, 2);

        let text = buffer.render();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[1].starts_with(' '));
        assert!(lines[2].starts_with(' '));
        assert!(lines[3].starts_with('*'));
        assert!(lines[4].starts_with('*'));
        assert_eq!(buffer.selected_entries().len(), 2);
    }

    #[test]
    fn selection_range_is_idempotent() {
        let mut once = listing();
        once.set_selection_range(2, 4, true, false).unwrap();
        let mut twice = once.clone();
        twice.set_selection_range(2, 4, true, false).unwrap();
        assert_eq!(once.render(), twice.render());
    }

    #[test]
    fn single_line_on_dot_entry_with_allowance() {
        let mut buffer = listing();
        buffer.set_selection_range(2, 3, true, true).unwrap();
        assert!(buffer.entry_at(2).unwrap().unwrap().is_selected());
    }

    #[test]
    fn reparse_reads_edited_text() {
        let original = listing();
        let mut buffer = ListingBuffer::reparse("/tmp/d", &original.render());
        assert!(buffer.is_dirty());
        assert_eq!(buffer.entries(), original.entries());

        buffer.set_selection_range(3, 4, true, false).unwrap();
        assert!(buffer.entry_at(3).unwrap().unwrap().is_selected());
    }

    #[test]
    fn unparsable_line_aborts_whole_range() {
        let good = Entry::new("/d", "good", "-rw-r--r--", "u", "g", 1, ModifiedAt::new(1, 1, 1, 1));
        let text = format!("/d:\n{}\ngarbage line", good.format());
        let mut buffer = ListingBuffer::reparse("/d", &text);

        assert!(buffer.set_selection_range(1, 3, true, false).is_err());
        assert_eq!(buffer.render(), text);

        // 壊れた行以外は引き続き使える
        assert_eq!(buffer.entries().len(), 1);
        assert!(buffer.entry_at(2).is_err());
        assert_eq!(buffer.set_selection_range(1, 2, true, false).unwrap(), 1);
    }
}

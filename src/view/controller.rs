//! ビューコントローラー
//!
//! 「現在のディレクトリ」を中心とした状態遷移と、ファイル操作の実行。
//! カーソル位置は表示側から行番号として受け取り、エディタには依存しない。

use super::notifier::{ChangeNotifier, ListenerId, ListingEvent, ListingListener};
use crate::config::DiredConfig;
use crate::error::{DiredError, Result};
use crate::file::io::FileSystem;
use crate::file::path::{normalize_path, parent_dir, resolve_in};
use crate::identity::IdentityResolver;
use crate::listing::{Entry, ListingBuffer, ListingOptions};
use crate::location::{LocationCodec, Locator};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 行範囲 `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// 表示側から渡されるカーソル状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// カーソル行（0 はヘッダー）
    pub line: usize,
    /// テキスト選択範囲
    pub selection: Option<LineRange>,
}

impl Cursor {
    pub fn at(line: usize) -> Self {
        Self {
            line,
            selection: None,
        }
    }

    pub fn with_selection(line: usize, range: LineRange) -> Self {
        Self {
            line,
            selection: Some(range),
        }
    }
}

/// ビューの動作設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub fixed_window: bool,
    pub show_dot_files: bool,
    pub allow_select_dot: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            fixed_window: false,
            show_dot_files: true,
            allow_select_dot: false,
        }
    }
}

impl From<&DiredConfig> for ViewOptions {
    fn from(config: &DiredConfig) -> Self {
        Self {
            fixed_window: config.fixed_window,
            show_dot_files: config.show_dot_files,
            allow_select_dot: config.allow_select_dot,
        }
    }
}

/// Enter の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnterOutcome {
    /// ディレクトリを開いた
    Opened(Locator),
    /// ファイルなので表示側に委ねる
    File(PathBuf),
}

/// CreateFile の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateFileOutcome {
    Created(PathBuf),
    /// 既存のディレクトリだったので開いた
    OpenedDirectory(Locator),
    /// 既存のファイル（何もしない）
    Existing(PathBuf),
}

/// Delete の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(PathBuf),
    Cancelled,
}

/// ディレクトリビューのコントローラー
pub struct ViewController<F: FileSystem> {
    fs: F,
    resolver: Arc<IdentityResolver>,
    /// 構築時に決まり、以後変わらない
    fixed_window: bool,
    show_dot_files: bool,
    allow_select_dot: bool,
    current: Option<PathBuf>,
    listing: Option<ListingBuffer>,
    notifier: ChangeNotifier,
}

impl<F: FileSystem> ViewController<F> {
    /// 未オープン状態で作成
    pub fn new(fs: F, resolver: Arc<IdentityResolver>, options: ViewOptions) -> Self {
        Self {
            fs,
            resolver,
            fixed_window: options.fixed_window,
            show_dot_files: options.show_dot_files,
            allow_select_dot: options.allow_select_dot,
            current: None,
            listing: None,
            notifier: ChangeNotifier::new(),
        }
    }

    pub fn file_system(&self) -> &F {
        &self.fs
    }

    pub fn is_fixed_window(&self) -> bool {
        self.fixed_window
    }

    pub fn shows_dot_files(&self) -> bool {
        self.show_dot_files
    }

    pub fn current_directory(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    pub fn listing(&self) -> Option<&ListingBuffer> {
        self.listing.as_ref()
    }

    /// 現在のディレクトリのロケーター
    pub fn locator(&self) -> Option<Locator> {
        self.current
            .as_deref()
            .map(|dir| LocationCodec::encode(dir, self.fixed_window))
    }

    /// 変更通知を購読
    pub fn subscribe(&mut self, listener: Box<dyn ListingListener>) -> ListenerId {
        self.notifier.add_listener(listener)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.notifier.remove_listener(id)
    }

    /// ディレクトリを開く。失敗した場合は現在の状態を変えない
    pub fn open(&mut self, path: &Path) -> Result<Locator> {
        let path = match &self.current {
            Some(current) if path.is_relative() => normalize_path(current.join(path)),
            _ => normalize_path(path),
        };
        let listing = ListingBuffer::snapshot(&self.fs, &self.resolver, &path, self.listing_options())?;

        log::debug!("opened {}", path.display());
        self.current = Some(path);
        self.listing = Some(listing);

        let locator = self.require_locator()?;
        self.notifier.notify(ListingEvent::Opened {
            locator: locator.clone(),
        });
        Ok(locator)
    }

    /// 現在のディレクトリを読み直す。選択状態は引き継がない
    pub fn refresh(&mut self) -> Result<Locator> {
        let current = self.require_current()?.to_path_buf();
        self.open(&current)
    }

    /// 親ディレクトリへ移動。ルートでは何もしない
    pub fn go_up(&mut self) -> Result<Option<Locator>> {
        let current = self.require_current()?.to_path_buf();
        match parent_dir(&current) {
            Some(parent) => self.open(&parent).map(Some),
            None => Ok(None),
        }
    }

    /// カーソル位置のエントリに入る
    pub fn enter(&mut self, cursor: &Cursor) -> Result<EnterOutcome> {
        let entry = self.entry_at(cursor.line)?;
        if entry.is_directory() {
            self.open(&entry.path()).map(EnterOutcome::Opened)
        } else {
            Ok(EnterOutcome::File(entry.path()))
        }
    }

    /// 行番号からエントリを得る
    pub fn entry_at(&self, line: usize) -> Result<Entry> {
        let listing = self.listing.as_ref().ok_or(DiredError::NotOpened)?;
        listing.entry_at(line)?.ok_or(DiredError::NoEntryAtCursor)
    }

    /// 選択中のエントリ
    pub fn selected_entries(&self) -> Vec<Entry> {
        self.listing
            .as_ref()
            .map(ListingBuffer::selected_entries)
            .unwrap_or_default()
    }

    /// ディレクトリを作成
    pub fn create_directory(&mut self, name: &str) -> Result<PathBuf> {
        let target = resolve_in(self.require_current()?, name);
        self.fs.mkdir(&target)?;
        log::info!("created directory {}", target.display());
        self.refresh()?;
        Ok(target)
    }

    /// ファイルを作成。既存のディレクトリなら開き、既存のファイルには触れない
    pub fn create_file(&mut self, input: &str) -> Result<CreateFileOutcome> {
        let target = resolve_in(self.require_current()?, input);
        match self.fs.stat(&target) {
            Ok(stat) if stat.is_dir() => {
                return self.open(&target).map(CreateFileOutcome::OpenedDirectory)
            }
            Ok(_) => return Ok(CreateFileOutcome::Existing(target)),
            Err(DiredError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let created = self.missing_ancestors(&target);
        if let Some(parent) = target.parent() {
            self.fs.create_directories(parent)?;
        }
        if let Err(e) = self.fs.write_empty_file(&target) {
            self.remove_created(&created);
            return Err(e);
        }
        log::info!("created file {}", target.display());
        self.refresh()?;
        Ok(CreateFileOutcome::Created(target))
    }

    /// 存在しない祖先ディレクトリ（深い順）
    fn missing_ancestors(&self, target: &Path) -> Vec<PathBuf> {
        target
            .ancestors()
            .skip(1)
            .take_while(|dir| !self.fs.exists(dir))
            .map(Path::to_path_buf)
            .collect()
    }

    /// 途中で作ったディレクトリを深い順に片付ける
    fn remove_created(&self, created: &[PathBuf]) {
        for dir in created {
            if let Err(e) = self.fs.remove_dir(dir) {
                log::warn!("could not remove {}: {}", dir.display(), e);
                break;
            }
        }
    }

    /// カーソル位置のエントリの名前を変更
    pub fn rename(&mut self, cursor: &Cursor, new_name: &str) -> Result<PathBuf> {
        let entry = self.mutable_entry(cursor.line, "rename")?;
        let target = self.vacant_target(new_name)?;
        self.fs.rename(&entry.path(), &target)?;
        log::info!("renamed {} to {}", entry.path().display(), target.display());
        self.refresh()?;
        Ok(target)
    }

    /// カーソル位置のファイルを複製
    pub fn copy(&mut self, cursor: &Cursor, new_name: &str) -> Result<PathBuf> {
        let entry = self.mutable_entry(cursor.line, "copy")?;
        if entry.is_directory() {
            return Err(DiredError::unsupported("copy", &entry.path()));
        }
        let target = self.vacant_target(new_name)?;
        self.fs.copy_file(&entry.path(), &target)?;
        log::info!("copied {} to {}", entry.path().display(), target.display());
        self.refresh()?;
        Ok(target)
    }

    /// カーソル位置のエントリを削除。`confirm` が偽を返せば何もしない
    pub fn delete<C>(&mut self, cursor: &Cursor, confirm: C) -> Result<DeleteOutcome>
    where
        C: FnOnce(&Entry) -> bool,
    {
        let entry = self.mutable_entry(cursor.line, "delete")?;
        if !confirm(&entry) {
            return Ok(DeleteOutcome::Cancelled);
        }

        let path = entry.path();
        if entry.is_directory() {
            self.fs.remove_dir(&path)?;
        } else {
            self.fs.remove_file(&path)?;
        }
        log::info!("deleted {}", path.display());
        self.refresh()?;
        Ok(DeleteOutcome::Deleted(path))
    }

    /// カーソル行（または選択範囲）の選択を反転する
    ///
    /// 範囲内が全て選択済みなら解除し、そうでなければ全て選択する
    pub fn toggle_selection(&mut self, cursor: &Cursor) -> Result<usize> {
        let (start, end, allow_dot) = self.selection_span(cursor)?;
        let listing = self.listing.as_ref().ok_or(DiredError::NotOpened)?;
        let value = !listing.all_selected(start, end, allow_dot)?;
        self.apply_selection(start, end, value, allow_dot)
    }

    /// カーソル行（または選択範囲）を選択
    pub fn select(&mut self, cursor: &Cursor) -> Result<usize> {
        let (start, end, allow_dot) = self.selection_span(cursor)?;
        self.apply_selection(start, end, true, allow_dot)
    }

    /// カーソル行（または選択範囲）の選択を解除
    pub fn unselect(&mut self, cursor: &Cursor) -> Result<usize> {
        let (start, end, allow_dot) = self.selection_span(cursor)?;
        self.apply_selection(start, end, false, allow_dot)
    }

    /// `.` で始まるファイルの表示を切り替えて読み直す
    pub fn toggle_dot_files(&mut self) -> Result<Locator> {
        self.show_dot_files = !self.show_dot_files;
        let result = self.refresh();
        if result.is_err() {
            self.show_dot_files = !self.show_dot_files;
        }
        result
    }

    /// ロケーターに対応するテキストを返す
    pub fn provide_text(&self, locator: &Locator) -> Result<String> {
        let directory = match LocationCodec::decode(locator) {
            Some(directory) => directory,
            None => self.require_current()?.to_path_buf(),
        };
        match (&self.current, &self.listing) {
            (Some(current), Some(listing)) if *current == directory => Ok(listing.render()),
            _ => ListingBuffer::snapshot(&self.fs, &self.resolver, &directory, self.listing_options())
                .map(|listing| listing.render()),
        }
    }

    /// 手編集されたテキストを反映する
    pub fn apply_edit(&mut self, text: &str) -> Result<()> {
        let listing = self.listing.as_mut().ok_or(DiredError::NotOpened)?;
        listing.replace_text(text);
        let locator = self.require_locator()?;
        self.notifier.notify(ListingEvent::Edited { locator });
        Ok(())
    }

    /// リスティングと購読を解放する
    pub fn dispose(&mut self) {
        self.listing = None;
        self.current = None;
        self.notifier.notify(ListingEvent::Closed);
        self.notifier.clear();
    }

    fn listing_options(&self) -> ListingOptions {
        ListingOptions {
            show_dot_files: self.show_dot_files,
        }
    }

    fn require_current(&self) -> Result<&Path> {
        self.current.as_deref().ok_or(DiredError::NotOpened)
    }

    fn require_locator(&self) -> Result<Locator> {
        self.locator().ok_or(DiredError::NotOpened)
    }

    /// 変更操作の対象。`.` / `..` は対象外
    fn mutable_entry(&self, line: usize, operation: &str) -> Result<Entry> {
        let entry = self.entry_at(line)?;
        if entry.is_dot() {
            return Err(DiredError::unsupported(operation, &entry.path()));
        }
        Ok(entry)
    }

    /// 上書きしない作成先
    fn vacant_target(&self, name: &str) -> Result<PathBuf> {
        let target = resolve_in(self.require_current()?, name);
        if self.fs.exists(&target) {
            return Err(DiredError::AlreadyExists {
                path: target.display().to_string(),
            });
        }
        Ok(target)
    }

    /// 操作対象の行範囲と、`.` / `..` を含めるか
    ///
    /// カーソル一行の操作は `.` / `..` も対象にし、一括操作は設定に従う
    fn selection_span(&self, cursor: &Cursor) -> Result<(usize, usize, bool)> {
        let listing = self.listing.as_ref().ok_or(DiredError::NotOpened)?;
        if let Some(range) = cursor.selection {
            return Ok((range.start, range.end, self.allow_select_dot));
        }
        match cursor.line {
            0 => Ok((1, listing.line_count(), self.allow_select_dot)),
            line if line < listing.line_count() => Ok((line, line + 1, true)),
            _ => Err(DiredError::NoEntryAtCursor),
        }
    }

    fn apply_selection(&mut self, start: usize, end: usize, value: bool, allow_dot: bool) -> Result<usize> {
        let listing = self.listing.as_mut().ok_or(DiredError::NotOpened)?;
        let lines = listing.set_selection_range(start, end, value, allow_dot)?;
        let locator = self.require_locator()?;
        self.notifier
            .notify(ListingEvent::SelectionChanged { locator, lines });
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::memory::MemoryFileSystem;
    use crate::view::notifier::ChannelListener;

    fn controller() -> ViewController<MemoryFileSystem> {
        let fs = MemoryFileSystem::new();
        fs.add_file("/tmp/d/a.txt", 42)
            .add_dir("/tmp/d/b")
            .add_file("/tmp/d/c", 7);
        let mut view = ViewController::new(fs, Arc::new(IdentityResolver::empty()), ViewOptions::default());
        view.open(Path::new("/tmp/d")).unwrap();
        view
    }

    fn names(view: &ViewController<MemoryFileSystem>) -> Vec<String> {
        view.listing()
            .unwrap()
            .entries()
            .iter()
            .map(|e| e.name().to_string())
            .collect()
    }

    fn text(view: &ViewController<MemoryFileSystem>) -> String {
        view.listing().unwrap().render()
    }

    #[test]
    fn starts_unopened() {
        let view = ViewController::new(
            MemoryFileSystem::new(),
            Arc::new(IdentityResolver::empty()),
            ViewOptions::default(),
        );
        assert!(view.current_directory().is_none());
        assert_eq!(view.entry_at(1), Err(DiredError::NotOpened));
    }

    #[test]
    fn open_file_keeps_current_directory() {
        let mut view = controller();
        let before = text(&view);
        let result = view.open(Path::new("/tmp/d/a.txt"));
        assert!(matches!(result, Err(DiredError::NotADirectory { .. })));
        assert_eq!(view.current_directory(), Some(Path::new("/tmp/d")));
        assert_eq!(text(&view), before);
    }

    #[test]
    fn enter_directory_and_file() {
        let mut view = controller();
        let outcome = view.enter(&Cursor::at(4)).unwrap();
        assert_eq!(outcome, EnterOutcome::Opened(Locator::Directory(PathBuf::from("/tmp/d/b"))));

        view.open(Path::new("/tmp/d")).unwrap();
        let outcome = view.enter(&Cursor::at(3)).unwrap();
        assert_eq!(outcome, EnterOutcome::File(PathBuf::from("/tmp/d/a.txt")));
        assert_eq!(view.current_directory(), Some(Path::new("/tmp/d")));
    }

    #[test]
    fn enter_on_header_has_no_entry() {
        let mut view = controller();
        assert_eq!(view.enter(&Cursor::at(0)), Err(DiredError::NoEntryAtCursor));
    }

    #[test]
    fn enter_dot_dot_goes_to_parent() {
        let mut view = controller();
        view.enter(&Cursor::at(2)).unwrap();
        assert_eq!(view.current_directory(), Some(Path::new("/tmp")));
    }

    #[test]
    fn go_up_is_noop_at_root() {
        let mut view = controller();
        view.open(Path::new("/")).unwrap();
        assert_eq!(view.go_up().unwrap(), None);
        assert_eq!(view.current_directory(), Some(Path::new("/")));
    }

    #[test]
    fn refresh_resets_selection() {
        let mut view = controller();
        view.select(&Cursor::at(3)).unwrap();
        assert_eq!(view.selected_entries().len(), 1);
        view.refresh().unwrap();
        assert!(view.selected_entries().is_empty());
    }

    #[test]
    fn create_directory_conflict_leaves_buffer() {
        let mut view = controller();
        let before = text(&view);
        let result = view.create_directory("b");
        assert!(matches!(result, Err(DiredError::AlreadyExists { .. })));
        assert_eq!(text(&view), before);
    }

    #[test]
    fn create_directory_refreshes_listing() {
        let mut view = controller();
        view.create_directory("new").unwrap();
        assert!(names(&view).contains(&"new".to_string()));
    }

    #[test]
    fn create_file_makes_parents() {
        let mut view = controller();
        let outcome = view.create_file("x/y.txt").unwrap();
        assert_eq!(outcome, CreateFileOutcome::Created(PathBuf::from("/tmp/d/x/y.txt")));
        assert!(view.file_system().stat(Path::new("/tmp/d/x")).unwrap().is_dir());
        assert!(names(&view).contains(&"x".to_string()));
    }

    #[test]
    fn failed_create_file_removes_new_parents() {
        let mut view = controller();
        view.file_system().deny_writes("/tmp/d/x/y");
        let before = view.listing().unwrap().render();

        assert!(matches!(
            view.create_file("x/y/z.txt"),
            Err(DiredError::PermissionDenied { .. })
        ));
        assert!(!view.file_system().exists(Path::new("/tmp/d/x")));
        assert!(view.file_system().exists(Path::new("/tmp/d")));
        assert_eq!(view.listing().unwrap().render(), before);
    }

    #[test]
    fn create_file_on_existing_targets() {
        let mut view = controller();
        assert_eq!(
            view.create_file("a.txt").unwrap(),
            CreateFileOutcome::Existing(PathBuf::from("/tmp/d/a.txt"))
        );
        assert_eq!(view.file_system().stat(Path::new("/tmp/d/a.txt")).unwrap().size, 42);

        let outcome = view.create_file("/tmp/d/b").unwrap();
        assert!(matches!(outcome, CreateFileOutcome::OpenedDirectory(_)));
        assert_eq!(view.current_directory(), Some(Path::new("/tmp/d/b")));
    }

    #[test]
    fn rename_refuses_to_overwrite() {
        let mut view = controller();
        assert!(matches!(
            view.rename(&Cursor::at(3), "c"),
            Err(DiredError::AlreadyExists { .. })
        ));

        let target = view.rename(&Cursor::at(3), "renamed.txt").unwrap();
        assert_eq!(target, PathBuf::from("/tmp/d/renamed.txt"));
        assert!(!names(&view).contains(&"a.txt".to_string()));
    }

    #[test]
    fn copy_rejects_directories() {
        let mut view = controller();
        assert!(matches!(
            view.copy(&Cursor::at(4), "b2"),
            Err(DiredError::Unsupported { .. })
        ));
        view.copy(&Cursor::at(3), "a2.txt").unwrap();
        assert_eq!(view.file_system().stat(Path::new("/tmp/d/a2.txt")).unwrap().size, 42);
    }

    #[test]
    fn dot_entries_are_not_mutable() {
        let mut view = controller();
        assert!(matches!(
            view.rename(&Cursor::at(1), "x"),
            Err(DiredError::Unsupported { .. })
        ));
        assert!(matches!(
            view.delete(&Cursor::at(2), |_| true),
            Err(DiredError::Unsupported { .. })
        ));
    }

    #[test]
    fn delete_requires_confirmation() {
        let mut view = controller();
        assert_eq!(view.delete(&Cursor::at(5), |_| false).unwrap(), DeleteOutcome::Cancelled);
        assert!(names(&view).contains(&"c".to_string()));

        let outcome = view.delete(&Cursor::at(5), |entry| entry.name() == "c").unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted(PathBuf::from("/tmp/d/c")));
        assert!(!names(&view).contains(&"c".to_string()));
    }

    #[test]
    fn header_selects_all_but_dot_entries() {
        let mut view = controller();
        assert_eq!(view.select(&Cursor::at(0)).unwrap(), 3);
        let selected: Vec<String> = view.selected_entries().iter().map(|e| e.name().to_string()).collect();
        assert_eq!(selected, vec!["a.txt", "b", "c"]);

        assert_eq!(view.toggle_selection(&Cursor::at(0)).unwrap(), 3);
        assert!(view.selected_entries().is_empty());
    }

    #[test]
    fn single_line_selects_dot_entry() {
        let mut view = controller();
        view.toggle_selection(&Cursor::at(1)).unwrap();
        assert_eq!(view.selected_entries()[0].name(), ".");
    }

    #[test]
    fn allow_select_dot_includes_dot_entries_in_bulk() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/d/a", 1);
        let options = ViewOptions {
            allow_select_dot: true,
            ..ViewOptions::default()
        };
        let mut view = ViewController::new(fs, Arc::new(IdentityResolver::empty()), options);
        view.open(Path::new("/d")).unwrap();
        assert_eq!(view.select(&Cursor::at(0)).unwrap(), 3);
    }

    #[test]
    fn range_selection_uses_text_selection() {
        let mut view = controller();
        let cursor = Cursor::with_selection(4, LineRange::new(1, 5));
        assert_eq!(view.select(&cursor).unwrap(), 2);
        assert_eq!(view.unselect(&cursor).unwrap(), 2);
        assert!(view.selected_entries().is_empty());
    }

    #[test]
    fn selection_notifies_once() {
        let mut view = controller();
        let (listener, events) = ChannelListener::new();
        view.subscribe(Box::new(listener));

        view.select(&Cursor::at(0)).unwrap();
        let received: Vec<ListingEvent> = events.try_iter().collect();
        assert_eq!(received.len(), 1);
        assert!(matches!(received[0], ListingEvent::SelectionChanged { lines: 3, .. }));
    }

    #[test]
    fn edited_text_drives_selection() {
        let mut view = controller();
        let edited = text(&view).replace("  -rw-r--r--", "* -rw-r--r--");
        view.apply_edit(&edited).unwrap();
        assert!(view.listing().unwrap().is_dirty());
        assert_eq!(view.selected_entries().len(), 2);
    }

    #[test]
    fn broken_edit_is_reported_not_fatal() {
        let mut view = controller();
        let mut lines: Vec<String> = text(&view).lines().map(str::to_string).collect();
        lines[3] = "garbage".to_string();
        view.apply_edit(&lines.join("\n")).unwrap();

        assert!(matches!(view.enter(&Cursor::at(3)), Err(DiredError::Format(_))));
        assert!(view.select(&Cursor::at(5)).is_ok());
    }

    #[test]
    fn toggle_dot_files_hides_hidden_members() {
        let fs = MemoryFileSystem::new();
        fs.add_file("/d/.rc", 1).add_file("/d/visible", 1);
        let mut view = ViewController::new(fs, Arc::new(IdentityResolver::empty()), ViewOptions::default());
        view.open(Path::new("/d")).unwrap();
        assert_eq!(view.listing().unwrap().line_count(), 5);

        view.toggle_dot_files().unwrap();
        assert!(!view.shows_dot_files());
        assert_eq!(view.listing().unwrap().line_count(), 4);
    }

    #[test]
    fn fixed_window_uses_one_locator() {
        let fs = MemoryFileSystem::new();
        fs.add_dir("/a").add_dir("/b");
        let options = ViewOptions {
            fixed_window: true,
            ..ViewOptions::default()
        };
        let mut view = ViewController::new(fs, Arc::new(IdentityResolver::empty()), options);
        let first = view.open(Path::new("/a")).unwrap();
        let second = view.open(Path::new("/b")).unwrap();
        assert_eq!(first, Locator::Fixed);
        assert_eq!(first, second);
        assert!(view.provide_text(&Locator::Fixed).unwrap().starts_with("/b:"));
    }

    #[test]
    fn provide_text_for_other_directory() {
        let view = controller();
        let text = view
            .provide_text(&Locator::Directory(PathBuf::from("/tmp/d/b")))
            .unwrap();
        assert_eq!(text.lines().next(), Some("/tmp/d/b:"));
    }

    #[test]
    fn dispose_releases_state() {
        let mut view = controller();
        let (listener, events) = ChannelListener::new();
        view.subscribe(Box::new(listener));
        view.dispose();

        assert!(view.listing().is_none());
        assert_eq!(events.try_recv().unwrap(), ListingEvent::Closed);
        assert_eq!(view.refresh(), Err(DiredError::NotOpened));
    }
}

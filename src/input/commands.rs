//! コマンドシステム
//!
//! dired コマンドの定義と実行。カーソルとマークはここで保持し、
//! 名前の入力や削除の確認は `Prompter` に委ねる。

use crate::error::{DiredError, Notice, Result};
use crate::file::io::FileSystem;
use crate::file::path::{expand_path, initial_directory, to_absolute};
use crate::view::{
    CreateFileOutcome, Cursor, DeleteOutcome, EnterOutcome, LineRange, ViewController,
};
use std::path::{Path, PathBuf};

/// 名前入力と確認の窓口
pub trait Prompter {
    /// 一行入力。キャンセルされたら `None`
    fn read_input(&mut self, prompt: &str, initial: &str) -> Option<String>;

    /// y/n 確認
    fn confirm(&mut self, message: &str) -> bool;

    /// 一覧のテキスト全体を編集させる。キャンセルされたら `None`
    fn edit_text(&mut self, text: &str) -> Result<Option<String>>;
}

/// コマンド実行の結果
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    /// 実行が成功したか
    pub success: bool,
    /// 結果メッセージ
    pub message: Option<String>,
    /// 画面更新が必要か
    pub needs_refresh: bool,
    /// セッションを終了するか
    pub should_quit: bool,
    /// 表示側で開くべきファイル
    pub file: Option<PathBuf>,
}

impl CommandResult {
    /// 成功結果を作成
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
            needs_refresh: true,
            should_quit: false,
            file: None,
        }
    }

    /// メッセージ付き成功結果を作成
    pub fn success_with_message(message: String) -> Self {
        Self {
            message: Some(message),
            ..Self::success()
        }
    }

    /// 画面更新なしの成功結果を作成
    pub fn success_no_refresh() -> Self {
        Self {
            needs_refresh: false,
            ..Self::success()
        }
    }

    /// エラー結果を作成
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            message: Some(message),
            needs_refresh: false,
            should_quit: false,
            file: None,
        }
    }

    /// エラー型から作成
    pub fn from_error(error: &DiredError) -> Self {
        Self::error(Notice::from_error(error).message)
    }

    /// 入力がキャンセルされた
    pub fn cancelled() -> Self {
        Self {
            needs_refresh: false,
            ..Self::success_with_message("キャンセルしました".to_string())
        }
    }

    /// 終了結果を作成
    pub fn quit() -> Self {
        Self {
            should_quit: true,
            needs_refresh: false,
            ..Self::success()
        }
    }

    /// ファイルを表示側へ渡す
    pub fn open_file(path: PathBuf) -> Self {
        Self {
            message: Some(format!("ファイルを開きます: {}", path.display())),
            file: Some(path),
            ..Self::success()
        }
    }
}

/// コマンドの種類
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // ディレクトリ移動
    Open,
    Enter,
    GoUp,
    Refresh,

    // ファイル操作
    CreateDirectory,
    CreateFile,
    Rename,
    Copy,
    Delete,

    // 選択
    Select,
    Unselect,
    ToggleSelection,
    SetMark,

    // 表示
    ToggleDotFiles,
    EditListing,
    NextLine,
    PreviousLine,
    MoveBufferStart,
    MoveBufferEnd,

    // 制御
    KeyboardQuit,
    Close,

    // 未知のコマンド
    Unknown(String),
}

impl Command {
    /// 文字列からコマンドを作成
    pub fn from_string(cmd: &str) -> Self {
        match cmd {
            "dired" => Command::Open,
            "dired-find-file" => Command::Enter,
            "dired-up-directory" => Command::GoUp,
            "revert-buffer" => Command::Refresh,
            "dired-create-directory" => Command::CreateDirectory,
            "dired-create-empty-file" => Command::CreateFile,
            "dired-do-rename" => Command::Rename,
            "dired-do-copy" => Command::Copy,
            "dired-do-delete" => Command::Delete,
            "dired-mark" => Command::Select,
            "dired-unmark" => Command::Unselect,
            "dired-toggle-marks" => Command::ToggleSelection,
            "set-mark-command" => Command::SetMark,
            "dired-toggle-dot-files" => Command::ToggleDotFiles,
            "wdired-change-to-wdired-mode" => Command::EditListing,
            "next-line" => Command::NextLine,
            "previous-line" => Command::PreviousLine,
            "beginning-of-buffer" => Command::MoveBufferStart,
            "end-of-buffer" => Command::MoveBufferEnd,
            "keyboard-quit" => Command::KeyboardQuit,
            "quit-window" => Command::Close,
            _ => Command::Unknown(cmd.to_string()),
        }
    }

    /// コマンドの説明を取得
    pub fn description(&self) -> &'static str {
        match self {
            Command::Open => "ディレクトリを開く",
            Command::Enter => "カーソル位置のファイルを開く",
            Command::GoUp => "親ディレクトリに移動",
            Command::Refresh => "ディレクトリを読み直す",
            Command::CreateDirectory => "ディレクトリを作成",
            Command::CreateFile => "空のファイルを作成",
            Command::Rename => "名前を変更",
            Command::Copy => "ファイルを複製",
            Command::Delete => "ファイルを削除",
            Command::Select => "マークを付ける",
            Command::Unselect => "マークを外す",
            Command::ToggleSelection => "マークを反転",
            Command::SetMark => "範囲選択の開始位置を設定",
            Command::ToggleDotFiles => "ドットファイルの表示を切り替え",
            Command::EditListing => "一覧をテキストとして編集",
            Command::NextLine => "カーソルを下に移動",
            Command::PreviousLine => "カーソルを上に移動",
            Command::MoveBufferStart => "先頭に移動",
            Command::MoveBufferEnd => "末尾に移動",
            Command::KeyboardQuit => "操作をキャンセル",
            Command::Close => "ビューを閉じる",
            Command::Unknown(_) => "不明なコマンド",
        }
    }
}

/// コマンド処理器
pub struct CommandProcessor<F: FileSystem> {
    view: ViewController<F>,
    /// カーソル行（0 はヘッダー）
    line: usize,
    /// 範囲選択の開始行
    mark: Option<usize>,
}

impl<F: FileSystem> CommandProcessor<F> {
    pub fn new(view: ViewController<F>) -> Self {
        Self {
            view,
            line: 0,
            mark: None,
        }
    }

    pub fn view(&self) -> &ViewController<F> {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewController<F> {
        &mut self.view
    }

    pub fn cursor_line(&self) -> usize {
        self.line
    }

    pub fn mark(&self) -> Option<usize> {
        self.mark
    }

    /// 表示側へ渡すカーソル状態。マークがあればマークからカーソルまでの範囲
    pub fn cursor(&self) -> Cursor {
        match self.mark {
            Some(mark) => {
                let start = mark.min(self.line);
                let end = mark.max(self.line) + 1;
                Cursor::with_selection(self.line, LineRange::new(start, end))
            }
            None => Cursor::at(self.line),
        }
    }

    /// カーソル行を設定（範囲外は末尾に寄せる）
    pub fn set_cursor_line(&mut self, line: usize) {
        self.line = line.min(self.last_line());
    }

    /// 起動時のディレクトリを開く
    ///
    /// 明示指定がなければカレントディレクトリ（なければホーム）。
    /// `ask` が真なら確認のため入力を求める
    pub fn open_initial(
        &mut self,
        requested: Option<&Path>,
        ask: bool,
        prompter: &mut dyn Prompter,
    ) -> CommandResult {
        let base = initial_directory();
        let initial = match requested {
            Some(path) => to_absolute(path, &base),
            None => base,
        };
        if ask {
            self.prompt_and_open(&initial, prompter)
        } else {
            self.open_path(&initial)
        }
    }

    /// コマンドを実行
    pub fn execute(&mut self, command: Command, prompter: &mut dyn Prompter) -> CommandResult {
        log::debug!("execute {:?}", command);
        match command {
            Command::Open => {
                let initial = self
                    .view
                    .current_directory()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(initial_directory);
                self.prompt_and_open(&initial, prompter)
            }
            Command::Enter => {
                let cursor = Cursor::at(self.line);
                match self.view.enter(&cursor) {
                    Ok(EnterOutcome::Opened(_)) => self.after_open(),
                    Ok(EnterOutcome::File(path)) => CommandResult::open_file(path),
                    Err(e) => CommandResult::from_error(&e),
                }
            }
            Command::GoUp => match self.view.go_up() {
                Ok(Some(_)) => self.after_open(),
                Ok(None) => CommandResult::success_no_refresh(),
                Err(e) => CommandResult::from_error(&e),
            },
            Command::Refresh => self.report(|view| view.refresh().map(|_| None)),
            Command::CreateDirectory => {
                let name = match ask_name(prompter, "Create directory: ", "") {
                    Some(name) => name,
                    None => return CommandResult::cancelled(),
                };
                self.report(|view| {
                    view.create_directory(&name)
                        .map(|path| Some(format!("ディレクトリを作成しました: {}", path.display())))
                })
            }
            Command::CreateFile => {
                let name = match ask_name(prompter, "Create file: ", "") {
                    Some(name) => name,
                    None => return CommandResult::cancelled(),
                };
                match self.view.create_file(&name) {
                    Ok(CreateFileOutcome::Created(path)) => {
                        self.clamp_cursor();
                        CommandResult::success_with_message(format!(
                            "ファイルを作成しました: {}",
                            path.display()
                        ))
                    }
                    Ok(CreateFileOutcome::OpenedDirectory(_)) => self.after_open(),
                    Ok(CreateFileOutcome::Existing(path)) => CommandResult::success_with_message(
                        format!("既に存在します: {}", path.display()),
                    ),
                    Err(e) => CommandResult::from_error(&e),
                }
            }
            Command::Rename => self.transfer(prompter, "Rename", |view, cursor, name| {
                view.rename(cursor, name)
            }),
            Command::Copy => self.transfer(prompter, "Copy", |view, cursor, name| {
                view.copy(cursor, name)
            }),
            Command::Delete => {
                let cursor = Cursor::at(self.line);
                let outcome = self.view.delete(&cursor, |entry| {
                    prompter.confirm(&format!("Delete {}? (y or n) ", entry.name()))
                });
                match outcome {
                    Ok(DeleteOutcome::Deleted(path)) => {
                        self.clamp_cursor();
                        CommandResult::success_with_message(format!(
                            "削除しました: {}",
                            path.display()
                        ))
                    }
                    Ok(DeleteOutcome::Cancelled) => CommandResult::cancelled(),
                    Err(e) => CommandResult::from_error(&e),
                }
            }
            Command::Select => self.mark_lines(|view, cursor| view.select(cursor)),
            Command::Unselect => self.mark_lines(|view, cursor| view.unselect(cursor)),
            Command::ToggleSelection => {
                self.mark_lines(|view, cursor| view.toggle_selection(cursor))
            }
            Command::SetMark => {
                self.mark = Some(self.line);
                CommandResult::success_with_message("マークを設定しました".to_string())
            }
            Command::ToggleDotFiles => match self.view.toggle_dot_files() {
                Ok(_) => {
                    self.clamp_cursor();
                    let state = if self.view.shows_dot_files() { "表示" } else { "非表示" };
                    CommandResult::success_with_message(format!("ドットファイルを{}", state))
                }
                Err(e) => CommandResult::from_error(&e),
            },
            Command::EditListing => self.edit_listing(prompter),
            Command::NextLine => {
                self.set_cursor_line(self.line + 1);
                CommandResult::success()
            }
            Command::PreviousLine => {
                self.line = self.line.saturating_sub(1);
                CommandResult::success()
            }
            Command::MoveBufferStart => {
                self.line = 0;
                CommandResult::success()
            }
            Command::MoveBufferEnd => {
                self.line = self.last_line();
                CommandResult::success()
            }
            Command::KeyboardQuit => {
                self.mark = None;
                CommandResult::success_with_message("Quit".to_string())
            }
            Command::Close => {
                self.view.dispose();
                self.line = 0;
                self.mark = None;
                CommandResult::quit()
            }
            Command::Unknown(name) => CommandResult::error(format!("不明なコマンド: {}", name)),
        }
    }

    fn prompt_and_open(&mut self, initial: &Path, prompter: &mut dyn Prompter) -> CommandResult {
        let answer = match prompter.read_input("Dired (directory): ", &initial.display().to_string()) {
            Some(answer) => answer,
            None => return CommandResult::cancelled(),
        };
        let path = to_absolute(expand_path(answer.trim()), &initial_directory());
        self.open_path(&path)
    }

    /// ディレクトリなら開き、ファイルなら表示側へ渡す
    fn open_path(&mut self, path: &Path) -> CommandResult {
        match self.view.file_system().stat(path) {
            Ok(stat) if !stat.is_dir() => CommandResult::open_file(path.to_path_buf()),
            Ok(_) => match self.view.open(path) {
                Ok(_) => self.after_open(),
                Err(e) => CommandResult::from_error(&e),
            },
            Err(e) => CommandResult::from_error(&e),
        }
    }

    /// 新しいディレクトリを開いた直後は最初のメンバーにカーソルを置く
    fn after_open(&mut self) -> CommandResult {
        self.mark = None;
        self.set_cursor_line(3);
        CommandResult::success()
    }

    /// 一覧のテキストを編集させ、結果をバッファに反映する
    fn edit_listing(&mut self, prompter: &mut dyn Prompter) -> CommandResult {
        let text = match self
            .view
            .locator()
            .ok_or(DiredError::NotOpened)
            .and_then(|locator| self.view.provide_text(&locator))
        {
            Ok(text) => text,
            Err(e) => return CommandResult::from_error(&e),
        };
        let edited = match prompter.edit_text(&text) {
            Ok(Some(edited)) => edited,
            Ok(None) => return CommandResult::cancelled(),
            Err(e) => return CommandResult::from_error(&e),
        };
        // エディタが付ける末尾の改行は変更とみなさない
        if edited.trim_end_matches(['\r', '\n']) == text {
            return CommandResult {
                needs_refresh: false,
                ..CommandResult::success_with_message("変更はありません".to_string())
            };
        }
        self.report(|view| {
            view.apply_edit(&edited)
                .map(|_| Some("編集を反映しました".to_string()))
        })
    }

    /// 名前変更と複製の共通処理
    fn transfer<T>(&mut self, prompter: &mut dyn Prompter, verb: &str, action: T) -> CommandResult
    where
        T: FnOnce(&mut ViewController<F>, &Cursor, &str) -> Result<PathBuf>,
    {
        let cursor = Cursor::at(self.line);
        let entry = match self.view.entry_at(self.line) {
            Ok(entry) => entry,
            Err(e) => return CommandResult::from_error(&e),
        };
        let prompt = format!("{} {} to: ", verb, entry.name());
        let name = match ask_name(prompter, &prompt, entry.name()) {
            Some(name) => name,
            None => return CommandResult::cancelled(),
        };
        match action(&mut self.view, &cursor, &name) {
            Ok(target) => {
                self.clamp_cursor();
                CommandResult::success_with_message(format!(
                    "{} {} -> {}",
                    verb,
                    entry.name(),
                    target.display()
                ))
            }
            Err(e) => CommandResult::from_error(&e),
        }
    }

    /// 選択系の共通処理。一行操作の後はカーソルを次の行へ進める
    fn mark_lines<T>(&mut self, action: T) -> CommandResult
    where
        T: FnOnce(&mut ViewController<F>, &Cursor) -> Result<usize>,
    {
        let cursor = self.cursor();
        match action(&mut self.view, &cursor) {
            Ok(lines) => {
                if self.mark.take().is_none() && self.line > 0 {
                    self.set_cursor_line(self.line + 1);
                }
                CommandResult::success_with_message(format!("{} 件を更新しました", lines))
            }
            Err(e) => CommandResult::from_error(&e),
        }
    }

    fn report<T>(&mut self, action: T) -> CommandResult
    where
        T: FnOnce(&mut ViewController<F>) -> Result<Option<String>>,
    {
        match action(&mut self.view) {
            Ok(message) => {
                self.clamp_cursor();
                match message {
                    Some(message) => CommandResult::success_with_message(message),
                    None => CommandResult::success(),
                }
            }
            Err(e) => CommandResult::from_error(&e),
        }
    }

    fn clamp_cursor(&mut self) {
        self.set_cursor_line(self.line);
        if let Some(mark) = self.mark {
            self.mark = Some(mark.min(self.last_line()));
        }
    }

    fn last_line(&self) -> usize {
        self.view
            .listing()
            .map(|listing| listing.line_count().saturating_sub(1))
            .unwrap_or(0)
    }
}

/// 名前を尋ねる。空文字列はキャンセル扱い
fn ask_name(prompter: &mut dyn Prompter, prompt: &str, initial: &str) -> Option<String> {
    prompter
        .read_input(prompt, initial)
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

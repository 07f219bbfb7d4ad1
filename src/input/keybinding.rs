//! キーバインド
//!
//! dired 風の一文字キーとコマンド名の対応

use super::commands::Command;
use crossterm::event::{KeyCode as CrosstermKeyCode, KeyEvent, KeyModifiers as CrosstermModifiers};
use std::collections::HashMap;

/// キー入力の内部表現
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    /// 修飾キー
    pub modifiers: KeyModifiers,
    /// 基本キー
    pub code: KeyCode,
}

/// 修飾キーの組み合わせ
///
/// Shift は文字自体（大文字・記号）に反映されるため保持しない
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyModifiers {
    pub ctrl: bool,
    pub alt: bool,
}

/// 基本キーコード
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Backspace,
    Up,
    Down,
    Home,
    End,
    Esc,
    Unknown,
}

impl Key {
    /// 修飾なしの文字キー
    pub fn plain(c: char) -> Self {
        Self {
            modifiers: KeyModifiers::default(),
            code: KeyCode::Char(c),
        }
    }

    /// Ctrl + 文字
    pub fn ctrl(c: char) -> Self {
        Self {
            modifiers: KeyModifiers {
                ctrl: true,
                alt: false,
            },
            code: KeyCode::Char(c),
        }
    }

    /// 修飾なしの特殊キー
    pub fn special(code: KeyCode) -> Self {
        Self {
            modifiers: KeyModifiers::default(),
            code,
        }
    }

    /// C-g かどうか
    pub fn is_cancel(&self) -> bool {
        *self == Key::ctrl('g') || self.code == KeyCode::Esc
    }

    /// ミニバッファに入力できる文字
    pub fn insertable_char(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c) if !self.modifiers.ctrl && !self.modifiers.alt => Some(c),
            _ => None,
        }
    }
}

impl From<KeyEvent> for Key {
    fn from(event: KeyEvent) -> Self {
        let modifiers = KeyModifiers {
            ctrl: event.modifiers.contains(CrosstermModifiers::CONTROL),
            alt: event.modifiers.contains(CrosstermModifiers::ALT),
        };

        let code = match event.code {
            CrosstermKeyCode::Char(c) => KeyCode::Char(c),
            CrosstermKeyCode::Enter => KeyCode::Enter,
            CrosstermKeyCode::Backspace => KeyCode::Backspace,
            CrosstermKeyCode::Up => KeyCode::Up,
            CrosstermKeyCode::Down => KeyCode::Down,
            CrosstermKeyCode::Home => KeyCode::Home,
            CrosstermKeyCode::End => KeyCode::End,
            CrosstermKeyCode::Esc => KeyCode::Esc,
            _ => KeyCode::Unknown,
        };

        Key { modifiers, code }
    }
}

/// キーとコマンド名の対応表
#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: HashMap<Key, &'static str>,
}

impl KeyMap {
    pub fn new() -> Self {
        let mut keymap = Self {
            bindings: HashMap::with_capacity(32),
        };
        keymap.register_default_bindings();
        keymap
    }

    fn register_default_bindings(&mut self) {
        // 移動
        self.bind(Key::special(KeyCode::Enter), "dired-find-file");
        self.bind(Key::plain('f'), "dired-find-file");
        self.bind(Key::plain('^'), "dired-up-directory");
        self.bind(Key::plain('g'), "revert-buffer");

        // ファイル操作
        self.bind(Key::plain('+'), "dired-create-directory");
        self.bind(Key::plain('F'), "dired-create-empty-file");
        self.bind(Key::plain('R'), "dired-do-rename");
        self.bind(Key::plain('C'), "dired-do-copy");
        self.bind(Key::plain('D'), "dired-do-delete");

        // 選択
        self.bind(Key::plain('m'), "dired-mark");
        self.bind(Key::plain('u'), "dired-unmark");
        self.bind(Key::plain('t'), "dired-toggle-marks");
        self.bind(Key::ctrl(' '), "set-mark-command");
        self.bind(Key::ctrl('@'), "set-mark-command");

        // 表示
        self.bind(Key::plain('.'), "dired-toggle-dot-files");
        self.bind(Key::plain('E'), "wdired-change-to-wdired-mode");
        self.bind(Key::plain('n'), "next-line");
        self.bind(Key::plain('p'), "previous-line");
        self.bind(Key::ctrl('n'), "next-line");
        self.bind(Key::ctrl('p'), "previous-line");
        self.bind(Key::special(KeyCode::Down), "next-line");
        self.bind(Key::special(KeyCode::Up), "previous-line");
        self.bind(Key::special(KeyCode::Home), "beginning-of-buffer");
        self.bind(Key::special(KeyCode::End), "end-of-buffer");
        self.bind(Key::plain('<'), "beginning-of-buffer");
        self.bind(Key::plain('>'), "end-of-buffer");

        // 制御
        self.bind(Key::ctrl('g'), "keyboard-quit");
        self.bind(Key::plain('q'), "quit-window");
    }

    /// キーを割り当てる（既存の割り当ては上書き）
    pub fn bind(&mut self, key: Key, command: &'static str) {
        self.bindings.insert(key, command);
    }

    /// キーに対応するコマンド
    pub fn lookup(&self, key: &Key) -> Option<Command> {
        self.bindings.get(key).map(|name| Command::from_string(name))
    }

    /// crossterm のキーイベントから直接引く
    pub fn lookup_event(&self, event: KeyEvent) -> Option<Command> {
        self.lookup(&Key::from(event))
    }

    /// コマンド名に割り当てられたキーの表示
    pub fn describe(&self, command: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, name)| **name == command)
            .map(|(key, _)| key_label(key))
            .collect();
        keys.sort();
        keys
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::new()
    }
}

fn key_label(key: &Key) -> String {
    let base = match &key.code {
        KeyCode::Char(' ') => "SPC".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "RET".to_string(),
        KeyCode::Backspace => "DEL".to_string(),
        KeyCode::Up => "<up>".to_string(),
        KeyCode::Down => "<down>".to_string(),
        KeyCode::Home => "<home>".to_string(),
        KeyCode::End => "<end>".to_string(),
        KeyCode::Esc => "ESC".to_string(),
        KeyCode::Unknown => "?".to_string(),
    };
    match (key.modifiers.ctrl, key.modifiers.alt) {
        (true, true) => format!("C-M-{}", base),
        (true, false) => format!("C-{}", base),
        (false, true) => format!("M-{}", base),
        (false, false) => base,
    }
}

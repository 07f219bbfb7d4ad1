//! 入力処理
//!
//! コマンド定義とキーバインド

pub mod commands;
pub mod keybinding;

pub use commands::{Command, CommandProcessor, CommandResult, Prompter};
pub use keybinding::{Key, KeyCode, KeyMap, KeyModifiers};

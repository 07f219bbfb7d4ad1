//! ミニバッファ描画
//!
//! 画面下部の一行。プロンプト入力と通知メッセージを表示する

use crate::error::{Notice, NoticeLevel};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::Line,
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// ミニバッファの状態
#[derive(Debug, Clone)]
pub enum MinibufferState {
    /// 通常状態（何も表示しない）
    Normal,
    /// プロンプト表示（ユーザー入力待ち）
    Prompt { message: String, input: String },
    /// 通知表示
    Message(Notice),
}

/// ミニバッファ描画器
#[derive(Debug)]
pub struct MinibufferRenderer {
    state: MinibufferState,
}

impl MinibufferRenderer {
    pub fn new() -> Self {
        Self {
            state: MinibufferState::Normal,
        }
    }

    /// プロンプト状態にする
    pub fn set_prompt(&mut self, message: &str, input: &str) {
        self.state = MinibufferState::Prompt {
            message: message.to_string(),
            input: input.to_string(),
        };
    }

    /// 通知を表示
    pub fn set_notice(&mut self, notice: Notice) {
        self.state = MinibufferState::Message(notice);
    }

    /// 通常状態にリセット
    pub fn clear(&mut self) {
        self.state = MinibufferState::Normal;
    }

    /// 表示期限の過ぎた通知を消す
    pub fn expire(&mut self) {
        if let MinibufferState::Message(notice) = &self.state {
            if notice.is_expired() {
                self.clear();
            }
        }
    }

    pub fn current_state(&self) -> &MinibufferState {
        &self.state
    }

    pub fn is_prompting(&self) -> bool {
        matches!(self.state, MinibufferState::Prompt { .. })
    }

    /// プロンプト入力文字列を取得
    pub fn prompt_input(&self) -> Option<&str> {
        match &self.state {
            MinibufferState::Prompt { input, .. } => Some(input),
            _ => None,
        }
    }

    /// プロンプト入力に文字を追加
    pub fn append_to_prompt(&mut self, ch: char) {
        if let MinibufferState::Prompt { input, .. } = &mut self.state {
            input.push(ch);
        }
    }

    /// プロンプト入力から最後の文字を削除
    pub fn backspace_prompt(&mut self) -> bool {
        if let MinibufferState::Prompt { input, .. } = &mut self.state {
            return input.pop().is_some();
        }
        false
    }

    /// 入力位置の表示列（プロンプト中のみ）
    pub fn cursor_column(&self) -> Option<u16> {
        match &self.state {
            MinibufferState::Prompt { message, input } => {
                Some((message.width() + input.width()).min(u16::MAX as usize) as u16)
            }
            _ => None,
        }
    }

    /// ミニバッファを描画
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let paragraph = Paragraph::new(self.content()).style(self.style());
        frame.render_widget(paragraph, area);

        if let Some(column) = self.cursor_column() {
            let x = area.x.saturating_add(column).min(area.right().saturating_sub(1));
            frame.set_cursor_position((x, area.y));
        }
    }

    fn content(&self) -> Line<'_> {
        match &self.state {
            MinibufferState::Normal => Line::from(""),
            MinibufferState::Prompt { message, input } => Line::from(format!("{}{}", message, input)),
            MinibufferState::Message(notice) => Line::from(notice.message.as_str()),
        }
    }

    fn style(&self) -> Style {
        match &self.state {
            MinibufferState::Normal => Style::default(),
            MinibufferState::Prompt { .. } => Style::default().fg(Color::Cyan),
            MinibufferState::Message(notice) => match notice.level {
                NoticeLevel::Info => Style::default().fg(Color::Green),
                NoticeLevel::Warning => Style::default().fg(Color::Yellow),
                NoticeLevel::Error => Style::default().fg(Color::Red),
            },
        }
    }
}

impl Default for MinibufferRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_prompt_editing() {
        let mut minibuffer = MinibufferRenderer::new();
        minibuffer.set_prompt("Rename a.txt to: ", "a.txt");
        minibuffer.append_to_prompt('x');
        assert_eq!(minibuffer.prompt_input(), Some("a.txtx"));

        assert!(minibuffer.backspace_prompt());
        assert_eq!(minibuffer.prompt_input(), Some("a.txt"));
        assert_eq!(minibuffer.cursor_column(), Some(22));
    }

    #[test]
    fn test_wide_characters_move_cursor_by_width() {
        let mut minibuffer = MinibufferRenderer::new();
        minibuffer.set_prompt("> ", "日本");
        assert_eq!(minibuffer.cursor_column(), Some(6));
    }

    #[test]
    fn test_expired_notice_is_cleared() {
        let mut minibuffer = MinibufferRenderer::new();
        let mut notice = Notice::info("done");
        notice.duration = Duration::ZERO;
        minibuffer.set_notice(notice);
        minibuffer.expire();
        assert!(matches!(minibuffer.current_state(), MinibufferState::Normal));
    }

    #[test]
    fn test_backspace_outside_prompt() {
        let mut minibuffer = MinibufferRenderer::new();
        assert!(!minibuffer.backspace_prompt());
        assert!(!minibuffer.is_prompting());
    }
}

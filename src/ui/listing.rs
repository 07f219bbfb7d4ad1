//! リスティング描画
//!
//! 表示用のスナップショットを取り、カーソル行・マーク範囲・選択行を色分けして描く

use crate::file::io::FileSystem;
use crate::input::CommandProcessor;
use crate::view::LineRange;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// 行の種類（テキストから判定する）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Header,
    Directory,
    File,
    Selected,
}

impl LineKind {
    /// 行テキストから種類を判定。手編集された行にも使える
    pub fn classify(index: usize, line: &str) -> Self {
        if index == 0 {
            return LineKind::Header;
        }
        let mut chars = line.chars();
        let marker = chars.next();
        let kind = chars.nth(1);
        match (marker, kind) {
            (Some('*'), _) => LineKind::Selected,
            (_, Some('d')) => LineKind::Directory,
            _ => LineKind::File,
        }
    }

    fn style(self) -> Style {
        match self {
            LineKind::Header => Style::default().add_modifier(Modifier::BOLD),
            LineKind::Directory => Style::default().fg(Color::Blue),
            LineKind::File => Style::default(),
            LineKind::Selected => Style::default().fg(Color::Yellow),
        }
    }
}

/// 描画用のスナップショット
///
/// プロンプト中もコマンド処理器を借用せずに再描画できるよう、必要な値を複製して持つ
#[derive(Debug, Clone, Default)]
pub struct ListingScreen {
    pub lines: Vec<String>,
    pub cursor: usize,
    pub region: Option<LineRange>,
    pub status: String,
}

impl ListingScreen {
    pub fn capture<F: FileSystem>(processor: &CommandProcessor<F>) -> Self {
        let view = processor.view();
        let lines = view
            .listing()
            .map(|listing| listing.render().lines().map(str::to_string).collect())
            .unwrap_or_default();

        let selected = view.selected_entries().len();
        let mut status = view
            .locator()
            .map(|locator| locator.to_string())
            .unwrap_or_else(|| "(no directory)".to_string());
        if selected > 0 {
            status.push_str(&format!("  [{} marked]", selected));
        }
        if !view.shows_dot_files() {
            status.push_str("  [dot files hidden]");
        }
        if view.listing().map(|l| l.is_dirty()).unwrap_or(false) {
            status.push_str("  [edited]");
        }

        Self {
            lines,
            cursor: processor.cursor_line(),
            region: processor.cursor().selection,
            status,
        }
    }

    /// 本文を描画
    pub fn render_body(&self, frame: &mut Frame<'_>, area: Rect, scroll: usize) {
        let height = area.height as usize;
        let lines: Vec<Line> = self
            .lines
            .iter()
            .enumerate()
            .skip(scroll)
            .take(height)
            .map(|(index, text)| {
                let mut style = LineKind::classify(index, text).style();
                let in_region = self
                    .region
                    .map(|r| (r.start..r.end).contains(&index))
                    .unwrap_or(false);
                if in_region {
                    style = style.bg(Color::DarkGray);
                }
                if index == self.cursor {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                Line::from(Span::styled(text.as_str(), style))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
    }

    /// ステータス行を描画
    pub fn render_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let text = format!(" {}  L{}", self.status, self.cursor);
        let style = Style::default().fg(Color::Black).bg(Color::Gray);
        frame.render_widget(Paragraph::new(Line::from(text)).style(style), area);
    }
}

/// カーソルが表示範囲に入るようにスクロール位置を調整
pub fn adjust_scroll(scroll: usize, cursor: usize, height: usize) -> usize {
    if height == 0 {
        return scroll;
    }
    if cursor < scroll {
        cursor
    } else if cursor >= scroll + height {
        cursor + 1 - height
    } else {
        scroll
    }
}

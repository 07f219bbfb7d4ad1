use crate::error::{DiredError, Notice, Result};
use crate::file::io::LocalFileSystem;
use crate::input::{CommandProcessor, CommandResult, Key, KeyCode, KeyMap, Prompter};
use crate::ui::{adjust_scroll, ListingScreen, MinibufferRenderer};
use crate::view::{ChannelListener, ListingEvent};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// 起動時の指定
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    /// 最初に開くディレクトリ
    pub directory: Option<PathBuf>,
    /// 開く前に確認するか
    pub ask_directory: bool,
}

pub struct TuiApplication {
    processor: CommandProcessor<LocalFileSystem>,
    keymap: KeyMap,
    minibuffer: MinibufferRenderer,
    events: Receiver<ListingEvent>,
    startup: StartupOptions,
    scroll: usize,
    running: bool,
}

impl TuiApplication {
    pub fn new(mut processor: CommandProcessor<LocalFileSystem>, startup: StartupOptions) -> Self {
        let (listener, events) = ChannelListener::new();
        processor.view_mut().subscribe(Box::new(listener));
        Self {
            processor,
            keymap: KeyMap::new(),
            minibuffer: MinibufferRenderer::new(),
            events,
            startup,
            scroll: 0,
            running: true,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        enter_terminal()?;

        let backend = CrosstermBackend::new(stdout());
        let mut terminal = Terminal::new(backend).map_err(|err| terminal_error("terminal init", err))?;

        let loop_result = self.start(&mut terminal).and_then(|_| self.event_loop(&mut terminal));
        drop(terminal);
        let cleanup_result = leave_terminal();

        loop_result.and(cleanup_result)
    }

    fn start<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let screen = ListingScreen::capture(&self.processor);
        let mut prompter = TerminalPrompter {
            terminal: &mut *terminal,
            minibuffer: &mut self.minibuffer,
            screen: &screen,
            scroll: &mut self.scroll,
        };
        let result = self.processor.open_initial(
            self.startup.directory.as_deref(),
            self.startup.ask_directory,
            &mut prompter,
        );
        let failure = (!result.success).then(|| result.message.clone()).flatten();
        self.apply_result(terminal, result)?;

        // 開けるディレクトリがなければ終了する
        if self.processor.view().current_directory().is_none() {
            self.running = false;
            if let Some(message) = failure {
                log::error!("could not open the initial directory: {}", message);
                return Err(DiredError::Ui(message));
            }
        }
        Ok(())
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        while self.running {
            self.drain_listing_events();
            self.minibuffer.expire();
            let screen = ListingScreen::capture(&self.processor);
            draw(terminal, &screen, &self.minibuffer, &mut self.scroll)?;

            if event::poll(Duration::from_millis(16)).map_err(|err| terminal_error("event poll", err))? {
                match event::read().map_err(|err| terminal_error("event read", err))? {
                    Event::Key(key_event) if key_event.kind != KeyEventKind::Release => {
                        self.handle_key(terminal, Key::from(key_event), screen)?
                    }
                    Event::Key(_) | Event::Resize(_, _) => {}
                    Event::Mouse(_) | Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
                }
            }
        }

        Ok(())
    }

    fn handle_key<B: Backend>(&mut self, terminal: &mut Terminal<B>, key: Key, screen: ListingScreen) -> Result<()> {
        let command = match self.keymap.lookup(&key) {
            Some(command) => command,
            None => {
                log::debug!("unbound key {:?}", key);
                return Ok(());
            }
        };

        let mut prompter = TerminalPrompter {
            terminal: &mut *terminal,
            minibuffer: &mut self.minibuffer,
            screen: &screen,
            scroll: &mut self.scroll,
        };
        let result = self.processor.execute(command, &mut prompter);
        self.apply_result(terminal, result)
    }

    fn apply_result<B: Backend>(&mut self, terminal: &mut Terminal<B>, result: CommandResult) -> Result<()> {
        if result.should_quit {
            self.running = false;
            return Ok(());
        }

        if let Some(path) = &result.file {
            self.display_file(terminal, path)?;
            return Ok(());
        }

        match result.message {
            Some(message) if result.success => self.minibuffer.set_notice(Notice::info(message)),
            Some(message) => self.minibuffer.set_notice(Notice::error(message)),
            None => {}
        }
        Ok(())
    }

    /// ファイルは外部のエディタ（`$VISUAL` / `$EDITOR` / `$PAGER`）に渡す
    fn display_file<B: Backend>(&mut self, terminal: &mut Terminal<B>, path: &Path) -> Result<()> {
        let program = match env_program(&["VISUAL", "EDITOR", "PAGER"]) {
            Some(program) => program,
            None => {
                self.minibuffer
                    .set_notice(Notice::warning(format!("表示できません（$EDITOR 未設定）: {}", path.display())));
                return Ok(());
            }
        };

        leave_terminal()?;
        let status = std::process::Command::new(&program).arg(path).status();
        enter_terminal()?;
        terminal.clear().map_err(|err| terminal_error("clear", err))?;

        match status {
            Ok(status) if status.success() => {}
            Ok(status) => log::warn!("{} exited with {}", program, status),
            Err(e) => {
                log::error!("failed to launch {}: {}", program, e);
                self.minibuffer
                    .set_notice(Notice::from_error(&DiredError::from_io(e, Path::new(&program))));
            }
        }
        Ok(())
    }

    fn drain_listing_events(&mut self) {
        for event in self.events.try_iter() {
            log::debug!("listing event {:?}", event);
            if let ListingEvent::Opened { .. } = event {
                self.scroll = 0;
            }
        }
    }
}

/// ミニバッファでの入力を、画面を再描画しながら待つ
struct TerminalPrompter<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
    minibuffer: &'a mut MinibufferRenderer,
    screen: &'a ListingScreen,
    scroll: &'a mut usize,
}

impl<B: Backend> TerminalPrompter<'_, B> {
    fn next_key(&mut self) -> Result<Key> {
        loop {
            draw(&mut *self.terminal, self.screen, &*self.minibuffer, &mut *self.scroll)?;
            if let Event::Key(key_event) = event::read().map_err(|err| terminal_error("event read", err))? {
                if key_event.kind != KeyEventKind::Release {
                    return Ok(Key::from(key_event));
                }
            }
        }
    }
}

impl<B: Backend> Prompter for TerminalPrompter<'_, B> {
    fn read_input(&mut self, prompt: &str, initial: &str) -> Option<String> {
        self.minibuffer.set_prompt(prompt, initial);
        loop {
            let key = match self.next_key() {
                Ok(key) => key,
                Err(e) => {
                    log::error!("prompt aborted: {}", e);
                    self.minibuffer.clear();
                    return None;
                }
            };
            if key.is_cancel() {
                self.minibuffer.clear();
                return None;
            }
            match key.code {
                KeyCode::Enter => {
                    let input = self.minibuffer.prompt_input().map(str::to_string);
                    self.minibuffer.clear();
                    return input;
                }
                KeyCode::Backspace => {
                    self.minibuffer.backspace_prompt();
                }
                _ => {
                    if let Some(c) = key.insertable_char() {
                        self.minibuffer.append_to_prompt(c);
                    }
                }
            }
        }
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.minibuffer.set_prompt(message, "");
        let answer = loop {
            match self.next_key() {
                Ok(key) if key.is_cancel() => break false,
                Ok(key) => match key.insertable_char() {
                    Some('y') | Some('Y') => break true,
                    Some('n') | Some('N') => break false,
                    _ => {}
                },
                Err(e) => {
                    log::error!("confirmation aborted: {}", e);
                    break false;
                }
            }
        };
        self.minibuffer.clear();
        answer
    }

    fn edit_text(&mut self, text: &str) -> Result<Option<String>> {
        let program = env_program(&["VISUAL", "EDITOR"])
            .ok_or_else(|| DiredError::Ui("$VISUAL / $EDITOR is not set".to_string()))?;
        let edited = edit_externally(&program, text);
        self.terminal.clear().map_err(|err| terminal_error("clear", err))?;
        edited
    }
}

/// 最初に設定されている環境変数の値
fn env_program(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| std::env::var(name).ok().filter(|value| !value.trim().is_empty()))
}

/// 一時ファイルに書き出したテキストを外部エディタで編集する
///
/// エディタが失敗で終了した場合は編集なし（`None`）
fn edit_externally(program: &str, text: &str) -> Result<Option<String>> {
    let mut file = tempfile::Builder::new()
        .prefix("dired-")
        .suffix(".txt")
        .tempfile()
        .map_err(|e| DiredError::from_io(e, &std::env::temp_dir()))?;
    let path = file.path().to_path_buf();
    file.write_all(text.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| DiredError::from_io(e, &path))?;

    leave_terminal()?;
    let status = std::process::Command::new(program).arg(&path).status();
    enter_terminal()?;

    match status {
        Ok(status) if status.success() => std::fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| DiredError::from_io(e, &path)),
        Ok(status) => {
            log::warn!("{} exited with {}, discarding edits", program, status);
            Ok(None)
        }
        Err(e) => {
            log::error!("failed to launch {}: {}", program, e);
            Err(DiredError::from_io(e, Path::new(program)))
        }
    }
}

fn draw<B: Backend>(
    terminal: &mut Terminal<B>,
    screen: &ListingScreen,
    minibuffer: &MinibufferRenderer,
    scroll: &mut usize,
) -> Result<()> {
    terminal
        .draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(1), Constraint::Length(1), Constraint::Length(1)])
                .split(frame.area());

            *scroll = adjust_scroll(*scroll, screen.cursor, chunks[0].height as usize);
            screen.render_body(frame, chunks[0], *scroll);
            screen.render_status(frame, chunks[1]);
            minibuffer.render(frame, chunks[2]);
        })
        .map(|_| ())
        .map_err(|err| terminal_error("render", err))
}

fn enter_terminal() -> Result<()> {
    enable_raw_mode().map_err(|err| terminal_error("enable raw mode", err))?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen).map_err(|err| terminal_error("enter alternate screen", err))?;
    Ok(())
}

fn leave_terminal() -> Result<()> {
    let mut out = stdout();
    execute!(out, LeaveAlternateScreen).map_err(|err| terminal_error("leave alternate screen", err))?;
    disable_raw_mode().map_err(|err| terminal_error("disable raw mode", err))?;
    Ok(())
}

fn terminal_error(context: &str, err: impl std::fmt::Display) -> DiredError {
    DiredError::Ui(format!("{}: {}", context, err))
}

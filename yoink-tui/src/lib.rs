pub mod overlay_view;
pub mod worker;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use worker::{UiMessage, spawn_downloads, spawn_scan};
use yoink_core::{OverlayHost, ToggleOutcome, banner_lines, parse_source};
use yoink_scanner::{HttpFetcher, MediaReference, SaveOutcome};

const MAX_OUTPUT_LINES: usize = 1000;
const MAX_HISTORY: usize = 100;
const DOWNLOAD_THREADS: usize = 4;
const PROMPT: &str = "yoink> ";

pub struct App {
    input: String,
    history: Vec<String>,
    output: Vec<String>,
    /// Cursor position in characters, not bytes
    cursor_position: usize,
    should_quit: bool,
    scroll_offset: usize,
    history_index: Option<usize>,
    temp_input: String,

    overlay: OverlayHost,
    selected: usize,
    /// Keys go to the overlay rather than the prompt
    overlay_focused: bool,
    scan_in_flight: Option<String>,
    output_dir: PathBuf,

    fetcher: Arc<HttpFetcher>,
    runtime: Handle,
    tx: mpsc::UnboundedSender<UiMessage>,
    rx: mpsc::UnboundedReceiver<UiMessage>,
}

impl App {
    pub fn new(runtime: Handle) -> Result<Self> {
        let mut output: Vec<String> = banner_lines().into_iter().map(String::from).collect();
        output.push(String::new());
        output.push("  Type 'scan <url>' to look for media, 'help' for all commands.".to_string());
        output.push(String::new());

        let (tx, rx) = mpsc::unbounded_channel();

        Ok(Self {
            input: String::new(),
            history: Vec::new(),
            output,
            cursor_position: 0,
            should_quit: false,
            scroll_offset: 0,
            history_index: None,
            temp_input: String::new(),
            overlay: OverlayHost::new(),
            selected: 0,
            overlay_focused: false,
            scan_in_flight: None,
            output_dir: PathBuf::from("."),
            fetcher: Arc::new(HttpFetcher::new()?),
            runtime,
            tx,
            rx,
        })
    }

    pub fn add_output(&mut self, message: impl Into<String>) {
        self.output.push(message.into());
        if self.output.len() > MAX_OUTPUT_LINES {
            self.output.drain(0..self.output.len() - MAX_OUTPUT_LINES);
        }
        // Auto-scroll to the bottom on new output
        self.scroll_offset = 0;
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn overlay(&self) -> &OverlayHost {
        &self.overlay
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_position)
            .map(|(idx, _)| idx)
            .unwrap_or(self.input.len())
    }

    fn input_len(&self) -> usize {
        self.input.chars().count()
    }

    pub fn navigate_history_backward(&mut self) {
        if self.history.is_empty() {
            return;
        }

        if self.history_index.is_none() {
            self.temp_input = self.input.clone();
        }

        let idx = match self.history_index {
            None => self.history.len() - 1,
            Some(idx) => idx.saturating_sub(1),
        };

        self.history_index = Some(idx);
        self.input = self.history[idx].clone();
        self.cursor_position = self.input_len();
    }

    pub fn navigate_history_forward(&mut self) {
        let Some(idx) = self.history_index else {
            return;
        };

        if idx + 1 >= self.history.len() {
            self.input = std::mem::take(&mut self.temp_input);
            self.history_index = None;
        } else {
            self.history_index = Some(idx + 1);
            self.input = self.history[idx + 1].clone();
        }
        self.cursor_position = self.input_len();
    }

    fn history_file_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".yoink_history")
    }

    pub fn load_history(&mut self) {
        if let Ok(content) = fs::read_to_string(Self::history_file_path()) {
            let mut lines: Vec<String> = content.lines().map(String::from).collect();
            if lines.len() > MAX_HISTORY {
                lines.drain(0..lines.len() - MAX_HISTORY);
            }
            self.history = lines;
        }
    }

    pub fn save_history(&self) -> Result<()> {
        if self.history.is_empty() {
            return Ok(());
        }
        fs::write(Self::history_file_path(), self.history.join("\n"))?;
        Ok(())
    }

    /// Drain everything the workers have sent since the last tick
    pub fn process_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.apply_message(message);
        }
    }

    pub fn apply_message(&mut self, message: UiMessage) {
        match message {
            UiMessage::PageLoaded(page) => {
                self.scan_in_flight = None;
                if self.overlay.toggle(&page) == ToggleOutcome::Opened {
                    self.selected = 0;
                    self.overlay_focused = true;
                    let summary = self.overlay.current().map(|view| {
                        format!(
                            "Found {} items on {}",
                            view.collection.len(),
                            view.page_url
                        )
                    });
                    if let Some(summary) = summary {
                        self.add_output(summary);
                    }
                }
            }
            UiMessage::ScanFailed { source, reason } => {
                self.scan_in_flight = None;
                self.add_output(format!("✗ Could not load {}: {}", source, reason));
            }
            UiMessage::Downloaded(SaveOutcome::Saved { path, bytes, .. }) => {
                self.add_output(format!("✓ Saved {} ({} bytes)", path.display(), bytes));
            }
            UiMessage::Downloaded(SaveOutcome::Failed { url, reason }) => {
                self.add_output(format!("✗ {}: {}", url, reason));
            }
            UiMessage::DownloadsFinished { saved, failed } => {
                self.add_output(format!("Downloads finished: {} saved, {} failed", saved, failed));
            }
        }
    }

    pub fn handle_input(&mut self, input: String) {
        let input = input.trim().to_string();
        if input.is_empty() {
            return;
        }

        self.history.push(input.clone());
        if self.history.len() > MAX_HISTORY {
            self.history.remove(0);
        }
        self.history_index = None;
        self.temp_input.clear();

        self.add_output(format!("{}{}", PROMPT, input));

        let parts: Vec<&str> = input.split_whitespace().collect();
        match parts[0] {
            "exit" | "quit" => {
                self.should_quit = true;
            }
            "help" => {
                self.add_output("Available commands:");
                self.add_output("  scan <url|file>    - Show the media on a page (again to close)");
                self.add_output("  close              - Close the media overlay");
                self.add_output("  download [n]       - Download item n, or everything listed");
                self.add_output("  dir <path>         - Set the download directory");
                self.add_output("  (Tab moves between the overlay and this prompt)");
                self.add_output("  clear              - Clear the output");
                self.add_output("  help               - Show this help message");
                self.add_output("  exit, quit         - Exit the REPL");
            }
            "clear" => {
                self.output.clear();
                self.scroll_offset = 0;
            }
            "scan" => self.command_scan(parts.get(1).copied()),
            "close" => {
                if !self.overlay.dismiss() {
                    self.add_output("No overlay is open");
                }
            }
            "download" => self.command_download(parts.get(1).copied()),
            "dir" => match parts.get(1) {
                Some(path) => {
                    self.output_dir = PathBuf::from(shellexpand::tilde(path).into_owned());
                    self.add_output(format!("Downloads will be saved to {}", self.output_dir.display()));
                }
                None => {
                    self.add_output(format!("Download directory: {}", self.output_dir.display()));
                }
            },
            other => {
                self.add_output(format!("Unknown command: {}", other));
                self.add_output("Type 'help' for available commands");
            }
        }
    }

    fn command_scan(&mut self, target: Option<&str>) {
        if self.overlay.dismiss() {
            self.add_output("Closed media overlay");
            return;
        }

        let Some(target) = target else {
            self.add_output("Error: scan requires a URL or file");
            return;
        };

        if let Some(ref pending) = self.scan_in_flight {
            self.add_output(format!("Still scanning {}", pending));
            return;
        }

        let Some(source) = parse_source(target) else {
            self.add_output(format!("Error: '{}' is not a URL or readable file", target));
            return;
        };

        self.add_output(format!("Scanning {}...", source));
        self.scan_in_flight = Some(source.to_string());
        spawn_scan(
            &self.runtime,
            self.fetcher.client().clone(),
            source,
            self.tx.clone(),
        );
    }

    fn command_download(&mut self, index: Option<&str>) {
        let Some(view) = self.overlay.current() else {
            self.add_output("Error: nothing to download, scan a page first");
            return;
        };

        let items: Vec<MediaReference> = match index {
            None => view
                .collection
                .iter()
                .filter(|item| item.kind.is_downloadable())
                .cloned()
                .collect(),
            Some(raw) => {
                let picked = raw
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|idx| view.collection.get(idx).cloned());
                match picked {
                    Some(item) => vec![item],
                    None => {
                        let len = view.collection.len();
                        self.add_output(format!("Error: pick an item between 1 and {}", len));
                        return;
                    }
                }
            }
        };

        self.start_downloads(items);
    }

    fn download_selected(&mut self) {
        let Some(item) = self
            .overlay
            .current()
            .and_then(|view| view.collection.get(self.selected).cloned())
        else {
            return;
        };
        self.start_downloads(vec![item]);
    }

    fn start_downloads(&mut self, items: Vec<MediaReference>) {
        let items: Vec<MediaReference> = items
            .into_iter()
            .filter(|item| item.kind.is_downloadable())
            .collect();

        if items.is_empty() {
            self.add_output("Nothing downloadable there (embedded content is listed only)");
            return;
        }

        let dir = self.output_dir.clone();
        self.add_output(format!("Downloading {} item(s) to {}", items.len(), dir.display()));
        spawn_downloads(
            &self.runtime,
            self.fetcher.clone(),
            dir,
            items,
            DOWNLOAD_THREADS,
            self.tx.clone(),
        );
    }

    /// While the overlay is open and focused it takes every key; Tab hands
    /// focus back and forth.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.overlay.is_open() {
            if key.code == KeyCode::Tab {
                self.overlay_focused = !self.overlay_focused;
                return;
            }
            if self.overlay_focused {
                self.handle_overlay_key(key);
                return;
            }
        }

        match key.code {
            KeyCode::Char(c) => {
                let at = self.byte_index();
                self.input.insert(at, c);
                self.cursor_position += 1;
                self.history_index = None;
                self.temp_input.clear();
            }
            KeyCode::Backspace => {
                if self.cursor_position > 0 {
                    self.cursor_position -= 1;
                    let at = self.byte_index();
                    self.input.remove(at);
                    self.history_index = None;
                    self.temp_input.clear();
                }
            }
            KeyCode::Enter => {
                let input = std::mem::take(&mut self.input);
                self.cursor_position = 0;
                self.handle_input(input);
            }
            KeyCode::Up => self.navigate_history_backward(),
            KeyCode::Down => self.navigate_history_forward(),
            KeyCode::Left => {
                self.cursor_position = self.cursor_position.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.cursor_position < self.input_len() {
                    self.cursor_position += 1;
                }
            }
            KeyCode::Home => self.cursor_position = 0,
            KeyCode::End => self.cursor_position = self.input_len(),
            KeyCode::Esc => {
                if self.overlay.dismiss() {
                    self.overlay_focused = false;
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
            }
            KeyCode::PageDown => {
                self.scroll_offset =
                    (self.scroll_offset + 10).min(self.output.len().saturating_sub(1));
            }
            _ => {}
        }
    }

    fn handle_overlay_key(&mut self, key: KeyEvent) {
        let total = self
            .overlay
            .current()
            .map(|view| view.collection.len())
            .unwrap_or(0);

        match key.code {
            KeyCode::Esc => {
                self.overlay.dismiss();
                self.overlay_focused = false;
            }
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected + 1 < total {
                    self.selected += 1;
                }
            }
            KeyCode::Enter | KeyCode::Char('d') => self.download_selected(),
            _ => {}
        }
    }
}

pub fn run(runtime: Handle) -> Result<()> {
    let mut app = App::new(runtime)?;
    app.load_history();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = app.save_history() {
        eprintln!("Could not save history: {}", e);
    }

    result
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.process_messages();
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
        {
            app.handle_key(key);
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

pub fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Output
            Constraint::Length(1), // Rule
            Constraint::Length(1), // Input
            Constraint::Length(1), // Rule
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    let output_height = chunks[0].height as usize;
    let total_lines = app.output.len();
    let scroll_offset = if app.scroll_offset == 0 && total_lines > output_height {
        total_lines.saturating_sub(output_height)
    } else {
        app.scroll_offset.min(total_lines.saturating_sub(output_height))
    };

    let visible_output: Vec<Line> = app
        .output
        .iter()
        .skip(scroll_offset)
        .take(output_height)
        .map(|line| Line::from(line.clone()))
        .collect();
    f.render_widget(
        Paragraph::new(visible_output).style(Style::default().fg(Color::White)),
        chunks[0],
    );

    let rule = || {
        Paragraph::new("─".repeat(chunks[1].width as usize))
            .style(Style::default().fg(Color::DarkGray))
    };
    f.render_widget(rule(), chunks[1]);

    let input = Paragraph::new(format!("{}{}", PROMPT, app.input))
        .style(Style::default().fg(Color::Yellow));
    f.render_widget(input, chunks[2]);

    if !(app.overlay.is_open() && app.overlay_focused) {
        f.set_cursor_position((
            chunks[2].x + (PROMPT.len() + app.cursor_position) as u16,
            chunks[2].y,
        ));
    }

    f.render_widget(rule(), chunks[3]);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut status = vec![
        Span::raw("Dir "),
        Span::styled(app.output_dir.display().to_string(), bold),
        Span::raw(" | "),
    ];
    if let Some(ref pending) = app.scan_in_flight {
        status.push(Span::raw("scanning "));
        status.push(Span::styled(pending.clone(), bold));
        status.push(Span::raw(" | "));
    }
    status.extend([
        Span::styled("help", bold),
        Span::raw(" for commands | "),
        Span::styled("PgUp/PgDn", bold),
        Span::raw(" scroll"),
    ]);
    f.render_widget(
        Paragraph::new(Line::from(status)).style(Style::default().fg(Color::DarkGray)),
        chunks[4],
    );

    if let Some(view) = app.overlay.current() {
        overlay_view::render_overlay(f, view, app.selected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use tempfile::TempDir;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_line(app: &mut App, line: &str) {
        for c in line.chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
        app.handle_key(press(KeyCode::Enter));
    }

    async fn next_message(app: &mut App) -> UiMessage {
        tokio::time::timeout(Duration::from_secs(5), app.rx.recv())
            .await
            .expect("worker did not report back")
            .expect("channel closed")
    }

    fn saved_page(dir: &TempDir) -> String {
        let file = dir.path().join("page.html");
        fs::write(
            &file,
            r#"<img src="a.png" width="4" height="3"><iframe src="https://player.example/x"></iframe>"#,
        )
        .unwrap();
        file.to_string_lossy().into_owned()
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[tokio::test]
    async fn test_help_and_unknown_command() {
        let mut app = App::new(Handle::current()).unwrap();
        type_line(&mut app, "help");
        assert!(app.output().iter().any(|l| l.contains("download [n]")));

        type_line(&mut app, "frobnicate");
        assert!(app.output().iter().any(|l| l == "Unknown command: frobnicate"));
    }

    #[tokio::test]
    async fn test_clear_and_exit() {
        let mut app = App::new(Handle::current()).unwrap();
        type_line(&mut app, "clear");
        assert!(app.output().is_empty());

        type_line(&mut app, "quit");
        assert!(app.should_quit());
    }

    #[tokio::test]
    async fn test_dir_command() {
        let mut app = App::new(Handle::current()).unwrap();
        type_line(&mut app, "dir /tmp/media");
        assert_eq!(app.output_dir(), &PathBuf::from("/tmp/media"));
    }

    #[tokio::test]
    async fn test_download_without_overlay() {
        let mut app = App::new(Handle::current()).unwrap();
        type_line(&mut app, "download");
        assert!(app.output().iter().any(|l| l.contains("scan a page first")));
    }

    #[tokio::test]
    async fn test_scan_rejects_bad_source() {
        let mut app = App::new(Handle::current()).unwrap();
        type_line(&mut app, "scan");
        assert!(app.output().iter().any(|l| l.contains("requires a URL")));
    }

    #[tokio::test]
    async fn test_scan_toggles_overlay() {
        let dir = TempDir::new().unwrap();
        let page = saved_page(&dir);
        let mut app = App::new(Handle::current()).unwrap();

        type_line(&mut app, &format!("scan {}", page));
        let message = next_message(&mut app).await;
        app.apply_message(message);

        let view = app.overlay().current().unwrap();
        assert_eq!(view.collection.len(), 2);
        assert!(app.output().iter().any(|l| l.starts_with("Found 2 items")));

        // Same command again closes it without loading anything
        app.handle_key(press(KeyCode::Tab));
        type_line(&mut app, &format!("scan {}", page));
        assert!(!app.overlay().is_open());
        assert!(app.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_overlay_keys() {
        let dir = TempDir::new().unwrap();
        let page = saved_page(&dir);
        let mut app = App::new(Handle::current()).unwrap();

        type_line(&mut app, &format!("scan {}", page));
        let message = next_message(&mut app).await;
        app.apply_message(message);

        app.handle_key(press(KeyCode::Down));
        assert_eq!(app.selected(), 1);
        app.handle_key(press(KeyCode::Down));
        assert_eq!(app.selected(), 1);
        app.handle_key(press(KeyCode::Up));
        assert_eq!(app.selected(), 0);

        app.handle_key(press(KeyCode::Down));
        app.handle_key(press(KeyCode::Char('d')));
        assert!(app.output().iter().any(|l| l.contains("Nothing downloadable")));

        // Typed characters do not reach the prompt while the overlay has focus
        app.handle_key(press(KeyCode::Char('x')));
        app.handle_key(press(KeyCode::Tab));
        type_line(&mut app, "download 1");
        assert!(app.output().iter().any(|l| l == "yoink> download 1"));

        app.handle_key(press(KeyCode::Tab));
        app.handle_key(press(KeyCode::Esc));
        assert!(!app.overlay().is_open());
        assert!(!app.should_quit());
    }

    #[tokio::test]
    async fn test_escape_at_prompt_closes_overlay_before_quitting() {
        let dir = TempDir::new().unwrap();
        let page = saved_page(&dir);
        let mut app = App::new(Handle::current()).unwrap();

        type_line(&mut app, &format!("scan {}", page));
        let message = next_message(&mut app).await;
        app.apply_message(message);

        app.handle_key(press(KeyCode::Tab));
        app.handle_key(press(KeyCode::Esc));
        assert!(!app.overlay().is_open());
        assert!(!app.should_quit());

        app.handle_key(press(KeyCode::Esc));
        assert!(app.should_quit());
    }

    #[tokio::test]
    async fn test_overlay_is_drawn() {
        let dir = TempDir::new().unwrap();
        let page = saved_page(&dir);
        let mut app = App::new(Handle::current()).unwrap();

        type_line(&mut app, &format!("scan {}", page));
        let message = next_message(&mut app).await;
        app.apply_message(message);

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| ui(f, &app)).unwrap();

        let screen = screen_text(&terminal);
        assert!(screen.contains("Media on file://"));
        assert!(screen.contains("4×3"));
        assert!(screen.contains("Download"));
    }
}

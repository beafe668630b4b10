mod render;

use anyhow::Result;
use crossbeam_channel::Receiver;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use hexmark_config::Config;
use hexmark_engine::highlight::{self, HighlightRequest};
use hexmark_engine::{
    BufferSpan, ByteBuffer, Column, HexLine, HexView, HighlightOptions, HighlighterRegistry,
    LayoutOptions, MemoryView, TagSpan, ValueTracker, ViewId,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    text::Line,
    widgets::{Block, Borders, Paragraph},
};
use std::{
    env,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};

const VIEW_ID: ViewId = ViewId(0);
const VALUE_WIDTHS: [usize; 4] = [1, 2, 4, 8];

struct App {
    path: PathBuf,
    view: MemoryView,
    registry: HighlighterRegistry,
    requests: Receiver<HighlightRequest>,
    status: String,
}

impl App {
    fn new(path: PathBuf, bytes: Vec<u8>, config: &Config, rows: usize) -> Result<Self> {
        let view = MemoryView::new(
            ByteBuffer::from_bytes(bytes),
            LayoutOptions {
                bytes_per_line: config.bytes_per_line,
                bytes_per_value: config.bytes_per_value,
                start_position: 0,
            },
            HighlightOptions {
                highlight_current_value: config.highlight_current_value,
            },
            rows,
        )?;

        let (sender, requests) = highlight::request_channel();
        let mut registry = HighlighterRegistry::new();
        registry.get_or_create(VIEW_ID, || ValueTracker::new(&view, sender));

        Ok(Self {
            path,
            view,
            registry,
            requests,
            status: String::new(),
        })
    }

    fn with_tracker(&mut self, f: impl FnOnce(&mut ValueTracker, &MemoryView)) {
        if let Some(tracker) = self.registry.get_mut(VIEW_ID) {
            f(tracker, &self.view);
        }
    }

    /// Run the highlight work queued since the last turn.
    fn pump(&mut self) {
        let pending: Vec<HighlightRequest> = self.requests.try_iter().collect();
        for request in pending {
            match request {
                HighlightRequest::RefreshTags(span) => {
                    log::trace!("tags invalidated for {span:?}");
                }
                HighlightRequest::DeferredRecapture => {
                    self.with_tracker(|tracker, view| tracker.recapture(view));
                }
            }
        }
    }

    /// Re-lay out the lines after the view started a new layout pass.
    fn relayout(&mut self) {
        self.with_tracker(|tracker, _| tracker.on_lines_rebuilt());
        self.view.rebuild_lines();
        let caret = self.view.caret();
        self.view.set_caret(caret);
    }

    fn move_caret(&mut self, cells: i64) {
        self.view.move_caret(cells);
        if self.view.ensure_caret_visible() {
            self.relayout();
        } else {
            self.with_tracker(|tracker, view| tracker.on_caret_moved(view));
        }
    }

    fn move_lines(&mut self, lines: i64) {
        let cells_per_line = (self.view.layout().bytes_per_line() / self.cell_size()) as i64;
        self.move_caret(lines * cells_per_line);
    }

    fn cell_size(&self) -> usize {
        match self.view.caret().column {
            Column::Value => self.view.bytes_per_value(),
            Column::Text => 1,
        }
    }

    fn switch_column(&mut self) {
        self.view.switch_column();
        self.with_tracker(|tracker, view| tracker.on_caret_moved(view));
    }

    fn toggle_selection(&mut self) {
        if self.view.selection().is_some() {
            self.view.clear_selection();
        } else {
            let offset = self.view.caret().offset;
            self.view.select(BufferSpan::from_start_and_len(offset, 1));
        }
        self.with_tracker(|tracker, view| tracker.on_selection_changed(view));
    }

    fn toggle_option(&mut self) {
        let enabled = !self.view.highlight_current_value();
        let option = self.view.set_highlight_current_value(enabled);
        self.with_tracker(|tracker, view| tracker.on_option_changed(view, option));
    }

    fn cycle_value_width(&mut self) {
        let current = self.view.bytes_per_value();
        let next = VALUE_WIDTHS
            .iter()
            .cycle()
            .skip_while(|width| **width != current)
            .nth(1)
            .copied()
            .unwrap_or(1);

        match self.view.set_bytes_per_value(next) {
            Ok(option) => {
                self.with_tracker(|tracker, view| tracker.on_option_changed(view, option));
                self.relayout();
                self.status.clear();
            }
            Err(e) if next != 1 => {
                log::warn!("cannot switch to {next}-byte values: {e}");
                self.status = e.to_string();
                if self.view.set_bytes_per_value(1).is_ok() {
                    self.relayout();
                }
            }
            Err(e) => self.status = e.to_string(),
        }
    }

    fn increment_byte(&mut self) {
        let offset = self.view.caret().offset;
        let Some(byte) = usize::try_from(offset)
            .ok()
            .and_then(|index| self.view.byte_buffer().as_bytes().get(index).copied())
        else {
            return;
        };
        let change = self.view.write(offset, &[byte.wrapping_add(1)]);
        self.with_tracker(|tracker, view| tracker.on_data_changed(view, &[change]));
        self.view.begin_layout();
        self.relayout();
    }

    fn page(&mut self, pages: i64) {
        let rows = self.view.lines().len().max(1) as u64;
        let top = self.view.top_line();
        let target = if pages < 0 {
            top.saturating_sub(rows)
        } else {
            top.saturating_add(rows)
        };
        if self.view.scroll_to(target) {
            self.relayout();
        }
    }

    fn line_tags(&self, line: &HexLine) -> Vec<TagSpan> {
        self.registry
            .get(VIEW_ID)
            .map(|tracker| highlight::get_tags(tracker, line).collect())
            .unwrap_or_default()
    }

    fn status_line(&self) -> String {
        let caret = self.view.caret();
        let state = self
            .registry
            .get(VIEW_ID)
            .map(|tracker| format!("{:?}", tracker.state()))
            .unwrap_or_default();
        format!(
            "{} | {:08X} | {:?} | {}-byte values | {} | {}",
            self.path.display(),
            caret.offset,
            caret.column,
            self.view.bytes_per_value(),
            state,
            self.status
        )
    }

    fn close(&mut self) {
        self.view.close();
        self.registry.close(VIEW_ID);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();

    let args: Vec<String> = env::args().collect();
    let mut path = None;
    let mut width = None;
    let mut no_highlight = false;

    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--width" => match rest.next().and_then(|w| w.parse::<usize>().ok()) {
                Some(w) => width = Some(w),
                None => usage(&args[0]),
            },
            "--no-highlight" => no_highlight = true,
            _ if path.is_none() => path = Some(PathBuf::from(arg)),
            _ => usage(&args[0]),
        }
    }
    let Some(path) = path else {
        usage(&args[0]);
    };

    let mut config = match Config::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };
    if let Some(width) = width {
        config.bytes_per_value = width;
    }
    if no_highlight {
        config.highlight_current_value = false;
    }
    if let Err(reason) = config.validate() {
        eprintln!("Error: {reason}");
        process::exit(1);
    }

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error: Cannot read '{}': {e}", path.display());
            process::exit(1);
        }
    };

    let (_, height) = terminal::size()?;
    let rows = usize::from(height.saturating_sub(5)).max(1);
    let mut app = App::new(path, bytes, &config, rows)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);
    app.close();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} <file> [--width N] [--no-highlight]");
    process::exit(1);
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.pump();
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Left | KeyCode::Char('h') => app.move_caret(-1),
                KeyCode::Right | KeyCode::Char('l') => app.move_caret(1),
                KeyCode::Up | KeyCode::Char('k') => app.move_lines(-1),
                KeyCode::Down | KeyCode::Char('j') => app.move_lines(1),
                KeyCode::Tab => app.switch_column(),
                KeyCode::Char('v') => app.toggle_selection(),
                KeyCode::Char('o') => app.toggle_option(),
                KeyCode::Char('w') => app.cycle_value_width(),
                KeyCode::Char('x') => app.increment_byte(),
                KeyCode::PageUp => app.page(-1),
                KeyCode::PageDown => app.page(1),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(f.area());

    let caret = app.view.caret();
    let lines: Vec<Line> = app
        .view
        .lines()
        .iter()
        .map(|line| {
            let tags = app.line_tags(line);
            let caret_span = line
                .cells(caret.column)
                .get_cell(caret.offset)
                .map(|cell| cell.cell_span.clone());
            render::to_line(render::segments(&line.text, &tags, caret_span.as_ref()))
        })
        .collect();

    let hex = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("hexmark"));
    f.render_widget(hex, chunks[0]);

    let help = Paragraph::new(vec![
        Line::from(app.status_line()),
        Line::from(
            "q: Quit | hjkl/arrows: Move | Tab: Column | v: Select | o: Highlight | w: Width | x: Increment",
        ),
    ])
    .block(Block::default());
    f.render_widget(help, chunks[1]);
}

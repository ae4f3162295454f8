mod app;
mod event;
mod ui;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::style::Style;
use ratatui::widgets::Block;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use colmatch::config::Config;
use colmatch::engine::Column;
use colmatch::session::{PlacementMode, PuzzleSession, SessionOptions};
use colmatch::store::session_file::SessionFile;

use app::App;
use event::{AppEvent, EventHandler};
use ui::components::board_view::BoardView;
use ui::components::status_bar::{Footer, Header};
use ui::layout::{AppLayout, BoardGeometry, follow_row};
use ui::theme::Theme;

#[derive(Parser)]
#[command(
    name = "colmatch",
    version,
    about = "Terminal column-matching puzzle for drilling tab-separated word lists"
)]
struct Cli {
    #[arg(help = "Tab-separated word list to load instead of the saved session")]
    file: Option<PathBuf>,

    #[arg(short, long, help = "Number of rows per group")]
    size: Option<usize>,

    #[arg(short, long, value_parser = parse_mode, help = "Placement mode (auto, manual, none)")]
    mode: Option<PlacementMode>,

    #[arg(long, help = "Seed for reproducible shuffles and draws")]
    seed: Option<u64>,

    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, help = "Do not restore the saved session")]
    no_restore: bool,
}

fn parse_mode(name: &str) -> Result<PlacementMode, String> {
    PlacementMode::from_name(name)
        .ok_or_else(|| format!("unknown mode '{name}', expected auto, manual or none"))
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let log_path = Config::dir().join("colmatch.log");
    let file = log_path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| OpenOptions::new().create(true).append(true).open(&log_path));

    match file {
        Ok(file) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .with(env_filter)
                .init();
            tracing::info!(path = %log_path.display(), "logging initialized");
        }
        // No log file: stay silent rather than draw over the board.
        Err(_) => tracing_subscriber::registry().with(env_filter).init(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::load().unwrap_or_else(|err| {
        warn!(error = %err, "unreadable config, using defaults");
        Config::default()
    });
    if let Some(size) = cli.size {
        config.group_size = size;
        config.validate();
    }
    if let Some(mode) = cli.mode {
        config.placement_mode = mode;
    }

    let theme_name = cli.theme.clone().unwrap_or_else(|| config.theme.clone());
    let theme = Theme::load(&theme_name).unwrap_or_else(|| {
        warn!(
            theme = %theme_name,
            available = ?Theme::available_themes(),
            "unknown theme, using default"
        );
        Theme::default()
    });

    let options = SessionOptions::from(&config);
    let session = match cli.seed {
        Some(seed) => PuzzleSession::with_seed(options, seed),
        None => PuzzleSession::from_entropy(options),
    };
    let mut app = App::new(config, theme, session, SessionFile::new());
    app.start(cli.file.as_deref(), !cli.no_restore);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = EventHandler::new(Duration::from_millis(100));

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    app.shutdown();

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit(false);
        return;
    }

    match key.code {
        KeyCode::Left | KeyCode::Char('h') => app.move_cursor(-1, 0),
        KeyCode::Right | KeyCode::Char('l') => app.move_cursor(1, 0),
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(0, -1),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(0, 1),
        KeyCode::PageUp => app.move_cursor(0, -10),
        KeyCode::PageDown => app.move_cursor(0, 10),
        KeyCode::Enter => app.pick_or_drop(),
        KeyCode::Esc => app.cancel(),
        KeyCode::Char(' ') => app.check_advance(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.add_one(),
        KeyCode::Char('-') => app.remove_one(),
        KeyCode::Char('1') => app.set_mode(PlacementMode::AutoCheck),
        KeyCode::Char('2') => app.set_mode(PlacementMode::ManualCheck),
        KeyCode::Char('3') => app.set_mode(PlacementMode::NoCheck),
        KeyCode::Char('s') => app.toggle_layout(),
        KeyCode::Char('m') => app.toggle_lock(),
        KeyCode::Char('v') => app.toggle_visible(),
        KeyCode::Char('r') => app.relayout(),
        KeyCode::Char('w') => app.save_now(),
        KeyCode::Char('L') => app.load_previous(),
        KeyCode::Char('q') => app.quit(false),
        KeyCode::Char('Q') => app.quit(true),
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let column = app.geometry.column_at(mouse.column);
    let row = app.geometry.row_at(mouse.row, app.scroll);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            let (Some(column), Some(row)) = (column, row) else {
                return;
            };
            app.set_cursor(column, row);
            app.pick_or_drop();
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if let (Some(held), Some(row)) = (app.held, row) {
                app.set_cursor(held.id.column, row);
            }
        }
        // a plain click keeps the token in hand; a drag drops it on release
        MouseEventKind::Up(MouseButton::Left) => {
            if app.held.is_some_and(|h| h.origin_row != app.cursor.row) {
                app.drop_held();
            }
        }
        MouseEventKind::ScrollDown => app.move_cursor(0, 2),
        MouseEventKind::ScrollUp => app.move_cursor(0, -2),
        _ => {}
    }
}

fn board_title(app: &App) -> String {
    let columns: Vec<String> = app
        .session
        .board()
        .columns()
        .iter()
        .map(|c| {
            let mut label = format!("{}:{}", c.index() + 1, c.layout_mode().as_str());
            if !c.is_movable() {
                label.push_str(" locked");
            }
            if !c.is_visible() {
                label.push_str(" hidden");
            }
            label
        })
        .collect();
    format!(" {} ", columns.join(" | "))
}

fn render(frame: &mut ratatui::Frame, app: &mut App) {
    let area = frame.area();
    let layout = AppLayout::new(area, Footer::height(area.width));

    let board_block = Block::bordered()
        .title(board_title(app))
        .border_style(Style::default().fg(app.theme.colors.border()));
    let board_area = board_block.inner(layout.board);
    let widest: Vec<usize> = app
        .session
        .board()
        .columns()
        .iter()
        .map(Column::widest)
        .collect();
    app.geometry = BoardGeometry::new(board_area, &widest);
    app.scroll = follow_row(app.scroll, app.cursor.row, app.geometry.visible_rows());

    let app = &*app;
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()).fg(colors.fg()));
    frame.render_widget(bg, area);

    frame.render_widget(
        Header {
            counters: app.counters,
            mode: app.session.mode(),
            target_size: app.session.target_size(),
            bank: app.session.bank().len(),
            theme: &app.theme,
        },
        layout.header,
    );

    frame.render_widget(board_block, layout.board);
    frame.render_widget(
        BoardView::new(
            app.session.board(),
            &app.geometry,
            app.cursor,
            app.held,
            app.scroll,
            &app.theme,
        ),
        board_area,
    );

    frame.render_widget(
        Footer {
            status: app.status.as_ref(),
            theme: &app.theme,
        },
        layout.footer,
    );
}

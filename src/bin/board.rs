use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton, MouseEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Frame, Terminal, widgets::{Block, Borders, Clear, Paragraph, Wrap}, layout::{Layout, Constraint, Direction, Rect}, style::{Style, Modifier, Color}};
use tracing_subscriber::EnvFilter;

use todoboard::{
    application::{board_service::BoardService, board_session::{BoardAlert, BoardSession}, renderer::Renderer},
    config::Config,
    domain::{command_store::CommandStore, surface::Surface},
    infrastructure::{db::connect_pool, remote_store::RemoteCommandStore, sqlite_command_store::SqliteCommandStore},
    terminal::{to_surface, SurfaceView},
};

const EXIT_FLUSH: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_logging(&config.log_file)?;

    match config.board_server_url.clone() {
        Some(url) => {
            let store = RemoteCommandStore::new(url.clone(), config.feed_capacity);
            run(store, &config, url).await
        }
        None => {
            let pool = connect_pool(&config.database_url).await?;
            let store = SqliteCommandStore::with_pool(pool, config.feed_capacity);
            store.init().await?;
            // other processes on this file only reach us through the table
            let poll = Duration::from_millis(config.board_poll_ms);
            tracing::warn!(poll_ms = config.board_poll_ms, "no BOARD_SERVER_URL; sharing the database file directly, remote strokes are polled");
            let watcher = store.watch(poll).await?;
            let res = run(store, &config, config.database_url.clone()).await;
            watcher.abort();
            res
        }
    }
}

/// The screen belongs to the board, so logs go to a file.
fn init_logging(path: &str) -> Result<()> {
    let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
    Ok(())
}

async fn run<S: CommandStore + Clone>(store: S, config: &Config, source: String) -> Result<()> {
    store.init().await?;
    let mut session = BoardSession::new(BoardService::new(store), Renderer::default(), config.board_width, config.board_height);
    session.start().await?;
    tracing::info!(%source, width = config.board_width, height = config.board_height, "board session started");

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut session, source).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if tokio::time::timeout(EXIT_FLUSH, session.flush()).await.is_err() {
        tracing::warn!(pending = session.pending_writes(), "gave up waiting for board writes on exit");
    }
    session.stop();
    res
}

struct App {
    source: String,
    canvas: Rect,
    alert: Option<BoardAlert>,
    last_tick: Instant,
}

async fn run_app<S: CommandStore + Clone>(terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>, session: &mut BoardSession<S>, source: String) -> Result<()> {
    let tick_rate = Duration::from_millis(33);
    let mut app = App { source, canvas: Rect::default(), alert: None, last_tick: Instant::now() };

    loop {
        session.apply_feed();
        if app.alert.is_none() {
            app.alert = session.take_alert();
        }

        let pending = session.pending_writes();
        let applied = session.applied();
        terminal.draw(|f| ui(f, &mut app, session.surface(), pending, applied))?;

        let timeout = tick_rate.saturating_sub(app.last_tick.elapsed());
        if event::poll(timeout)? {
            match event::read()? {
                // Only act on key presses; ignore repeats and releases
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.alert.is_some() {
                        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) { app.alert = None; }
                    } else {
                        match key.code {
                            KeyCode::Char('q') => break,
                            KeyCode::Char('c') => session.clear(),
                            _ => {}
                        }
                    }
                }
                Event::Mouse(mouse) if app.alert.is_none() => {
                    let at = to_surface(app.canvas, session.surface(), mouse.column, mouse.row);
                    match (mouse.kind, at) {
                        (MouseEventKind::Down(MouseButton::Left), Some((x, y))) => session.pointer_mut().press(x, y),
                        (MouseEventKind::Drag(MouseButton::Left), Some((x, y))) => session.pointer_mut().drag(x, y),
                        (MouseEventKind::Up(MouseButton::Left), _) => session.pointer_mut().release(),
                        _ => {}
                    }
                }
                _ => {}
            }
        }
        if app.last_tick.elapsed() >= tick_rate {
            session.draw();
            app.last_tick = Instant::now();
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &mut App, surface: &Surface, pending: usize, applied: usize) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(f.size());

    let header = Paragraph::new("Drag with the left mouse button to draw  |  c: clear board, q: quit")
        .block(Block::default().borders(Borders::ALL).title("board"));
    f.render_widget(header, chunks[0]);

    let frame = Block::default().borders(Borders::ALL).title(format!("{}x{}", surface.width(), surface.height()));
    app.canvas = frame.inner(chunks[1]);
    f.render_widget(frame, chunks[1]);
    f.render_widget(SurfaceView::new(surface), app.canvas);

    let footer = Paragraph::new(format!("store={}  |  applied={}  |  pending writes={}", app.source, applied, pending))
        .block(Block::default().borders(Borders::ALL).title("info"));
    f.render_widget(footer, chunks[2]);

    if let Some(alert) = &app.alert {
        let area = centered(f.size(), 50, 7);
        let popup = Paragraph::new(format!("{alert}\n\n(Enter to dismiss)"))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("alert").border_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)));
        f.render_widget(Clear, area);
        f.render_widget(popup, area);
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(area.x + (area.width - width) / 2, area.y + (area.height - height) / 2, width, height)
}

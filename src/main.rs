//! Quickfile launcher - interactive fuzzy file search over the daemon.
//!
//! Sets up the terminal, spawns the socket transport, and runs the main
//! event loop until the user confirms a file or cancels the session.

mod app;
mod state;
mod ui;

// Re-use modules from lib.rs (exposed for integration tests)
use quickfile_launcher::{highlight, paths, protocol, transport};

use std::io::{self, Write};
use std::panic;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{Action, App, CommandOpener, SessionOutcome};
use transport::{NullTransport, TransportHandle, TransportService};

/// Polling interval of the event loop (~60fps).
const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Global flag to track if terminal is in raw mode (for panic cleanup)
static TERMINAL_RAW: AtomicBool = AtomicBool::new(false);

/// RAII guard for terminal state management.
/// Ensures terminal is restored to normal state when dropped, even on panic or early return.
struct TerminalGuard {
    active: bool,
}

impl TerminalGuard {
    /// Initialize terminal for TUI mode (raw mode, alternate screen, mouse capture).
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        TERMINAL_RAW.store(true, Ordering::SeqCst);

        // If execute! fails, we must restore terminal state before returning error
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture) {
            let _ = disable_raw_mode();
            TERMINAL_RAW.store(false, Ordering::SeqCst);
            return Err(e.into());
        }

        Ok(Self { active: true })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.active {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
            TERMINAL_RAW.store(false, Ordering::SeqCst);
        }
    }
}

/// Install a panic hook that restores terminal state before printing panic info.
fn install_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        if TERMINAL_RAW.load(Ordering::SeqCst) {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
            let _ = io::stdout().flush();
        }
        default_hook(panic_info);
    }));
}

#[derive(Parser)]
#[command(
    name = "quickfile-launcher",
    version,
    about = "Interactive quick-launcher for the quickfile daemon"
)]
struct Cli {
    /// Override the request socket path (defaults to the per-user runtime dir).
    #[arg(long, value_name = "PATH")]
    request_socket: Option<PathBuf>,

    /// Override the response socket path (defaults to the per-user runtime dir).
    #[arg(long, value_name = "PATH")]
    response_socket: Option<PathBuf>,

    /// Program used to open the confirmed file.
    #[arg(long, value_name = "CMD", default_value = "xdg-open")]
    opener: String,
}

fn main() -> Result<()> {
    // Install panic hook FIRST for terminal safety
    install_panic_hook();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "quickfile=info".into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!("Starting quickfile launcher v{}", env!("CARGO_PKG_VERSION"));

    let transport = build_transport(&cli);
    let opener = CommandOpener::new(cli.opener.clone());
    let mut app = App::new(transport, Box::new(opener));

    // Setup terminal with RAII guard - ensures cleanup on any exit path
    let _terminal_guard = TerminalGuard::new()?;

    let stdout = io::stdout();
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    terminal.show_cursor()?;

    if let Err(e) = result {
        // Drop app first so the transport worker (and both sockets) go down,
        // then restore the terminal before reporting.
        drop(app);
        drop(_terminal_guard);
        tracing::error!("Application error: {}", e);
        eprintln!("Error: {}", e);
        return Err(e);
    }

    match app.outcome.take() {
        Some(SessionOutcome::Opened(path)) => tracing::info!("opened {path}"),
        Some(SessionOutcome::Cancelled) | None => tracing::info!("session cancelled"),
    }
    Ok(())
}

/// Build the session transport, staying offline when the runtime dir (or the
/// worker) is unavailable - the UI then just shows "Connecting…".
fn build_transport(cli: &Cli) -> Box<dyn TransportService> {
    let session = paths::session_sockets();
    let request = cli
        .request_socket
        .clone()
        .or_else(|| session.as_ref().map(|s| s.request.clone()));
    let response = cli
        .response_socket
        .clone()
        .or_else(|| session.as_ref().map(|s| s.response.clone()));

    match (request, response) {
        (Some(request), Some(response)) => match TransportHandle::spawn(request, response) {
            Ok(handle) => Box::new(handle),
            Err(e) => {
                tracing::warn!("transport unavailable: {e}");
                Box::new(NullTransport)
            }
        },
        _ => {
            tracing::warn!("per-user runtime directory unavailable; staying offline");
            Box::new(NullTransport)
        }
    }
}

/// Main application loop.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        // Transport events (non-blocking)
        app.poll_transport_events();

        // Time-based updates (query debounce)
        app.tick();

        // Only redraw if state has changed (dirty-flag optimization)
        if app.take_needs_redraw() {
            terminal.draw(|f| ui::render(f, app))?;
        }

        // Poll for events with frame-rate limiting
        if event::poll(FRAME_DURATION)? {
            match event::read()? {
                Event::Key(key) => handle_key(app, key),
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Resize(_, _) => app.mark_dirty(),
                _ => {}
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }

    match key.code {
        KeyCode::Esc => app.update(Action::Cancel),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.update(Action::Cancel)
        }
        KeyCode::Enter => app.update(Action::Confirm),
        KeyCode::Down => app.update(Action::MoveDown),
        KeyCode::Up => app.update(Action::MoveUp),
        _ => {
            if app.query_input.input(key) {
                app.on_query_edited();
            }
        }
    }
}

/// Map pointer coordinates through the last drawn list viewport.
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => {
            app.update(Action::MoveDown);
            return;
        }
        MouseEventKind::ScrollUp => {
            app.update(Action::MoveUp);
            return;
        }
        MouseEventKind::Moved | MouseEventKind::Down(MouseButton::Left) => {}
        _ => return,
    }

    let Some(area) = app.results_area else {
        return;
    };
    let inside = mouse.column >= area.x
        && mouse.column < area.x + area.width
        && mouse.row >= area.y
        && mouse.row < area.y + area.height;
    if !inside {
        return;
    }

    let row = app.results.list.offset() + (mouse.row - area.y) as usize;
    match mouse.kind {
        MouseEventKind::Moved => app.update(Action::HoverRow(row)),
        MouseEventKind::Down(MouseButton::Left) => {
            app.update(Action::HoverRow(row));
            app.update(Action::Confirm);
        }
        _ => {}
    }
}

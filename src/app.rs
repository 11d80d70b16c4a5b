//! Session state management.
//!
//! One `App` per interactive session, owned and mutated exclusively by the
//! main event loop: key/mouse events, transport events, and the debounce
//! timer all run as callbacks on that single thread, so no locking is
//! needed anywhere in here.

use std::time::Instant;

use anyhow::{Context, Result};
use ratatui::layout::Rect;
use tracing::{debug, warn};
use tui_textarea::TextArea;

use crate::protocol::{DaemonRequest, DaemonResponse};
use crate::transport::{TransportEvent, TransportService};

// Re-export state types so handlers can import everything from crate::app.
pub use crate::state::{Action, ResultsState, SessionOutcome};

/// Quiet period after the last edit before a search is dispatched.
const QUERY_DEBOUNCE_MS: u128 = 100;

/// Effect invoked on Confirm with the selected absolute path.
///
/// The real opener hands the path to an external program; tests inject a
/// recorder.
pub trait FileOpener {
    fn open(&self, path: &str) -> Result<()>;
}

/// Opens files by spawning an external command (detached).
pub struct CommandOpener {
    command: String,
}

impl CommandOpener {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for CommandOpener {
    fn default() -> Self {
        Self::new("xdg-open")
    }
}

impl FileOpener for CommandOpener {
    fn open(&self, path: &str) -> Result<()> {
        std::process::Command::new(&self.command)
            .arg(path)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .with_context(|| format!("failed to launch {} for {path}", self.command))?;
        Ok(())
    }
}

/// Main session state.
pub struct App<'a> {
    /// Flag to exit the event loop.
    pub should_quit: bool,

    /// Set by the terminal transitions (Confirm/Cancel).
    pub outcome: Option<SessionOutcome>,

    /// Query input widget.
    pub query_input: TextArea<'a>,

    /// Results and cursor.
    pub results: ResultsState,

    /// Outbound connectivity as last reported by the transport.
    pub connected: bool,

    /// Backend error message, shown in the status bar until the next
    /// successful result frame.
    pub status_message: Option<String>,

    /// Screen area of the result rows from the last draw, for mapping
    /// pointer coordinates back to rows.
    pub results_area: Option<Rect>,

    /// Dirty flag; resets to false after each draw.
    needs_redraw: bool,

    /// Text of the last search actually written to the daemon. Equal to the
    /// current text exactly when no dispatch is pending.
    last_dispatched_query: Option<String>,

    /// Timestamp of the last query edit (debounce countdown start).
    last_query_edit: Option<Instant>,

    /// Whether an edit is waiting for its quiet period to elapse.
    pending_dispatch: bool,

    /// The pre-population search has been issued.
    initial_search_sent: bool,

    transport: Box<dyn TransportService>,
    opener: Box<dyn FileOpener>,
}

impl<'a> App<'a> {
    pub fn new(transport: Box<dyn TransportService>, opener: Box<dyn FileOpener>) -> Self {
        let mut query_input = TextArea::default();
        query_input.set_placeholder_text("Type to search files");

        Self {
            should_quit: false,
            outcome: None,
            query_input,
            results: ResultsState::default(),
            connected: false,
            status_message: None,
            results_area: None,
            needs_redraw: true,
            last_dispatched_query: None,
            last_query_edit: None,
            pending_dispatch: false,
            initial_search_sent: false,
            transport,
            opener,
        }
    }

    /// Current query text (the input is single-line).
    pub fn query(&self) -> String {
        self.query_input.lines().join("")
    }

    pub fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    /// Returns whether a redraw is needed, clearing the flag.
    pub fn take_needs_redraw(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    // ===== Debounce =====

    /// Record a query edit; restarts the debounce countdown.
    pub fn on_query_edited(&mut self) {
        self.mark_dirty();
        self.last_query_edit = Some(Instant::now());
        self.pending_dispatch = true;
    }

    /// Called each frame to handle time-based updates.
    pub fn tick(&mut self) {
        if self.pending_dispatch {
            if let Some(edited_at) = self.last_query_edit {
                if edited_at.elapsed().as_millis() >= QUERY_DEBOUNCE_MS {
                    self.flush_search();
                }
            }
        }
    }

    /// Dispatch the debounced search, if anything actually changed.
    ///
    /// While disconnected nothing is sent and nothing is recorded: the text
    /// is only retried when a later edit restarts the countdown.
    fn flush_search(&mut self) {
        self.pending_dispatch = false;
        self.last_query_edit = None;

        let query = self.query();
        if self.last_dispatched_query.as_deref() == Some(query.as_str()) {
            return;
        }
        if !self.connected {
            debug!("not connected; holding query {query:?}");
            return;
        }
        self.transport.send(DaemonRequest::search(query.clone()));
        self.last_dispatched_query = Some(query);
    }

    // ===== Response correlation =====

    /// Drain transport events and fold them into session state.
    ///
    /// Responses carry no request ids; whatever frame arrives next replaces
    /// the display, even if it answers an older query than the one most
    /// recently dispatched.
    pub fn poll_transport_events(&mut self) {
        while let Some(event) = self.transport.poll_event() {
            match event {
                TransportEvent::Connectivity(connected) => {
                    self.connected = connected;
                    self.mark_dirty();
                    if connected && !self.initial_search_sent {
                        self.send_initial_search();
                    }
                }
                TransportEvent::Frame(frame) => self.on_frame(frame),
            }
        }
    }

    /// Pre-populate the list as soon as the daemon is reachable.
    fn send_initial_search(&mut self) {
        self.initial_search_sent = true;
        let query = self.query();
        self.transport.send(DaemonRequest::search(query.clone()));
        self.last_dispatched_query = Some(query);
    }

    fn on_frame(&mut self, frame: DaemonResponse) {
        match frame {
            DaemonResponse::SearchResults(body) => {
                self.results.replace(body);
                self.status_message = None;
                self.mark_dirty();
            }
            DaemonResponse::Error { message } => {
                warn!("daemon error: {message}");
                self.results.clear();
                self.status_message = Some(message);
                self.mark_dirty();
            }
            // Status and refresh acknowledgements carry nothing the list
            // shows; unknown tags are forward-compatibility no-ops.
            DaemonResponse::Status { .. }
            | DaemonResponse::RefreshComplete { .. }
            | DaemonResponse::Unknown => {}
        }
    }

    // ===== Reducer =====

    pub fn update(&mut self, action: Action) {
        match action {
            Action::MoveDown => {
                self.results.select_next();
                self.mark_dirty();
            }
            Action::MoveUp => {
                self.results.select_prev();
                self.mark_dirty();
            }
            Action::HoverRow(index) => {
                self.results.hover(index);
                self.mark_dirty();
            }
            Action::Confirm => self.confirm(),
            Action::Cancel => {
                self.outcome = Some(SessionOutcome::Cancelled);
                self.should_quit = true;
            }
        }
    }

    /// Open the selection and end the session; no-op when the list is empty.
    fn confirm(&mut self) {
        let Some(result) = self.results.selected_result() else {
            return;
        };
        let path = result.path.clone();
        if let Err(e) = self.opener.open(&path) {
            warn!("open failed for {path}: {e}");
        }
        self.outcome = Some(SessionOutcome::Opened(path));
        self.should_quit = true;
    }
}

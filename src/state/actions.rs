//! Action types for the session reducer.
//!
//! All cursor and session-lifetime transitions go through
//! `App::update(action)` so they stay explicit and testable.

/// Actions that can modify session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Move the cursor down one row (clamped to the last row).
    MoveDown,
    /// Move the cursor up one row (clamped to the first row).
    MoveUp,
    /// Pointer motion over a row sets the cursor to that row.
    HoverRow(usize),
    /// Open the selected file and end the session.
    Confirm,
    /// End the session immediately.
    Cancel,
}

/// How the session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Confirm on a valid selection; carries the opened absolute path.
    Opened(String),
    /// Escape or other cancellation.
    Cancelled,
}

//! State management module.
//!
//! Holds the reducer action types and the results/selection state that the
//! response correlator replaces wholesale and the cursor navigates.

use ratatui::widgets::ListState;

use crate::protocol::{SearchResponse, SearchResult};

pub mod actions;

pub use actions::*;

/// The complete result set currently on screen.
///
/// Replaced as a unit on every `SearchResults` frame; never merged
/// incrementally.
#[derive(Debug, Default)]
pub struct ResultsSnapshot {
    pub results: Vec<SearchResult>,
    pub total_files: usize,
}

/// Results plus cursor. The cursor is always in `[0, len)`, or 0 when the
/// list is empty.
#[derive(Debug, Default)]
pub struct ResultsState {
    pub snapshot: ResultsSnapshot,
    pub selected_index: usize,
    /// Render-side list state; kept so the viewport follows the cursor and
    /// so pointer rows can be mapped back through the scroll offset.
    pub list: ListState,
}

impl ResultsState {
    pub fn len(&self) -> usize {
        self.snapshot.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.results.is_empty()
    }

    /// Install a fresh snapshot, resetting the cursor and the viewport to
    /// the first row.
    pub fn replace(&mut self, response: SearchResponse) {
        self.snapshot = ResultsSnapshot {
            results: response.results,
            total_files: response.total_files,
        };
        self.selected_index = 0;
        self.list = ListState::default();
        if !self.is_empty() {
            self.list.select(Some(0));
        }
    }

    /// Drop all results (backend error path).
    pub fn clear(&mut self) {
        self.snapshot = ResultsSnapshot::default();
        self.selected_index = 0;
        self.list = ListState::default();
    }

    /// Move the cursor down, clamped to the last row.
    pub fn select_next(&mut self) {
        if self.is_empty() {
            return;
        }
        self.set_selected(self.selected_index.saturating_add(1).min(self.len() - 1));
    }

    /// Move the cursor up, clamped to the first row.
    pub fn select_prev(&mut self) {
        if self.is_empty() {
            return;
        }
        self.set_selected(self.selected_index.saturating_sub(1));
    }

    /// Pointer hover: set the cursor iff the row exists.
    pub fn hover(&mut self, index: usize) {
        if index < self.len() {
            self.set_selected(index);
        }
    }

    /// The result under the cursor, if any.
    pub fn selected_result(&self) -> Option<&SearchResult> {
        self.snapshot.results.get(self.selected_index)
    }

    fn set_selected(&mut self, index: usize) {
        self.selected_index = index;
        self.list.select(Some(index));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SearchResponse;

    fn response(n: usize) -> SearchResponse {
        SearchResponse {
            results: (0..n)
                .map(|i| SearchResult {
                    path: format!("/home/u/f{i}"),
                    display_path: format!("~/f{i}"),
                    matches: Vec::new(),
                    score: 0,
                })
                .collect(),
            results_count: n,
            total_files: n,
        }
    }

    #[test]
    fn cursor_clamps_at_both_ends() {
        let mut state = ResultsState::default();
        state.replace(response(3));

        for _ in 0..10 {
            state.select_next();
        }
        assert_eq!(state.selected_index, 2);

        for _ in 0..10 {
            state.select_prev();
        }
        assert_eq!(state.selected_index, 0);
    }

    #[test]
    fn cursor_is_zero_on_empty_list_and_moves_are_noops() {
        let mut state = ResultsState::default();
        state.select_next();
        state.select_prev();
        state.hover(0);
        assert_eq!(state.selected_index, 0);
        assert!(state.selected_result().is_none());
    }

    #[test]
    fn replace_resets_cursor_to_first_row() {
        let mut state = ResultsState::default();
        state.replace(response(5));
        state.select_next();
        state.select_next();
        assert_eq!(state.selected_index, 2);

        state.replace(response(4));
        assert_eq!(state.selected_index, 0);
        assert_eq!(state.list.selected(), Some(0));
        assert_eq!(state.list.offset(), 0);
    }

    #[test]
    fn hover_ignores_rows_past_the_end() {
        let mut state = ResultsState::default();
        state.replace(response(2));
        state.hover(7);
        assert_eq!(state.selected_index, 0);
        state.hover(1);
        assert_eq!(state.selected_index, 1);
    }
}

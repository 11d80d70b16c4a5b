//! UI rendering module.
//!
//! Three bands: query input, result list, status line. Result rows are
//! styled from the highlight segmentation of each display path.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use unicode_truncate::UnicodeTruncateStr;

use crate::app::App;
use crate::highlight::{segment, PathPart};

/// Main render function - called every frame.
pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .split(frame.area());

    render_query(frame, app, chunks[0]);
    render_results(frame, app, chunks[1]);
    render_status(frame, app, chunks[2]);
}

fn render_query(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Search ")
        .title_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(&app.query_input, inner);
}

fn render_results(frame: &mut Frame, app: &mut App, area: Rect) {
    let shown = app.results.len();
    let total = app.results.snapshot.total_files;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Files {shown}/{total} "))
        .title_style(Style::default().fg(Color::Cyan));

    // Remember where rows land so pointer events can be mapped back.
    let inner = block.inner(area);
    app.results_area = Some(inner);

    let items: Vec<ListItem> = app
        .results
        .snapshot
        .results
        .iter()
        .map(|result| {
            let offsets: Vec<u32> = result.matches.iter().map(|m| m.char_index).collect();
            let spans: Vec<Span> = segment(&result.display_path, &offsets)
                .into_iter()
                .map(|seg| {
                    let style = if seg.highlighted {
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD)
                    } else if seg.part == PathPart::Directory {
                        Style::default().fg(Color::DarkGray)
                    } else {
                        Style::default()
                    };
                    Span::styled(seg.text, style)
                })
                .collect();
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    frame.render_stateful_widget(list, area, &mut app.results.list);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let left = if let Some(message) = &app.status_message {
        Span::styled(message.clone(), Style::default().fg(Color::Red))
    } else if app.connected {
        Span::styled("Connected", Style::default().fg(Color::Green))
    } else {
        Span::styled("Connecting…", Style::default().fg(Color::Yellow))
    };

    let mut spans = vec![left];
    if let Some(selected) = app.results.selected_result() {
        let budget = (area.width as usize).saturating_sub(spans[0].content.len() + 3);
        if budget > 4 {
            // Truncate from the front so the filename end stays visible.
            let (shown, _) = selected.path.unicode_truncate_start(budget);
            let shown = if shown.len() < selected.path.len() {
                format!("…{shown}")
            } else {
                shown.to_string()
            };
            spans.push(Span::raw("  "));
            spans.push(Span::styled(shown, Style::default().fg(Color::DarkGray)));
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

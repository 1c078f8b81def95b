//! Engine status line and start button.

use super::border_style;
use crate::app::{App, Focus};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Renders the header panel.
///
/// The first row shows the engine state and the last engine message, the
/// second row the start button and any status message.
pub fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Synth ")
        .borders(Borders::ALL)
        .border_style(border_style(false));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Engine state + message
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Button + status
        ])
        .split(inner);

    let state = app.state();
    let engine = if state.loaded {
        Span::styled(
            " READY ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            " LOADING ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            engine,
            Span::raw("  "),
            Span::styled(
                state.message.as_str(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ])),
        rows[0],
    );

    let focused = app.focus == Focus::StartButton;
    let button_style = if focused {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let mut spans = vec![Span::styled(
        format!("[ {} ]", app.start_button().label()),
        button_style,
    )];
    if let Some((msg, _)) = &app.status_message {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            msg.as_str(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), rows[2]);
}

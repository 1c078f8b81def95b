//! Slider panel rendering.
//!
//! Each slider is one row: label, a bar showing its position, and the raw
//! value exactly as it is sent to the engine.

use super::border_style;
use crate::app::{App, Focus};
use crate::controls::Slider;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Width reserved for the slider label.
const LABEL_WIDTH: usize = 10;
/// Width reserved for the value text.
const VALUE_WIDTH: u16 = 6;

fn slider_line(slider: &Slider, focused: bool, bar_width: u16) -> Line<'static> {
    let filled = (slider.fraction() * bar_width as f64).round() as usize;
    let empty = (bar_width as usize).saturating_sub(filled);

    let marker = if focused { "> " } else { "  " };
    let label_style = if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let bar_color = if focused { Color::Cyan } else { Color::Blue };

    Line::from(vec![
        Span::styled(marker, Style::default().fg(Color::Cyan)),
        Span::styled(
            format!("{:<width$}", slider.spec().label, width = LABEL_WIDTH),
            label_style,
        ),
        Span::styled("█".repeat(filled), Style::default().fg(bar_color)),
        Span::styled("─".repeat(empty), Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!(" {:>5}", slider.raw_value()),
            Style::default().fg(Color::White),
        ),
    ])
}

/// Renders the slider panel.
///
/// Until the engine is loaded the sliders are hidden behind a waiting note.
pub fn render_controls(frame: &mut Frame, area: Rect, app: &App) {
    let focused_index = match app.focus {
        Focus::Slider(i) => Some(i),
        Focus::StartButton => None,
    };

    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(border_style(focused_index.is_some()));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if !app.state().loaded {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "Waiting for engine... press Enter on Start synth",
                Style::default().fg(Color::DarkGray),
            ))),
            inner,
        );
        return;
    }

    // marker (2) + label + value
    let bar_width = inner
        .width
        .saturating_sub(2 + LABEL_WIDTH as u16 + VALUE_WIDTH);

    let lines: Vec<Line> = app
        .controls
        .sliders()
        .iter()
        .enumerate()
        .map(|(i, slider)| slider_line(slider, focused_index == Some(i), bar_width))
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::events;
    use crate::controls::CONTROL_SPECS;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_slider_line_shows_raw_value() {
        let spec = CONTROL_SPECS[0];
        assert_eq!(spec.event, events::ATTACK);
        let slider = Slider::with_value(spec, 0.5);

        let line = text(&slider_line(&slider, false, 10));
        assert!(line.starts_with("  Attack"));
        assert!(line.contains("█████─────"));
        assert!(line.ends_with("  0.5"));
    }

    #[test]
    fn test_focused_slider_has_marker() {
        let slider = Slider::new(CONTROL_SPECS[6]);
        let line = text(&slider_line(&slider, true, 4));
        assert!(line.starts_with("> FM"));
        assert!(line.contains("────"));
    }
}

//! Keyboard display.
//!
//! Draws the 24 keys as a row of colored cells with note names underneath,
//! highlighting the key of the note the engine last reported.

use super::border_style;
use crate::app::App;
use crate::keyboard::KEY_COUNT;
use crate::midi::{is_black_key, note_to_name};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Background of the selected key. Used by nothing else on the panel.
pub const SELECTED_KEY_COLOR: Color = Color::LightRed;

fn key_style(note: u8, selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(Color::Black)
            .bg(SELECTED_KEY_COLOR)
            .add_modifier(Modifier::BOLD)
    } else if is_black_key(note) {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Black).bg(Color::White)
    }
}

/// Builds the key row and the name row for the given key width.
fn build_rows(
    keys: &[u8],
    selected: Option<usize>,
    key_width: usize,
) -> (Line<'static>, Line<'static>) {
    let mut key_row = Vec::with_capacity(keys.len() * 2);
    let mut name_row = Vec::with_capacity(keys.len());

    for (i, &note) in keys.iter().enumerate() {
        let is_selected = selected == Some(i);
        // One column of gap between keys when there is room for it.
        let body = key_width.saturating_sub(1).max(1);
        key_row.push(Span::styled(" ".repeat(body), key_style(note, is_selected)));
        if key_width > 1 {
            key_row.push(Span::raw(" "));
        }

        let mut name = note_to_name(note);
        name.truncate(key_width);
        let name_style = if is_selected {
            Style::default()
                .fg(SELECTED_KEY_COLOR)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        name_row.push(Span::styled(
            format!("{:<width$}", name, width = key_width),
            name_style,
        ));
    }

    (Line::from(key_row), Line::from(name_row))
}

/// Renders the keyboard panel.
pub fn render_keyboard(frame: &mut Frame, area: Rect, app: &App) {
    let current = app
        .state()
        .current_note
        .map(|n| format!("{} ({})", note_to_name(n), n))
        .unwrap_or_else(|| "-".to_string());

    let block = Block::default()
        .title(format!(" Keyboard (Note: {}) ", current))
        .borders(Borders::ALL)
        .border_style(border_style(false));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let key_width = (inner.width as usize / KEY_COUNT).max(1);
    let (key_row, name_row) = build_rows(&app.keys(), app.selected_key(), key_width);

    frame.render_widget(
        Paragraph::new(key_row),
        Rect::new(inner.x, inner.y, inner.width, 1),
    );
    if inner.height >= 2 {
        frame.render_widget(
            Paragraph::new(name_row),
            Rect::new(inner.x, inner.y + 1, inner.width, 1),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{events, EventBus};
    use crate::config::Config;
    use crate::midi::MidiNote;
    use crate::ui::KEYBOARD_HEIGHT;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    /// Width giving every key four columns: three of body plus a gap.
    const WIDTH: u16 = KEY_COUNT as u16 * 4 + 2;

    fn selected_key_columns(app: &App) -> Vec<u16> {
        let mut terminal = Terminal::new(TestBackend::new(WIDTH, KEYBOARD_HEIGHT)).unwrap();
        terminal
            .draw(|f| render_keyboard(f, f.area(), app))
            .unwrap();

        let buffer = terminal.backend().buffer();
        // Key row is the first row inside the border.
        (0..WIDTH)
            .filter(|&x| buffer[(x, 1)].bg == SELECTED_KEY_COLOR)
            .collect()
    }

    #[test]
    fn test_each_note_highlights_exactly_one_key() {
        let bus = EventBus::new();
        let mut app = App::mount(bus.clone(), &Config::default()).unwrap();

        for n in 60..=83u8 {
            bus.emit(events::MESSAGE, MidiNote::new(n, 100)).unwrap();
            app.pump_events();

            let key = (n - 60) as u16;
            let start = 1 + key * 4;
            assert_eq!(
                selected_key_columns(&app),
                vec![start, start + 1, start + 2],
                "note {}",
                n
            );
        }
    }

    #[test]
    fn test_no_highlight_without_note() {
        let app = App::mount(EventBus::new(), &Config::default()).unwrap();
        assert!(selected_key_columns(&app).is_empty());
    }

    #[test]
    fn test_note_outside_keyboard_highlights_nothing() {
        let bus = EventBus::new();
        let mut app = App::mount(bus.clone(), &Config::default()).unwrap();
        bus.emit(events::MESSAGE, MidiNote::new(32, 100)).unwrap();
        app.pump_events();
        assert_eq!(app.state().current_note, Some(32));
        assert!(selected_key_columns(&app).is_empty());
    }

    #[test]
    fn test_name_row() {
        let keys = crate::keyboard::keys(Some(60));
        let (_, names) = build_rows(&keys, Some(1), 4);
        let text: String = names.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.starts_with("C4  C#4 D4  "));
        assert_eq!(names.spans[1].style.fg, Some(SELECTED_KEY_COLOR));
    }
}

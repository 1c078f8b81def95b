//! Terminal user interface components.
//!
//! This module renders the panel: the engine status and start button at the
//! top, the sliders in the middle and the keyboard display at the bottom.

mod controls;
mod header;
mod keyboard;

use crate::app::App;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::Frame;

pub use controls::render_controls;
pub use header::render_header;
pub use keyboard::render_keyboard;

/// Height of the keyboard panel: border, key row, name row, border.
pub const KEYBOARD_HEIGHT: u16 = 4;

/// Border style shared by every panel.
fn border_style(focused: bool) -> Style {
    Style::default().fg(if focused { Color::Cyan } else { Color::Gray })
}

/// Splits the screen into header, controls and keyboard areas.
fn calculate_layout(size: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),               // Status + start button
            Constraint::Min(4),                  // Sliders
            Constraint::Length(KEYBOARD_HEIGHT), // Keyboard
        ])
        .split(size);
    [chunks[0], chunks[1], chunks[2]]
}

/// Renders the complete panel.
pub fn render(frame: &mut Frame, app: &App) {
    let [header, controls, keyboard] = calculate_layout(frame.area());
    render_header(frame, header, app);
    render_controls(frame, controls, app);
    render_keyboard(frame, keyboard, app);
}

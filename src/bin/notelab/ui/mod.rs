//! TUI layout: waveform and spectrum on top, the keyboard in the middle,
//! envelope controls at the bottom.

mod controls;
mod keyboard;
pub mod spectrum;
mod waveform;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(5),
            Constraint::Length(5),
        ])
        .split(frame.area());

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[0]);

    waveform::render_waveform(frame, top[0], &app.wave_window);
    spectrum::render_spectrum(frame, top[1], app.spectrum.data());
    keyboard::render_keyboard(frame, rows[1], app);
    controls::render_controls(frame, rows[2], app);
}

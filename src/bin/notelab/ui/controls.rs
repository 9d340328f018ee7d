//! Envelope profile panel: the live values, which one the arrows edit, and
//! the key help line.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{AdsrParam, App};

pub fn render_controls(frame: &mut Frame, area: Rect, app: &App) {
    let profile = app.profile();

    let mut param_line: Vec<Span> = Vec::new();
    for param in AdsrParam::ALL {
        let value = match param {
            AdsrParam::Attack => format!("{:.2}s", profile.attack),
            AdsrParam::Decay => format!("{:.2}s", profile.decay),
            AdsrParam::Sustain => format!("{:.0}%", profile.sustain * 100.0),
            AdsrParam::Release => format!("{:.2}s", profile.release),
        };

        let style = if param == app.selected {
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        param_line.push(Span::styled(format!("{} {value}", param.label()), style));
        param_line.push(Span::raw("   "));
    }

    let waveform_line = Line::from(vec![
        Span::raw("waveform "),
        Span::styled(
            app.waveform().label(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
    ]);

    let help_line = Line::from(Span::styled(
        "tab/arrows edit envelope · space waveform · a-k play · q quit",
        Style::default().fg(Color::DarkGray),
    ));

    let paragraph = Paragraph::new(vec![Line::from(param_line), waveform_line, help_line])
        .block(Block::default().title(" Envelope ").borders(Borders::ALL));

    frame.render_widget(paragraph, area);
}

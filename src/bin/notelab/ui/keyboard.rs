//! One-octave piano row with held keys lit up.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::App;

const CELL: usize = 6;

pub fn render_keyboard(frame: &mut Frame, area: Rect, app: &App) {
    // Black keys sit between the naturals; place each over the gap after
    // its left neighbour's cell
    let mut black_styles: Vec<(usize, Span)> = Vec::new();
    let mut white_line: Vec<Span> = Vec::new();
    let mut hint_line: Vec<Span> = Vec::new();

    let mut white_index = 0usize;
    for binding in &app.bindings {
        let held = app.is_key_held(binding.key);
        if binding.is_black {
            let col = white_index * CELL - 2;
            let label = format!("{:^4}", binding.note.as_str());
            let style = key_style(held, true);
            black_styles.push((col, Span::styled(label, style)));
        } else {
            let style = key_style(held, false);
            white_line.push(Span::styled(
                format!("{:^width$}", binding.note.as_str(), width = CELL),
                style,
            ));
            hint_line.push(Span::styled(
                format!("{:^width$}", binding.key.to_ascii_uppercase(), width = CELL),
                Style::default().fg(Color::DarkGray),
            ));
            white_index += 1;
        }
    }

    // Assemble the black-key line from plain gaps and styled labels
    let mut black_line: Vec<Span> = Vec::new();
    let mut cursor = 0usize;
    for (col, span) in black_styles {
        if col > cursor {
            black_line.push(Span::raw(" ".repeat(col - cursor)));
        }
        cursor = col + span.content.len();
        black_line.push(span);
    }

    let paragraph = Paragraph::new(vec![
        Line::from(black_line),
        Line::from(white_line),
        Line::from(hint_line),
    ])
    .block(Block::default().title(" Keyboard ").borders(Borders::ALL));

    frame.render_widget(paragraph, area);
}

fn key_style(held: bool, is_black: bool) -> Style {
    let base = if is_black {
        Style::default().fg(Color::White).bg(Color::Black)
    } else {
        Style::default().fg(Color::Black).bg(Color::Gray)
    };

    if held {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Magenta)
            .add_modifier(Modifier::BOLD)
    } else {
        base
    }
}

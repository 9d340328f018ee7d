//! Oscilloscope view of the analysis tap.

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType};
use ratatui::Frame;

pub fn render_waveform(frame: &mut Frame, area: Rect, samples: &[f32]) {
    let data: Vec<(f64, f64)> = samples
        .iter()
        .enumerate()
        .map(|(i, &s)| (i as f64 / samples.len().max(1) as f64, f64::from(s)))
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Magenta))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(" Waveform ").borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-1.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}

//! FFT spectrum of the analysis tap, on log-spaced frequency bins.

use std::sync::Arc;

use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::symbols;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType};
use ratatui::Frame;
use rustfft::{num_complex::Complex, Fft, FftPlanner};

/// Displayed frequency bins.
const BINS: usize = 48;
const MIN_FREQ: f64 = 30.0;
const FLOOR_DB: f64 = -90.0;

pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    /// Hann coefficients, one per input sample.
    window: Vec<f32>,
    scratch: Vec<Complex<f32>>,
    /// FFT bin index feeding each displayed bin.
    bin_indices: Vec<usize>,
    /// (frequency Hz, magnitude dB) per displayed bin.
    bins: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    pub fn new(fft_len: usize, sample_rate: f32) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(fft_len);

        let denom = (fft_len.max(2) - 1) as f32;
        let window: Vec<f32> = (0..fft_len)
            .map(|i| 0.5 * (1.0 - (std::f32::consts::TAU * i as f32 / denom).cos()))
            .collect();

        // Log spacing from MIN_FREQ up to Nyquist
        let nyquist = f64::from(sample_rate) / 2.0;
        let ratio = (nyquist / MIN_FREQ).max(1.0);
        let half = (fft_len / 2).max(1);

        let mut bin_indices = Vec::with_capacity(BINS);
        let mut bins = Vec::with_capacity(BINS);
        for i in 0..BINS {
            let t = i as f64 / (BINS - 1) as f64;
            let freq = MIN_FREQ * ratio.powf(t);
            let index = ((freq * fft_len as f64 / f64::from(sample_rate)) as usize).min(half - 1);
            bin_indices.push(index);
            bins.push((freq, FLOOR_DB));
        }

        Self {
            fft,
            window,
            scratch: vec![Complex::new(0.0, 0.0); fft_len],
            bin_indices,
            bins,
        }
    }

    pub fn update(&mut self, samples: &[f32]) {
        if samples.len() != self.window.len() {
            return;
        }

        for (slot, (&s, &w)) in self
            .scratch
            .iter_mut()
            .zip(samples.iter().zip(self.window.iter()))
        {
            slot.re = s * w;
            slot.im = 0.0;
        }

        self.fft.process(&mut self.scratch);

        for (bin, &index) in self.bins.iter_mut().zip(self.bin_indices.iter()) {
            let c = self.scratch[index];
            let power = f64::from(c.re * c.re + c.im * c.im).max(1e-12);
            bin.1 = (10.0 * power.log10()).max(FLOOR_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.bins
    }
}

pub fn render_spectrum(frame: &mut Frame, area: Rect, bins: &[(f64, f64)]) {
    // Plot against bin rank so the log spacing reads evenly
    let data: Vec<(f64, f64)> = bins
        .iter()
        .enumerate()
        .map(|(i, &(_, db))| (i as f64, db))
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(Block::default().title(" Spectrum ").borders(Borders::ALL))
        .x_axis(
            Axis::default()
                .bounds([0.0, (bins.len().max(2) - 1) as f64])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, 0.0])
                .labels(["-90", "-45", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}

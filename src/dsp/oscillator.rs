use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Waveform rendered by an [`Oscillator`].
///
/// Sine is the default voice timbre; the other shapes add harmonics for
/// brighter or hollower tones.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Saw,
    Triangle,
}

impl Waveform {
    /// Cycle to the next waveform (UI convenience).
    pub fn next(self) -> Self {
        match self {
            Waveform::Sine => Waveform::Square,
            Waveform::Square => Waveform::Saw,
            Waveform::Saw => Waveform::Triangle,
            Waveform::Triangle => Waveform::Sine,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Saw => "saw",
            Waveform::Triangle => "triangle",
        }
    }
}

/// Phase-accumulator oscillator.
///
/// Phase runs 0..1 over one waveform cycle and advances by
/// `frequency / sample_rate` per sample, so output sample `n` of a sine at
/// frequency `f` is `sin(TAU * f * n / sample_rate)`.
pub struct Oscillator {
    waveform: Waveform,
    sample_rate: f32,
    phase: f32,
}

impl Oscillator {
    pub fn new(waveform: Waveform, sample_rate: f32) -> Self {
        Self {
            waveform,
            sample_rate,
            phase: 0.0,
        }
    }

    /// Produce the sample at the current phase, then advance.
    pub fn next_sample(&mut self, frequency: f32) -> f32 {
        let p = self.phase;
        let out = match self.waveform {
            Waveform::Sine => (TAU * p).sin(),
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Saw => 2.0 * p - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
        };

        self.phase += frequency / self.sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        out
    }

    /// Fill a block with oscillator output at a fixed frequency.
    pub fn render(&mut self, out: &mut [f32], frequency: f32) {
        for sample in out.iter_mut() {
            *sample = self.next_sample(frequency);
        }
    }
}

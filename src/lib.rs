pub mod dsp;
pub mod engine; // Engine facade, lifecycle, output routing
pub mod synth; // Per-note voices and the registry that owns them

pub use dsp::envelope::{EnvelopeProfile, PEAK_LEVEL};
pub use dsp::oscillator::Waveform;
pub use engine::bus::AnalysisTap;
pub use engine::lifecycle::EngineState;
#[cfg(feature = "rtrb")]
pub use engine::SynthEngine;
pub use engine::{EngineConfig, EngineError};
pub use synth::note::NoteId;

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;

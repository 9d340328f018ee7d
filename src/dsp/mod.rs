//! Allocation-free, realtime-safe DSP primitives.
//!
//! Everything in here is plain per-sample math with no locking and no heap
//! traffic, so the types can live inside voice structs that run on the audio
//! callback. Orchestration (who owns which voice, when ramps are issued)
//! belongs to the `synth` layer.

/// Buffer multiply and gain helpers.
pub mod amplify;
/// Attack/decay/sustain/release amplitude envelope.
pub mod envelope;
/// Phase-accumulator oscillator with selectable waveform.
pub mod oscillator;

pub use envelope::EnvelopeStage;

//! Engine facade: owns the platform audio stream, the control→audio message
//! queue, and the lifecycle state machine.
//!
//! The control thread calls `start`/`stop`/`resume` here; the actual
//! envelope and waveform math runs inside the cpal callback, fed through a
//! lock-free ring buffer. No call on this facade ever blocks on the
//! rendering thread.

pub mod bus;
pub mod lifecycle;

use std::fmt;

#[cfg(feature = "rtrb")]
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::dsp::envelope::EnvelopeProfile;
use crate::dsp::oscillator::Waveform;
#[cfg(feature = "rtrb")]
use crate::engine::bus::{AnalysisTap, MasterBus};
#[cfg(feature = "rtrb")]
use crate::engine::lifecycle::EngineState;
#[cfg(feature = "rtrb")]
use crate::synth::message::{EngineMessage, NoteOn};
#[cfg(feature = "rtrb")]
use crate::synth::note::NoteId;
#[cfg(feature = "rtrb")]
use crate::synth::registry::VoiceRegistry;
#[cfg(feature = "rtrb")]
use crate::MAX_BLOCK_SIZE;

/// Construction-time settings. Everything else is adjusted live through the
/// facade.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Gain applied at the master bus after voices are summed.
    pub master_gain: f32,
    /// Capacity of the control→audio message queue.
    pub queue_capacity: usize,
    /// Initial envelope profile.
    pub profile: EnvelopeProfile,
    /// Initial voice waveform.
    pub waveform: Waveform,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            master_gain: 1.0,
            queue_capacity: 64,
            profile: EnvelopeProfile::default(),
            waveform: Waveform::default(),
        }
    }
}

/// The one failure class that is surfaced rather than swallowed: the
/// platform refused to give us an output stream at all.
#[derive(Debug)]
pub enum EngineError {
    NoOutputDevice,
    DeviceConfig(cpal::DefaultStreamConfigError),
    BuildStream(cpal::BuildStreamError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::NoOutputDevice => write!(f, "no default audio output device"),
            EngineError::DeviceConfig(e) => write!(f, "failed to query output config: {e}"),
            EngineError::BuildStream(e) => write!(f, "failed to build output stream: {e}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::NoOutputDevice => None,
            EngineError::DeviceConfig(e) => Some(e),
            EngineError::BuildStream(e) => Some(e),
        }
    }
}

/// Facade over the whole engine: voice registry on the audio thread, master
/// bus, analysis tap, and lifecycle.
#[cfg(feature = "rtrb")]
pub struct SynthEngine {
    state: EngineState,
    stream: Option<cpal::Stream>,
    tx: rtrb::Producer<EngineMessage>,
    tap: AnalysisTap,
    profile: EnvelopeProfile,
    waveform: Waveform,
    sample_rate: f32,
}

#[cfg(feature = "rtrb")]
impl SynthEngine {
    /// Allocate the audio stream and start rendering. Returns `Running`, or
    /// `Suspended` when the platform defers playback until an explicit
    /// [`resume`](Self::resume) — both are valid starting states.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(EngineError::NoOutputDevice)?;
        let stream_config = device
            .default_output_config()
            .map_err(EngineError::DeviceConfig)?;

        let sample_rate = stream_config.sample_rate().0 as f32;
        let channels = stream_config.channels() as usize;

        let (tx, rx) = rtrb::RingBuffer::<EngineMessage>::new(config.queue_capacity);
        let mut registry = VoiceRegistry::new(sample_rate, rx);
        let mut bus = MasterBus::new(config.master_gain);
        let tap = bus.tap();

        let mut block = vec![0.0f32; MAX_BLOCK_SIZE];
        let stream = device
            .build_output_stream(
                &stream_config.into(),
                move |data: &mut [f32], _| {
                    let frames = data.len() / channels;
                    let mut written = 0;

                    while written < frames {
                        let n = (frames - written).min(MAX_BLOCK_SIZE);
                        let chunk = &mut block[..n];
                        registry.render_block(chunk);

                        let out = &mut data[written * channels..(written + n) * channels];
                        bus.route(chunk, out, channels);

                        written += n;
                    }
                },
                |err| tracing::error!(%err, "audio stream error"),
                None,
            )
            .map_err(EngineError::BuildStream)?;

        let state = match stream.play() {
            Ok(()) => EngineState::Running,
            // Some hosts refuse playback until a user-gesture-driven resume
            Err(_) => EngineState::Suspended,
        };

        tracing::info!(sample_rate, channels, ?state, "engine initialized");

        Ok(Self {
            state,
            stream: Some(stream),
            tx,
            tap,
            profile: config.profile,
            waveform: config.waveform,
            sample_rate,
        })
    }

    /// Start a note. No-op if the engine is not initialized, is closed, the
    /// frequency is not positive, or the note is already sounding (the
    /// registry suppresses retriggers).
    ///
    /// The current profile's attack/decay/sustain are observed here, at
    /// this instant; later profile edits do not affect this note's attack
    /// or decay.
    pub fn start(&mut self, note: &NoteId, frequency: f32) {
        if !self.state.accepts_notes() || !(frequency > 0.0) {
            return;
        }

        tracing::debug!(%note, frequency, "note start");
        let _ = self.tx.push(EngineMessage::NoteOn(NoteOn {
            note: note.clone(),
            frequency,
            waveform: self.waveform,
            attack: self.profile.attack,
            decay: self.profile.decay,
            sustain: self.profile.sustain,
        }));
    }

    /// Release a note, observing the profile's release duration at this
    /// instant. No-op for unknown notes or when the engine is not running.
    pub fn stop(&mut self, note: &NoteId) {
        if !self.state.accepts_notes() {
            return;
        }

        tracing::debug!(%note, "note stop");
        let _ = self.tx.push(EngineMessage::NoteOff {
            note: note.clone(),
            release: self.profile.release,
        });
    }

    /// Ensure the stream is playing. Safe to call any number of times and
    /// from any state; only Suspended actually does anything.
    pub fn resume(&mut self) {
        if self.state == EngineState::Suspended {
            let Some(stream) = &self.stream else { return };
            if stream.play().is_err() {
                return;
            }
            tracing::info!("engine resumed");
        }
        self.state = self.state.on_resume();
    }

    /// Tear down: silence every voice, drop the stream, enter `Closed`.
    /// Irreversible; all later calls are no-ops.
    pub fn close(&mut self) {
        if self.state == EngineState::Closed {
            return;
        }

        let _ = self.tx.push(EngineMessage::ForceStopAll);
        if let Some(stream) = self.stream.take() {
            let _ = stream.pause();
        }
        self.state = self.state.on_close();
        tracing::info!("engine closed");
    }

    /// Read handle onto the mixed output, or `None` once the engine is
    /// closed.
    pub fn analysis_tap(&self) -> Option<AnalysisTap> {
        if self.state == EngineState::Closed {
            None
        } else {
            Some(self.tap.clone())
        }
    }

    /// Replace the live envelope profile. Notes already sounding keep the
    /// stages they have scheduled; the new values apply at each note's next
    /// start or stop.
    pub fn set_profile(&mut self, profile: EnvelopeProfile) {
        self.profile = profile;
    }

    pub fn profile(&self) -> EnvelopeProfile {
        self.profile
    }

    /// Waveform for subsequently started notes.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

#[cfg(feature = "rtrb")]
impl Drop for SynthEngine {
    fn drop(&mut self) {
        self.close();
    }
}

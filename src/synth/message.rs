#[cfg(feature = "rtrb")]
use rtrb::Consumer;

use crate::dsp::oscillator::Waveform;
use crate::synth::note::NoteId;

/// Everything the audio thread needs to start a note.
///
/// The envelope timing fields are the values of the profile *at the instant
/// the control thread issued the start* — the registry never reaches back
/// into shared config. The release duration is deliberately absent: it is
/// observed when the matching `NoteOff` is issued.
#[derive(Debug, Clone)]
pub struct NoteOn {
    pub note: NoteId,
    pub frequency: f32,
    pub waveform: Waveform,
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
}

/// Control-plane instruction consumed by the registry on the audio thread.
#[derive(Debug, Clone)]
pub enum EngineMessage {
    NoteOn(NoteOn),
    NoteOff { note: NoteId, release: f32 },
    /// Teardown only: silence and drop every voice immediately.
    ForceStopAll,
}

/// Source of engine messages, abstracted so the registry renders the same
/// whether it is fed by a lock-free ring buffer or driven directly.
pub trait MessageReceiver {
    fn pop(&mut self) -> Option<EngineMessage>;
}

#[cfg(feature = "rtrb")]
impl MessageReceiver for Consumer<EngineMessage> {
    fn pop(&mut self) -> Option<EngineMessage> {
        Consumer::pop(self).ok()
    }
}

/// No message source at all. Used when the registry is driven through its
/// direct methods (tests, offline rendering).
impl MessageReceiver for () {
    fn pop(&mut self) -> Option<EngineMessage> {
        None
    }
}

impl MessageReceiver for std::collections::VecDeque<EngineMessage> {
    fn pop(&mut self) -> Option<EngineMessage> {
        self.pop_front()
    }
}

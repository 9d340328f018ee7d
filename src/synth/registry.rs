use std::collections::HashMap;

use crate::synth::message::{EngineMessage, MessageReceiver, NoteOn};
use crate::synth::note::NoteId;
use crate::synth::voice::Voice;
use crate::MAX_BLOCK_SIZE;

/*
Voice Registry
==============

The registry is the authority on "is this note currently sounding". It owns
every live voice, keyed by note identity, and enforces the per-note
lifecycle:

  start  →  at most one voice per note. A start for a note whose voice is
            still held is dropped (retrigger suppression). A start for a
            note whose voice is already releasing detaches that voice into
            the drain pool — it keeps fading on its own schedule — and
            registers a fresh voice under the key.

  stop   →  the held voice begins its release and STAYS registered while it
            drains. Removal happens in `render_block`, on the exact block in
            which the release ramp elapses, never earlier. Stopping a note
            with no held voice is a no-op.

Voice removal is a deliberate, scheduled action tied to the envelope
reaching idle; nothing here is reclaimed "whenever unreferenced".

Messages come in through a `MessageReceiver` and are drained at the top of
every `render_block`, so all registry mutation happens on the rendering
thread with no locking. The direct methods (`note_on`, `note_off`,
`force_stop_all`) are the same operations for callers that own the registry
outright — offline rendering and tests.
*/

/// Sizing hint: one octave of keys plus headroom for draining voices.
const VOICE_CAPACITY: usize = 32;

pub struct VoiceRegistry<R: MessageReceiver> {
    voices: HashMap<NoteId, Voice>,
    /// Former voices detached by a restart, fading out independently.
    draining: Vec<Voice>,
    rx: R,
    sample_rate: f32,
    signal_buf: Vec<f32>,
    scratch_buf: Vec<f32>,
    /// Frames rendered since construction; stamps voice age.
    frame_clock: u64,
}

impl<R: MessageReceiver> VoiceRegistry<R> {
    pub fn new(sample_rate: f32, rx: R) -> Self {
        Self {
            voices: HashMap::with_capacity(VOICE_CAPACITY),
            draining: Vec::with_capacity(VOICE_CAPACITY / 4),
            rx,
            sample_rate,
            signal_buf: vec![0.0; MAX_BLOCK_SIZE],
            scratch_buf: vec![0.0; MAX_BLOCK_SIZE],
            frame_clock: 0,
        }
    }

    /// Drain pending messages, mix every voice into `out`, and reap voices
    /// whose release has elapsed. `out` must not exceed `MAX_BLOCK_SIZE`.
    pub fn render_block(&mut self, out: &mut [f32]) {
        debug_assert!(out.len() <= MAX_BLOCK_SIZE);

        while let Some(msg) = self.rx.pop() {
            match msg {
                EngineMessage::NoteOn(params) => self.note_on(params),
                EngineMessage::NoteOff { note, release } => self.note_off(&note, release),
                EngineMessage::ForceStopAll => self.force_stop_all(),
            }
        }

        out.fill(0.0);
        let len = out.len();

        for voice in self.voices.values_mut().chain(self.draining.iter_mut()) {
            let signal = &mut self.signal_buf[..len];
            let scratch = &mut self.scratch_buf[..len];
            voice.render(signal, scratch);

            for (o, &s) in out.iter_mut().zip(signal.iter()) {
                *o += s;
            }
        }

        self.voices.retain(|_, v| !v.is_finished());
        self.draining.retain(|v| !v.is_finished());

        self.frame_clock += len as u64;
    }

    /// Register a fresh voice for the note, unless one is still held.
    pub fn note_on(&mut self, params: NoteOn) {
        match self.voices.get(&params.note) {
            // Still held: suppress the retrigger, keep the existing voice
            Some(voice) if voice.is_held() => return,
            // Releasing: the key is free again; detach the old voice so it
            // finishes its fade on its own schedule
            Some(_) => {
                if let Some(old) = self.voices.remove(&params.note) {
                    self.draining.push(old);
                }
            }
            None => {}
        }

        let note = params.note.clone();
        let voice = Voice::start(params, self.sample_rate, self.frame_clock);
        self.voices.insert(note, voice);
    }

    /// Begin the release of a held voice. Unknown or already-releasing
    /// notes are left alone.
    pub fn note_off(&mut self, note: &NoteId, release: f32) {
        if let Some(voice) = self.voices.get_mut(note) {
            voice.release(release);
        }
    }

    /// Immediately drop every voice regardless of envelope stage. Only the
    /// engine teardown path calls this.
    pub fn force_stop_all(&mut self) {
        self.voices.clear();
        self.draining.clear();
    }

    /// Number of registered voices, held and draining alike.
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    /// Detached voices still fading after a restart.
    pub fn draining_count(&self) -> usize {
        self.draining.len()
    }

    /// Whether a voice is registered for the note (held or releasing).
    pub fn is_sounding(&self, note: &NoteId) -> bool {
        self.voices.contains_key(note)
    }

    /// Whether the note's voice is held (attack/decay/sustain).
    pub fn is_held(&self, note: &NoteId) -> bool {
        self.voices.get(note).is_some_and(Voice::is_held)
    }

    pub fn envelope_level(&self, note: &NoteId) -> Option<f32> {
        self.voices.get(note).map(Voice::envelope_level)
    }

    pub fn frame_clock(&self) -> u64 {
        self.frame_clock
    }
}

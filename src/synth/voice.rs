use crate::dsp::amplify;
use crate::dsp::envelope::Envelope;
use crate::dsp::oscillator::Oscillator;
use crate::synth::message::NoteOn;
use crate::synth::note::NoteId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    /// Note is held: envelope in attack, decay, or sustain.
    Held,
    /// Note was released: envelope draining to silence.
    Releasing,
}

/// One sounding note: an oscillator plus the envelope shaping it, bound to
/// a single note identity and frequency for its whole lifetime.
pub struct Voice {
    note: NoteId,
    frequency: f32,
    state: VoiceState,
    age: u64,
    osc: Oscillator,
    env: Envelope,
}

impl Voice {
    /// Construct and immediately trigger. A voice only exists because a
    /// start was accepted, so there is no un-triggered state.
    pub fn start(params: NoteOn, sample_rate: f32, age: u64) -> Self {
        let mut env = Envelope::new(sample_rate);
        env.trigger(params.attack, params.decay, params.sustain);

        Self {
            note: params.note,
            frequency: params.frequency,
            state: VoiceState::Held,
            age,
            osc: Oscillator::new(params.waveform, sample_rate),
            env,
        }
    }

    /// Begin draining to silence over `release` seconds. Only a held voice
    /// reacts; releasing an already-draining voice would restart its fade.
    pub fn release(&mut self, release: f32) {
        if self.state == VoiceState::Held {
            self.state = VoiceState::Releasing;
            self.env.trigger_release(release);
        }
    }

    /// Render one block into `signal`, using `scratch` for the envelope.
    /// Both slices must be the same length.
    pub fn render(&mut self, signal: &mut [f32], scratch: &mut [f32]) {
        self.osc.render(signal, self.frequency);
        self.env.render(scratch);
        amplify::multiply_in_place(signal, scratch);
    }

    /// True once the release ramp has fully elapsed. Never true for a held
    /// voice, regardless of level.
    pub fn is_finished(&self) -> bool {
        self.state == VoiceState::Releasing && !self.env.is_active()
    }

    pub fn is_held(&self) -> bool {
        self.state == VoiceState::Held
    }

    pub fn note(&self) -> &NoteId {
        &self.note
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn envelope_level(&self) -> f32 {
        self.env.level()
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn state(&self) -> VoiceState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::Waveform;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn params(note: &str) -> NoteOn {
        NoteOn {
            note: NoteId::from(note),
            frequency: 261.63,
            waveform: Waveform::Sine,
            attack: 0.02,
            decay: 0.1,
            sustain: 0.7,
        }
    }

    fn render_samples(voice: &mut Voice, samples: usize) {
        let mut signal = [0.0f32];
        let mut scratch = [0.0f32];
        for _ in 0..samples {
            voice.render(&mut signal, &mut scratch);
        }
    }

    #[test]
    fn starts_held_and_triggered() {
        let voice = Voice::start(params("C4"), SAMPLE_RATE, 0);
        assert!(voice.is_held());
        assert!(!voice.is_finished());
    }

    #[test]
    fn finishes_exactly_when_release_elapses() {
        let mut voice = Voice::start(params("C4"), SAMPLE_RATE, 0);
        render_samples(&mut voice, 50);

        voice.release(0.3);
        assert!(!voice.is_held());

        render_samples(&mut voice, 299);
        assert!(!voice.is_finished(), "fade must not be truncated early");

        render_samples(&mut voice, 1);
        assert!(voice.is_finished());
    }

    #[test]
    fn double_release_does_not_restart_the_fade() {
        let mut voice = Voice::start(params("C4"), SAMPLE_RATE, 0);
        render_samples(&mut voice, 50);

        voice.release(0.05);
        render_samples(&mut voice, 40);
        let level_before = voice.envelope_level();

        // A second release with a long duration must be ignored
        voice.release(2.0);
        render_samples(&mut voice, 10);
        assert!(voice.is_finished());
        assert!(voice.envelope_level() <= level_before);
    }

    #[test]
    fn held_voice_never_finishes() {
        let mut voice = Voice::start(params("A4"), SAMPLE_RATE, 0);
        render_samples(&mut voice, 5_000);
        assert!(!voice.is_finished());
        assert!(voice.is_held());
    }
}

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::MIN_TIME;

/*
ADSR Amplitude Envelope
=======================

Every sounding note is shaped by a four-stage linear envelope:

  Level
  PEAK ┐     ╱╲
       │    ╱  ╲__________
  sus  │   ╱              ╲
       │  ╱                ╲
   0.0 └─╱──────────────────╲──→ Time
        Attack Decay Sustain Release

Attack ramps from zero to PEAK_LEVEL, decay settles onto the sustain level
(PEAK_LEVEL × sustain), sustain holds with no pending ramp until the note is
released, and release ramps from wherever the level currently sits down to
zero. All ramps are linear.

Two details carry the correctness weight:

  1. Release starts from the CURRENT level, not the sustain level. A note
     released mid-attack or mid-decay must not jump — any discontinuity in
     the gain curve is audible as a click. `trigger_release` snapshots the
     live level and interpolates from that snapshot to exactly 0.0 over a
     pre-computed sample count.

  2. The envelope observes its timing parameters at two instants only:
     attack/decay/sustain arrive with `trigger`, the release duration
     arrives with `trigger_release`. A profile edit between those instants
     affects exactly the stages that have not been scheduled yet.

Per-sample increments are derived as

    increment = target_change / (time_seconds * sample_rate)

so a stage of T seconds lands on its target after T * sample_rate samples.
*/

/// Peak amplitude reached at the end of attack. Kept well below full scale
/// so several simultaneous voices can sum without clipping.
pub const PEAK_LEVEL: f32 = 0.3;

/// The four ADSR parameters as edited by the caller. Plain value snapshot;
/// the engine reads it when a note starts (attack/decay/sustain) and again
/// when it stops (release).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeProfile {
    /// Seconds from silence to peak.
    pub attack: f32,
    /// Seconds from peak to the sustain level.
    pub decay: f32,
    /// Held level as a fraction of peak, 0.0 to 1.0.
    pub sustain: f32,
    /// Seconds from the released level to silence.
    pub release: f32,
}

impl EnvelopeProfile {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }
}

impl Default for EnvelopeProfile {
    fn default() -> Self {
        Self {
            attack: 0.02,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

pub struct Envelope {
    sample_rate: f32,

    // Timing observed at trigger time
    attack_time: f32,
    decay_time: f32,
    sustain_level: f32, // absolute level, already scaled by PEAK_LEVEL

    // Runtime state
    stage: EnvelopeStage,
    level: f32,

    // Release bookkeeping, fixed at trigger_release time so the ramp lands
    // on exactly 0.0
    release_start_level: f32,
    release_total_samples: u32,
    release_elapsed_samples: u32,
}

impl Envelope {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            attack_time: MIN_TIME,
            decay_time: MIN_TIME,
            sustain_level: 0.0,
            stage: EnvelopeStage::Idle,
            level: 0.0,
            release_start_level: 0.0,
            release_total_samples: 1,
            release_elapsed_samples: 0,
        }
    }

    /// Begin the attack stage from silence, using the attack/decay/sustain
    /// values in effect right now. The release duration is deliberately not
    /// taken here; it is observed when the note is actually released.
    pub fn trigger(&mut self, attack: f32, decay: f32, sustain: f32) {
        self.attack_time = attack.max(MIN_TIME);
        self.decay_time = decay.max(MIN_TIME);
        self.sustain_level = PEAK_LEVEL * sustain.clamp(0.0, 1.0);

        self.level = 0.0;
        self.stage = EnvelopeStage::Attack;
        self.release_elapsed_samples = 0;
    }

    /// Begin the release stage from whatever level is in effect at this
    /// instant. Cancels the remainder of any attack or decay ramp.
    pub fn trigger_release(&mut self, release: f32) {
        if self.stage == EnvelopeStage::Idle {
            return;
        }

        self.release_start_level = self.level;
        self.release_total_samples = (release.max(MIN_TIME) * self.sample_rate)
            .round()
            .max(1.0) as u32;
        self.release_elapsed_samples = 0;
        self.stage = EnvelopeStage::Release;
    }

    /// Advance by one sample and return the new level.
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                let increment = PEAK_LEVEL / (self.attack_time * self.sample_rate);
                self.level += increment;

                if self.level >= PEAK_LEVEL {
                    self.level = PEAK_LEVEL;
                    self.stage = EnvelopeStage::Decay;
                }
            }

            EnvelopeStage::Decay => {
                let drop = PEAK_LEVEL - self.sustain_level;
                let decrement = drop / (self.decay_time * self.sample_rate);
                self.level -= decrement;

                if self.level <= self.sustain_level {
                    self.level = self.sustain_level;
                    self.stage = EnvelopeStage::Sustain;
                }
            }

            EnvelopeStage::Sustain => {
                // No pending ramp; hold until released.
                self.level = self.sustain_level;
            }

            EnvelopeStage::Release => {
                let progress =
                    self.release_elapsed_samples as f32 / self.release_total_samples as f32;
                self.level = (self.release_start_level * (1.0 - progress)).max(0.0);

                self.release_elapsed_samples = self.release_elapsed_samples.saturating_add(1);

                if self.release_elapsed_samples >= self.release_total_samples {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        debug_assert!((0.0..=PEAK_LEVEL).contains(&self.level));
        self.level
    }

    /// Write one envelope value per output sample.
    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }

    /// True while the envelope still produces gain (any stage but idle).
    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn advance(env: &mut Envelope, samples: usize) {
        for _ in 0..samples {
            env.next_sample();
        }
    }

    #[test]
    fn attack_reaches_peak_then_decays() {
        let mut env = Envelope::new(SAMPLE_RATE);
        env.trigger(0.02, 0.1, 0.7);

        // One sample of slack: increment rounding can push the peak
        // crossing to sample 21
        advance(&mut env, 21);
        assert!(
            (env.level() - PEAK_LEVEL).abs() < 2e-3,
            "attack should land on peak, got {}",
            env.level()
        );
        assert_eq!(env.stage(), EnvelopeStage::Decay);
    }

    #[test]
    fn decay_settles_on_sustain_level() {
        let sustain = 0.7;
        let mut env = Envelope::new(SAMPLE_RATE);
        env.trigger(0.02, 0.1, sustain);

        advance(&mut env, 20 + 100 + 2);
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
        assert!((env.level() - PEAK_LEVEL * sustain).abs() < 1e-3);

        // Sustain holds indefinitely
        advance(&mut env, 500);
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
        assert!((env.level() - PEAK_LEVEL * sustain).abs() < 1e-3);
    }

    #[test]
    fn release_from_mid_attack_starts_at_current_level() {
        let mut env = Envelope::new(SAMPLE_RATE);
        env.trigger(0.1, 0.1, 0.7);

        // Halfway up the attack ramp
        advance(&mut env, 50);
        let held = env.level();
        assert!(held > 0.0 && held < PEAK_LEVEL);

        env.trigger_release(0.2);
        let first = env.next_sample();
        assert!(
            (first - held).abs() < held / 100.0,
            "release must rebase from the live level: held {held}, first release sample {first}"
        );
    }

    #[test]
    fn release_lands_on_exact_zero() {
        let mut env = Envelope::new(SAMPLE_RATE);
        env.trigger(0.01, 0.05, 0.5);
        advance(&mut env, 200);

        env.trigger_release(0.03);
        advance(&mut env, 30);
        assert_eq!(env.level(), 0.0);
        assert_eq!(env.stage(), EnvelopeStage::Idle);
        assert!(!env.is_active());
    }

    #[test]
    fn release_duration_is_observed_at_release_time() {
        // Short release passed at release time wins over anything the
        // profile said when the note started.
        let mut env = Envelope::new(SAMPLE_RATE);
        env.trigger(0.01, 0.01, 0.5);
        advance(&mut env, 100);

        env.trigger_release(0.05);
        advance(&mut env, 50);
        assert_eq!(env.stage(), EnvelopeStage::Idle);
    }

    #[test]
    fn release_while_idle_is_a_no_op() {
        let mut env = Envelope::new(SAMPLE_RATE);
        env.trigger_release(0.1);
        assert_eq!(env.stage(), EnvelopeStage::Idle);
        assert_eq!(env.next_sample(), 0.0);
    }

    #[test]
    fn zero_sustain_still_holds() {
        let mut env = Envelope::new(SAMPLE_RATE);
        env.trigger(0.01, 0.01, 0.0);
        advance(&mut env, 100);

        // Level has decayed to zero but the note is still logically held
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
        assert!(env.is_active());
    }
}

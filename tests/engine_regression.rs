//! End-to-end envelope and registry behavior, rendered sample-accurately at
//! a 1 kHz test rate so stage boundaries land on round sample counts.

use notelab::synth::message::NoteOn;
use notelab::synth::note::NoteId;
use notelab::synth::registry::VoiceRegistry;
use notelab::{EnvelopeProfile, Waveform, PEAK_LEVEL};

const SAMPLE_RATE: f32 = 1_000.0;

fn registry() -> VoiceRegistry<()> {
    VoiceRegistry::new(SAMPLE_RATE, ())
}

fn note_on(note: &str, frequency: f32, profile: &EnvelopeProfile) -> NoteOn {
    NoteOn {
        note: NoteId::from(note),
        frequency,
        waveform: Waveform::Sine,
        attack: profile.attack,
        decay: profile.decay,
        sustain: profile.sustain,
    }
}

/// Render one sample at a time so assertions can be placed on exact
/// envelope clock positions.
fn render_samples(reg: &mut VoiceRegistry<()>, samples: usize) {
    let mut out = [0.0f32];
    for _ in 0..samples {
        reg.render_block(&mut out);
    }
}

/// The reference scenario: profile {0.02, 0.1, 0.7, 0.3}, peak 0.3.
/// Start C4 at t=0, stop at t=0.05 (mid-decay). The release must rebase
/// from the decay-ramp value at t=0.05 (≈0.273), fade to zero over 0.3 s,
/// and the voice must be reaped at t=0.35 — not a sample before.
#[test]
fn release_rebases_from_the_live_decay_value() {
    let profile = EnvelopeProfile::new(0.02, 0.1, 0.7, 0.3);
    let c4 = NoteId::from("C4");
    let mut reg = registry();

    reg.note_on(note_on("C4", 261.63, &profile));

    // t = 0.05: attack (20 samples) finished, 30 samples into the decay.
    // Expected level: 0.3 - (0.3 - 0.21) * 30/100 = 0.273
    render_samples(&mut reg, 50);
    let at_stop = reg.envelope_level(&c4).unwrap();
    let expected = PEAK_LEVEL - (PEAK_LEVEL - PEAK_LEVEL * 0.7) * 0.3;
    assert!(
        (at_stop - expected).abs() < 2e-3,
        "expected decay-ramp level ≈{expected}, got {at_stop}"
    );

    reg.note_off(&c4, profile.release);

    // No discontinuity: the first release sample continues from the
    // snapshot, not from the sustain level
    render_samples(&mut reg, 1);
    let after_stop = reg.envelope_level(&c4).unwrap();
    assert!(
        (after_stop - at_stop).abs() < 2e-3,
        "click: level jumped from {at_stop} to {after_stop} on release"
    );

    // t just before 0.35: still registered, still fading
    render_samples(&mut reg, 298);
    assert!(reg.is_sounding(&c4));
    assert!(reg.envelope_level(&c4).unwrap() > 0.0);

    // t = 0.35: ramp elapsed, voice reaped
    render_samples(&mut reg, 1);
    assert!(!reg.is_sounding(&c4));
    assert_eq!(reg.voice_count(), 0);
}

#[test]
fn release_mid_attack_rebases_from_the_attack_ramp() {
    // Long attack so t=0.05 is still ramping up: level = 0.3 * 50/100
    let profile = EnvelopeProfile::new(0.1, 0.1, 0.7, 0.2);
    let c4 = NoteId::from("C4");
    let mut reg = registry();

    reg.note_on(note_on("C4", 261.63, &profile));
    render_samples(&mut reg, 50);

    let at_stop = reg.envelope_level(&c4).unwrap();
    assert!((at_stop - PEAK_LEVEL * 0.5).abs() < 2e-3);

    reg.note_off(&c4, profile.release);
    render_samples(&mut reg, 1);
    let after_stop = reg.envelope_level(&c4).unwrap();
    assert!((after_stop - at_stop).abs() < 2e-3);

    // Fades out over 0.2 s from the rebased level
    render_samples(&mut reg, 200);
    assert!(!reg.is_sounding(&c4));
}

#[test]
fn double_start_registers_exactly_one_voice() {
    let profile = EnvelopeProfile::default();
    let mut reg = registry();

    reg.note_on(note_on("C4", 261.63, &profile));
    reg.note_on(note_on("C4", 261.63, &profile));

    assert_eq!(reg.voice_count(), 1);
}

#[test]
fn stop_without_a_voice_changes_nothing() {
    let profile = EnvelopeProfile::default();
    let mut reg = registry();
    reg.note_on(note_on("C4", 261.63, &profile));
    render_samples(&mut reg, 10);

    let level = reg.envelope_level(&NoteId::from("C4")).unwrap();
    reg.note_off(&NoteId::from("B7"), profile.release);

    assert_eq!(reg.voice_count(), 1);
    let mut out = [0.0f32];
    reg.render_block(&mut out);
    assert!(reg.envelope_level(&NoteId::from("C4")).unwrap() >= level);
}

#[test]
fn simultaneous_notes_envelope_independently() {
    let profile = EnvelopeProfile::new(0.02, 0.1, 0.7, 0.3);
    let a4 = NoteId::from("A4");
    let c5 = NoteId::from("C5");
    let mut reg = registry();

    reg.note_on(note_on("A4", 440.0, &profile));
    reg.note_on(note_on("C5", 523.25, &profile));
    assert_eq!(reg.voice_count(), 2);
    assert!(reg.is_sounding(&a4) && reg.is_sounding(&c5));

    // Both march through attack/decay into sustain on the same schedule
    render_samples(&mut reg, 200);
    let sustain = PEAK_LEVEL * 0.7;
    assert!((reg.envelope_level(&a4).unwrap() - sustain).abs() < 2e-3);
    assert!((reg.envelope_level(&c5).unwrap() - sustain).abs() < 2e-3);

    // Releasing A4 leaves C5's schedule untouched
    reg.note_off(&a4, profile.release);
    render_samples(&mut reg, 150);
    assert!(reg.is_sounding(&a4), "A4 mid-fade");
    assert!((reg.envelope_level(&c5).unwrap() - sustain).abs() < 2e-3);

    render_samples(&mut reg, 151);
    assert!(!reg.is_sounding(&a4));
    assert!(reg.is_sounding(&c5));
}

#[test]
fn profile_edits_between_start_and_stop_affect_only_release() {
    // Start with a long release in the profile, shorten it before the
    // stop: the stop-time value must win
    let start_profile = EnvelopeProfile::new(0.01, 0.01, 0.5, 2.0);
    let c4 = NoteId::from("C4");
    let mut reg = registry();

    reg.note_on(note_on("C4", 261.63, &start_profile));
    render_samples(&mut reg, 100);

    let stop_release = 0.05;
    reg.note_off(&c4, stop_release);
    render_samples(&mut reg, 51);
    assert!(
        !reg.is_sounding(&c4),
        "release must use the duration observed at stop time"
    );
}

#[test]
fn silent_output_after_all_voices_drain() {
    let profile = EnvelopeProfile::new(0.02, 0.05, 0.6, 0.1);
    let mut reg = registry();

    reg.note_on(note_on("E4", 329.63, &profile));
    render_samples(&mut reg, 80);
    reg.note_off(&NoteId::from("E4"), profile.release);
    render_samples(&mut reg, 101);

    let mut out = [0.0f32; 64];
    reg.render_block(&mut out);
    assert_eq!(reg.voice_count(), 0);
    assert!(out.iter().all(|&s| s == 0.0));
}

//! Drives the voice registry offline, without an audio device.
//! Shows note lifecycle: start, overlap, release, drain, reap.
//!
//! Run with: cargo run --example offline_session

use rtrb::RingBuffer;

use notelab::synth::message::{EngineMessage, NoteOn};
use notelab::synth::note::NoteId;
use notelab::synth::registry::VoiceRegistry;
use notelab::{EnvelopeProfile, Waveform};

fn note_on(note: &str, frequency: f32, profile: &EnvelopeProfile) -> EngineMessage {
    EngineMessage::NoteOn(NoteOn {
        note: NoteId::from(note),
        frequency,
        waveform: Waveform::Sine,
        attack: profile.attack,
        decay: profile.decay,
        sustain: profile.sustain,
    })
}

fn peak(buffer: &[f32]) -> f32 {
    buffer.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()))
}

fn main() {
    println!("=== Offline Session ===\n");

    let sample_rate = 48_000.0;
    let block_size = 256;
    let profile = EnvelopeProfile::default();

    let (mut tx, rx) = RingBuffer::<EngineMessage>::new(64);
    let mut registry = VoiceRegistry::new(sample_rate, rx);
    let mut buffer = vec![0.0f32; block_size];

    // C major chord
    println!("Starting C4 + E4 + G4");
    let _ = tx.push(note_on("C4", 261.63, &profile));
    let _ = tx.push(note_on("E4", 329.63, &profile));
    let _ = tx.push(note_on("G4", 392.0, &profile));

    registry.render_block(&mut buffer);
    println!(
        "  voices: {}, first-block peak: {:.3}",
        registry.voice_count(),
        peak(&buffer)
    );

    // Retrigger of a held note is suppressed
    let _ = tx.push(note_on("C4", 261.63, &profile));
    registry.render_block(&mut buffer);
    println!(
        "Retried C4 while held -> still {} voices",
        registry.voice_count()
    );

    // Render through attack+decay into sustain
    let sustain_blocks = (sample_rate * 0.2) as usize / block_size;
    for _ in 0..sustain_blocks {
        registry.render_block(&mut buffer);
    }
    println!(
        "In sustain, C4 envelope level: {:.3}",
        registry.envelope_level(&NoteId::from("C4")).unwrap()
    );

    // Release the chord
    println!("\nReleasing all three notes ({}s fade)", profile.release);
    for note in ["C4", "E4", "G4"] {
        let _ = tx.push(EngineMessage::NoteOff {
            note: NoteId::from(note),
            release: profile.release,
        });
    }

    let mut blocks = 0;
    loop {
        registry.render_block(&mut buffer);
        blocks += 1;
        if registry.voice_count() == 0 {
            break;
        }
    }
    println!(
        "Voices drained to silence after {} blocks (~{:.2}s)",
        blocks,
        blocks as f32 * block_size as f32 / sample_rate
    );
    println!("Post-drain peak: {:.6}", peak(&buffer));
}

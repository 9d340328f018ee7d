//! Application state and event loop: terminal keys in, engine calls out.

use std::collections::HashMap;
use std::io::stdout;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use ratatui::DefaultTerminal;

use notelab::{AnalysisTap, EnvelopeProfile, NoteId, SynthEngine, Waveform};

use crate::ui;
use crate::ui::spectrum::SpectrumAnalyzer;

/// Samples pulled from the analysis tap per UI frame.
const VIS_WINDOW: usize = 1024;

/// How long a note survives without a fresh press/repeat event when the
/// terminal cannot report key releases. Must outlast the typical initial
/// auto-repeat delay (~500 ms).
const HOLD_TIMEOUT: Duration = Duration::from_millis(650);

/// One octave starting at middle C, laid out like a piano over the home
/// row: naturals on a..k, sharps on the row above.
pub struct KeyBinding {
    pub key: char,
    pub note: NoteId,
    pub frequency: f32,
    pub is_black: bool,
}

fn key_bindings() -> Vec<KeyBinding> {
    [
        ('a', "C4", 261.63, false),
        ('w', "C#4", 277.18, true),
        ('s', "D4", 293.66, false),
        ('e', "D#4", 311.13, true),
        ('d', "E4", 329.63, false),
        ('f', "F4", 349.23, false),
        ('t', "F#4", 369.99, true),
        ('g', "G4", 392.0, false),
        ('y', "G#4", 415.3, true),
        ('h', "A4", 440.0, false),
        ('u', "A#4", 466.16, true),
        ('j', "B4", 493.88, false),
        ('k', "C5", 523.25, false),
    ]
    .into_iter()
    .map(|(key, note, frequency, is_black)| KeyBinding {
        key,
        note: NoteId::from(note),
        frequency,
        is_black,
    })
    .collect()
}

/// Which envelope parameter the arrow keys currently edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdsrParam {
    Attack,
    Decay,
    Sustain,
    Release,
}

impl AdsrParam {
    pub const ALL: [AdsrParam; 4] = [
        AdsrParam::Attack,
        AdsrParam::Decay,
        AdsrParam::Sustain,
        AdsrParam::Release,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AdsrParam::Attack => "attack",
            AdsrParam::Decay => "decay",
            AdsrParam::Sustain => "sustain",
            AdsrParam::Release => "release",
        }
    }

    fn next(self) -> Self {
        match self {
            AdsrParam::Attack => AdsrParam::Decay,
            AdsrParam::Decay => AdsrParam::Sustain,
            AdsrParam::Sustain => AdsrParam::Release,
            AdsrParam::Release => AdsrParam::Attack,
        }
    }

    fn prev(self) -> Self {
        self.next().next().next()
    }
}

pub struct App {
    engine: SynthEngine,
    tap: AnalysisTap,
    pub bindings: Vec<KeyBinding>,
    /// Held note keys, stamped with the last press/repeat event.
    held: HashMap<char, Instant>,
    pub selected: AdsrParam,
    pub spectrum: SpectrumAnalyzer,
    pub wave_window: Vec<f32>,
    release_events: bool,
    should_quit: bool,
}

impl App {
    pub fn new(engine: SynthEngine) -> Self {
        let tap = engine
            .analysis_tap()
            .expect("engine was just constructed, tap must exist");
        let spectrum = SpectrumAnalyzer::new(VIS_WINDOW, engine.sample_rate());

        Self {
            engine,
            tap,
            bindings: key_bindings(),
            held: HashMap::new(),
            selected: AdsrParam::Attack,
            spectrum,
            wave_window: vec![0.0; VIS_WINDOW],
            release_events: false,
            should_quit: false,
        }
    }

    pub fn run(mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        self.release_events = crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
        if self.release_events {
            execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

        let result = self.event_loop(terminal);

        if self.release_events {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        self.engine.close();
        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_tap();
            terminal.draw(|frame| ui::render(frame, self))?;

            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                }
            }

            if !self.release_events {
                self.expire_stale_holds();
            }
        }

        Ok(())
    }

    /// Pull the latest mixed-output window and refresh the spectrum.
    fn poll_tap(&mut self) {
        self.tap.read_into(&mut self.wave_window);
        self.spectrum.update(&self.wave_window);
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => self.on_key_down(key),
            KeyEventKind::Release => self.on_key_up(key),
        }
    }

    fn on_key_down(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab | KeyCode::Right => self.selected = self.selected.next(),
            KeyCode::Left => self.selected = self.selected.prev(),
            KeyCode::Up => self.adjust_selected(1.0),
            KeyCode::Down => self.adjust_selected(-1.0),
            KeyCode::Char(' ') => {
                let next = self.engine.waveform().next();
                self.engine.set_waveform(next);
            }
            KeyCode::Char(c) => self.on_note_key_down(c.to_ascii_lowercase(), key.kind),
            _ => {}
        }
    }

    fn on_note_key_down(&mut self, c: char, kind: KeyEventKind) {
        let Some(binding) = self.bindings.iter().find(|b| b.key == c) else {
            return;
        };

        if kind == KeyEventKind::Press && !self.held.contains_key(&c) {
            // Platforms may keep the stream suspended until a gesture
            self.engine.resume();
            self.engine.start(&binding.note, binding.frequency);
        }
        self.held.insert(c, Instant::now());
    }

    fn on_key_up(&mut self, key: KeyEvent) {
        let KeyCode::Char(c) = key.code else { return };
        let c = c.to_ascii_lowercase();

        if self.held.remove(&c).is_some() {
            if let Some(binding) = self.bindings.iter().find(|b| b.key == c) {
                self.engine.stop(&binding.note);
            }
        }
    }

    /// Without release reporting, auto-repeat keeps held keys fresh; a key
    /// that stopped repeating is treated as released.
    fn expire_stale_holds(&mut self) {
        let now = Instant::now();
        let expired: Vec<char> = self
            .held
            .iter()
            .filter(|(_, &stamp)| now.duration_since(stamp) > HOLD_TIMEOUT)
            .map(|(&c, _)| c)
            .collect();

        for c in expired {
            self.held.remove(&c);
            if let Some(binding) = self.bindings.iter().find(|b| b.key == c) {
                self.engine.stop(&binding.note);
            }
        }
    }

    fn adjust_selected(&mut self, direction: f32) {
        let mut profile = self.engine.profile();
        let step = 0.01 * direction;
        match self.selected {
            AdsrParam::Attack => profile.attack = (profile.attack + step).clamp(0.01, 2.0),
            AdsrParam::Decay => profile.decay = (profile.decay + step).clamp(0.01, 2.0),
            AdsrParam::Sustain => profile.sustain = (profile.sustain + step).clamp(0.0, 1.0),
            AdsrParam::Release => profile.release = (profile.release + step).clamp(0.01, 3.0),
        }
        self.engine.set_profile(profile);
    }

    pub fn profile(&self) -> EnvelopeProfile {
        self.engine.profile()
    }

    pub fn waveform(&self) -> Waveform {
        self.engine.waveform()
    }

    /// Notes the UI should light up, by key char.
    pub fn is_key_held(&self, key: char) -> bool {
        self.held.contains_key(&key)
    }
}

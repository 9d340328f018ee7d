//! notelab - play notes from the terminal
//!
//! Run with: cargo run
//!
//! White keys on the home row (a s d f g h j k), black keys above them
//! (w e t y u). Arrow keys edit the envelope, space cycles the waveform.

mod app;
mod ui;

use app::App;
use color_eyre::eyre::Result as EyreResult;
use notelab::{EngineConfig, SynthEngine};

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    init_tracing();

    let engine = SynthEngine::new(EngineConfig::default())?;

    let mut terminal = ratatui::init();
    let result = App::new(engine).run(&mut terminal);
    ratatui::restore();
    result
}

/// File-backed logging, enabled by NOTELAB_LOG=<path>. Writing to stderr
/// would fight the TUI for the terminal.
fn init_tracing() {
    let Ok(path) = std::env::var("NOTELAB_LOG") else {
        return;
    };
    let Ok(file) = std::fs::File::create(path) else {
        return;
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .try_init();
}

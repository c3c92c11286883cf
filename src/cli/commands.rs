//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;

use crate::config::DeckConfig;
use crate::controls::mapping::{format_duration, tape_title};
use crate::engine::io::{export_wav, import_wav, tape_name_from_path, ExportFormat};
use crate::engine::{db_to_linear, BufferInput, RecordingProgress};
use crate::session::{Deck, ProgressCallback};

/// Load the deck configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<DeckConfig> {
    match path {
        Some(path) => DeckConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(DeckConfig::default()),
    }
}

/// Print name, duration and sample count of an audio file.
pub fn info(config: &DeckConfig, file: &Path) -> Result<()> {
    info!("Inspecting: {}", file.display());

    let buffer = import_wav(file, config.sample_rate)
        .with_context(|| format!("Failed to decode {}", file.display()))?;
    let name = tape_name_from_path(file);

    println!("Tape:        {}", tape_title(&name, buffer.duration_secs()));
    println!("Duration:    {:.3}s", buffer.duration_secs());
    println!("Samples:     {}", buffer.len());
    println!("Sample rate: {} Hz", buffer.sample_rate());

    Ok(())
}

/// Options for [`render`].
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub seconds: f64,
    pub rate: f64,
    pub gain_db: f64,
    pub start: f64,
    pub bits: u16,
}

/// Load every file as a tape, play them all and write the mixdown.
pub fn render(config: &DeckConfig, files: &[impl AsRef<Path>], output: &Path, options: RenderOptions) -> Result<()> {
    if !(options.seconds.is_finite() && options.seconds > 0.0) {
        bail!("--seconds must be positive");
    }

    let mut deck = Deck::new(config.clone())?;
    let gain = db_to_linear(options.gain_db as f32);

    for file in files {
        let file = file.as_ref();
        let id = deck
            .import_file(file)
            .with_context(|| format!("Failed to load {}", file.display()))?;
        deck.set_position(id, options.start)?;
        deck.set_rate(id, options.rate)?;
        if let Some(tape) = deck.tape_mut(id) {
            tape.set_gain(gain);
        }
    }

    info!(
        "Rendering {} tape(s) for {:.2}s at rate {}",
        deck.tape_count(),
        options.seconds,
        options.rate
    );
    let mix = deck.render_secs(options.seconds);
    export_wav(&mix, config.sample_rate, output, ExportFormat::new(options.bits))
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Rendered {} to {}", format_duration(options.seconds), output.display());
    Ok(())
}

/// Play a tape once at rate -1 and write the result.
pub fn reverse(config: &DeckConfig, file: &Path, output: &Path) -> Result<()> {
    info!("Reversing: {}", file.display());

    let mut deck = Deck::new(config.clone())?;
    let id = deck
        .import_file(file)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    deck.set_rate(id, -1.0)?;

    let duration = deck.tape(id).map(|t| t.duration()).unwrap_or(0.0);
    let reversed = deck.render_secs(duration);
    export_wav(&reversed, config.sample_rate, output, ExportFormat::default())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Reversed {} ({}) to {}", file.display(), format_duration(duration), output.display());
    Ok(())
}

/// Feed a file through a recording session and write the recorded tape.
pub fn record(config: &DeckConfig, from: &Path, output: &Path) -> Result<()> {
    info!("Recording from: {}", from.display());

    let source = import_wav(from, config.sample_rate)
        .with_context(|| format!("Failed to decode {}", from.display()))?;
    let input = BufferInput::new(source.samples().to_vec(), config.sample_rate, config.block_size);

    let mut deck = Deck::new(config.clone())?;
    let on_progress: ProgressCallback = Box::new(|progress: &RecordingProgress, label: &str| {
        log::debug!("Recorded {} ({} samples)", label, progress.samples)
    });
    deck.start_recording_from(Box::new(input), Some(on_progress))?;
    deck.pump_recording();
    let id = deck.stop_recording()?;

    let Some(tape) = deck.tape(id) else {
        bail!("Recorded tape {} disappeared", id);
    };
    export_wav(tape.buffer().samples(), config.sample_rate, output, ExportFormat::default())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("Recorded {} to {}", format_duration(tape.duration()), output.display());
    Ok(())
}

//! The deck: tapes, clock, input and recording in one place

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::config::DeckConfig;
use crate::controls::mapping::{format_duration, gain_from_slider, position_label, rate_from_slider};
use crate::controls::panel::TapeCommand;
use crate::engine::io::{import_wav, resample_buffer, tape_name_from_path, SUPPORTED_EXTENSIONS};
use crate::engine::{AudioClock, InputSource, RecordingProgress, RecordingSession, Tape, TapeBuffer, TransportState};
use crate::error::{ReelError, Result};

use super::{PositionReport, PreloadReport, TapeId};

/// Called with the recording progress and its `m's"` label
pub type ProgressCallback = Box<dyn FnMut(&RecordingProgress, &str)>;

/// Result of [`Deck::toggle_recording`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingEvent {
    /// A recording started into this (placeholder) tape
    Started(TapeId),
    /// The recording into this tape finished
    Stopped(TapeId),
}

struct ActiveRecording {
    session: RecordingSession,
    target: TapeId,
    source: Box<dyn InputSource>,
    /// The source is the deck's live input and goes back to it on stop
    from_deck_input: bool,
    on_progress: Option<ProgressCallback>,
}

impl ActiveRecording {
    /// Move every available block into the session
    fn drain(&mut self) -> usize {
        let mut appended = 0;
        while let Some(block) = self.source.read_block() {
            appended += block.len();
            if let Some(progress) = self.session.append(block) {
                if let Some(callback) = self.on_progress.as_mut() {
                    callback(&progress, &format_duration(progress.elapsed_secs));
                }
            }
        }
        appended
    }
}

/// A multi-tape reel-to-reel machine
///
/// All tape state is owned here and mutated from the thread that owns the
/// deck. Operations address tapes by [`TapeId`] and read the engine clock
/// themselves.
///
/// # Example
/// ```
/// use reeltape::config::DeckConfig;
/// use reeltape::engine::TapeBuffer;
/// use reeltape::session::Deck;
///
/// let mut deck = Deck::new(DeckConfig::default()).unwrap();
/// let id = deck.create_tape("loop", TapeBuffer::new(vec![0.5; 44100], 44100));
/// deck.toggle_play(id).unwrap();
///
/// let mut out = vec![0.0; 512];
/// deck.render(&mut out);
/// assert!((deck.now() - 512.0 / 44100.0).abs() < 1e-12);
/// ```
pub struct Deck {
    config: DeckConfig,
    clock: AudioClock,
    tapes: BTreeMap<TapeId, Tape>,
    next_id: u64,
    input: Option<Box<dyn InputSource>>,
    recording: Option<ActiveRecording>,
}

impl fmt::Debug for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deck")
            .field("sample_rate", &self.config.sample_rate)
            .field("now", &self.clock.now())
            .field("tapes", &self.tapes.len())
            .field("has_input", &self.input.is_some())
            .field("recording", &self.recording.as_ref().map(|r| r.target))
            .finish()
    }
}

impl Deck {
    /// Create an empty deck
    ///
    /// # Errors
    /// * `Config` - If the configuration is invalid
    pub fn new(config: DeckConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "[DECK] Initialised at {} Hz, block size {}",
            config.sample_rate, config.block_size
        );
        Ok(Self {
            clock: AudioClock::new(config.sample_rate),
            config,
            tapes: BTreeMap::new(),
            next_id: 0,
            input: None,
            recording: None,
        })
    }

    /// Attach a live input source
    pub fn with_input(mut self, input: Box<dyn InputSource>) -> Self {
        self.set_input(Some(input));
        self
    }

    /// Replace (or remove) the live input source
    pub fn set_input(&mut self, input: Option<Box<dyn InputSource>>) {
        match &input {
            Some(source) => info!("[DECK] Live input: {}", source.describe()),
            None => info!("[DECK] Running without live input"),
        }
        self.input = input;
    }

    /// Check whether a live input is attached (and not busy recording)
    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    /// Deck configuration
    pub fn config(&self) -> &DeckConfig {
        &self.config
    }

    /// Engine clock
    pub fn clock(&self) -> &AudioClock {
        &self.clock
    }

    /// Current engine clock time in seconds
    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Advance the clock without rendering audio
    ///
    /// Playing tapes skip ahead so the next render starts where their
    /// reported position says.
    pub fn advance(&mut self, secs: f64) {
        self.clock.advance_secs(secs);
        let now = self.now();
        for tape in self.tapes.values_mut() {
            tape.resync(now);
        }
    }

    // ========================================================================
    // Tape Collection
    // ========================================================================

    /// Add a tape holding `buffer`; returns its id
    ///
    /// A buffer at another sample rate is resampled to the deck rate.
    pub fn create_tape(&mut self, name: impl Into<String>, buffer: TapeBuffer) -> TapeId {
        let name = name.into();
        let buffer = if buffer.sample_rate() != self.config.sample_rate {
            info!(
                "[DECK] Resampling '{}' from {} Hz to {} Hz",
                name,
                buffer.sample_rate(),
                self.config.sample_rate
            );
            resample_buffer(&buffer, self.config.sample_rate)
        } else {
            buffer
        };

        let id = TapeId(self.next_id);
        self.next_id += 1;
        debug!("[DECK] Created {} '{}' ({:.2}s)", id, name, buffer.duration_secs());
        let tape = Tape::new(name, buffer, self.now()).with_declick(self.config.declick_frames);
        self.tapes.insert(id, tape);
        id
    }

    /// Add a silent tape of `secs` seconds
    pub fn create_blank_tape(&mut self, name: impl Into<String>, secs: f64) -> TapeId {
        let samples = (secs.max(0.0) * self.config.sample_rate as f64).round() as usize;
        let buffer = TapeBuffer::silence(samples, self.config.sample_rate);
        self.create_tape(name, buffer)
    }

    /// Copy a tape: the new tape shares its samples and name but starts
    /// stopped at position zero
    pub fn copy_tape(&mut self, id: TapeId) -> Result<TapeId> {
        let (name, buffer) = {
            let tape = self.tape_or_err(id)?;
            (tape.name().to_string(), tape.buffer().clone())
        };
        let copy = self.create_tape(name, buffer);
        info!("[DECK] Copied {} to {}", id, copy);
        Ok(copy)
    }

    /// Rename a tape
    pub fn rename_tape(&mut self, id: TapeId, name: impl Into<String>) -> Result<()> {
        self.tape_mut_or_err(id)?.set_name(name);
        Ok(())
    }

    /// Look up a tape
    pub fn tape(&self, id: TapeId) -> Option<&Tape> {
        self.tapes.get(&id)
    }

    /// Look up a tape for modification
    pub fn tape_mut(&mut self, id: TapeId) -> Option<&mut Tape> {
        self.tapes.get_mut(&id)
    }

    /// All tapes in creation order
    pub fn tapes(&self) -> impl Iterator<Item = (TapeId, &Tape)> {
        self.tapes.iter().map(|(id, tape)| (*id, tape))
    }

    /// Ids of all tapes in creation order
    pub fn tape_ids(&self) -> Vec<TapeId> {
        self.tapes.keys().copied().collect()
    }

    /// Number of tapes
    pub fn tape_count(&self) -> usize {
        self.tapes.len()
    }

    fn tape_or_err(&self, id: TapeId) -> Result<&Tape> {
        self.tapes.get(&id).ok_or_else(|| {
            warn!("[DECK] No such tape: {}", id);
            ReelError::TapeNotFound(id)
        })
    }

    fn finite(name: &'static str, value: f64) -> Result<f64> {
        if value.is_finite() {
            Ok(value)
        } else {
            warn!("[DECK] Rejected {} {}", name, value);
            Err(ReelError::InvalidValue { name, value })
        }
    }

    fn tape_mut_or_err(&mut self, id: TapeId) -> Result<&mut Tape> {
        self.tapes.get_mut(&id).ok_or_else(|| {
            warn!("[DECK] No such tape: {}", id);
            ReelError::TapeNotFound(id)
        })
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Decode a WAV file into a new tape called `name`
    ///
    /// # Errors
    /// Any decode error from [`import_wav`]; the deck is left unchanged.
    pub fn load_asset(&mut self, name: impl Into<String>, path: &Path) -> Result<TapeId> {
        let name = name.into();
        match import_wav(path, self.config.sample_rate) {
            Ok(buffer) => {
                let id = self.create_tape(name, buffer);
                info!("[DECK] Loaded {} from {}", id, path.display());
                Ok(id)
            }
            Err(e) => {
                error!("[DECK] Failed to load '{}' from {}: {}", name, path.display(), e);
                Err(e)
            }
        }
    }

    /// Import a file as a new tape named after it (last extension stripped)
    pub fn import_file(&mut self, path: &Path) -> Result<TapeId> {
        self.load_asset(tape_name_from_path(path), path)
    }

    /// Load the configured preload names from `dir`, or every WAV file in
    /// it when none are configured
    pub fn preload(&mut self, dir: &Path) -> PreloadReport {
        let mut report = PreloadReport::default();

        let targets: Vec<(String, PathBuf)> = if self.config.preload.is_empty() {
            wav_files_under(dir)
                .into_iter()
                .map(|path| (tape_name_from_path(&path), path))
                .collect()
        } else {
            self.config
                .preload
                .iter()
                .map(|name| (name.clone(), dir.join(format!("{}.wav", name))))
                .collect()
        };

        for (name, path) in targets {
            match self.load_asset(name, &path) {
                Ok(id) => report.loaded.push(id),
                Err(e) => report.failed.push((path, e)),
            }
        }

        info!(
            "[DECK] Preloaded {} tape(s) from {} ({} failed)",
            report.loaded.len(),
            dir.display(),
            report.failed.len()
        );
        report
    }

    // ========================================================================
    // Transport
    // ========================================================================

    /// Play a stopped tape at its saved rate, or stop a playing one
    pub fn toggle_play(&mut self, id: TapeId) -> Result<TransportState> {
        let now = self.now();
        let tape = self.tape_mut_or_err(id)?;
        tape.toggle_play(now);
        Ok(tape.transport_state())
    }

    /// Set a tape's signed rate
    ///
    /// # Errors
    /// * `InvalidValue` - The rate is NaN or infinite
    pub fn set_rate(&mut self, id: TapeId, rate: f64) -> Result<()> {
        let rate = Self::finite("rate", rate)?;
        let now = self.now();
        self.tape_mut_or_err(id)?.set_rate(now, rate);
        Ok(())
    }

    /// Handle a rate slider change
    ///
    /// The mapped rate becomes the tape's saved rate and takes effect at once
    /// if the tape is playing.
    pub fn apply_rate_slider(&mut self, id: TapeId, value: f64) -> Result<()> {
        let value = Self::finite("rate slider value", value)?;
        let now = self.now();
        let rate = rate_from_slider(value);
        let tape = self.tape_mut_or_err(id)?;
        tape.set_saved_rate(rate);
        if tape.rate() != 0.0 {
            tape.set_rate(now, rate);
        }
        Ok(())
    }

    /// Handle a gain slider change
    pub fn apply_gain_slider(&mut self, id: TapeId, value: f64) -> Result<()> {
        let value = Self::finite("gain slider value", value)?;
        let gain = gain_from_slider(value);
        self.tape_mut_or_err(id)?.set_gain(gain);
        Ok(())
    }

    /// Seek a tape to `pos` seconds
    pub fn set_position(&mut self, id: TapeId, pos: f64) -> Result<()> {
        let pos = Self::finite("position", pos)?;
        let now = self.now();
        self.tape_mut_or_err(id)?.set_position(now, pos);
        Ok(())
    }

    /// Move a tape's position by a fraction of its length
    pub fn scrub(&mut self, id: TapeId, delta_fraction: f64) -> Result<()> {
        let delta_fraction = Self::finite("scrub delta", delta_fraction)?;
        let now = self.now();
        self.tape_mut_or_err(id)?.scrub(now, delta_fraction);
        Ok(())
    }

    /// Apply a command from a tape's control panel
    ///
    /// Returns the new tape's id for [`TapeCommand::Copy`].
    pub fn apply(&mut self, id: TapeId, command: TapeCommand) -> Result<Option<TapeId>> {
        match command {
            TapeCommand::TogglePlay => self.toggle_play(id).map(|_| None),
            TapeCommand::Copy => self.copy_tape(id).map(Some),
            TapeCommand::RateSlider(value) => self.apply_rate_slider(id, value).map(|_| None),
            TapeCommand::GainSlider(value) => self.apply_gain_slider(id, value).map(|_| None),
            TapeCommand::Scrub(delta) => self.scrub(id, delta).map(|_| None),
        }
    }

    /// Position of every tape, for the periodic UI poll
    pub fn poll_positions(&self) -> Vec<PositionReport> {
        let now = self.now();
        self.tapes
            .iter()
            .map(|(id, tape)| {
                let position_secs = tape.position(now);
                let duration_secs = tape.duration();
                PositionReport {
                    id: *id,
                    fraction: tape.position_fraction(now),
                    position_secs,
                    duration_secs,
                    label: position_label(position_secs, duration_secs),
                    state: tape.transport_state(),
                }
            })
            .collect()
    }

    // ========================================================================
    // Output
    // ========================================================================

    /// Mix every tape into `out` and advance the clock by its length
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        for tape in self.tapes.values_mut() {
            tape.render_add(out);
        }
        self.clock.advance_frames(out.len() as u64);
    }

    /// Render `secs` seconds of mixdown in configured block sizes
    pub fn render_secs(&mut self, secs: f64) -> Vec<f32> {
        let total = (secs.max(0.0) * self.config.sample_rate as f64).round() as usize;
        let mut output = vec![0.0; total];
        for block in output.chunks_mut(self.config.block_size) {
            self.render(block);
        }
        output
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Check whether a recording is active
    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Tape being recorded into, if any
    pub fn recording_target(&self) -> Option<TapeId> {
        self.recording.as_ref().map(|r| r.target)
    }

    /// Progress of the active recording, if any
    pub fn recording_progress(&self) -> Option<RecordingProgress> {
        self.recording.as_ref().map(|r| r.session.progress())
    }

    /// Start recording from the live input into a new placeholder tape
    ///
    /// # Errors
    /// * `AlreadyRecording` - A recording is active; it is left untouched
    /// * `NoInputSource` - No live input is attached
    /// * `SampleRateMismatch` - The input does not run at the deck rate
    pub fn start_recording(&mut self, on_progress: Option<ProgressCallback>) -> Result<TapeId> {
        if self.is_recording() {
            warn!("[RECORD] Already recording");
            return Err(ReelError::AlreadyRecording);
        }
        let Some(source) = self.input.take() else {
            warn!("[RECORD] No input source available");
            return Err(ReelError::NoInputSource);
        };
        self.begin_recording(source, true, on_progress)
    }

    /// Start recording from an explicit source, such as a file
    ///
    /// The source is dropped when the recording stops.
    pub fn start_recording_from(
        &mut self,
        source: Box<dyn InputSource>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<TapeId> {
        if self.is_recording() {
            warn!("[RECORD] Already recording");
            return Err(ReelError::AlreadyRecording);
        }
        self.begin_recording(source, false, on_progress)
    }

    fn begin_recording(
        &mut self,
        mut source: Box<dyn InputSource>,
        from_deck_input: bool,
        on_progress: Option<ProgressCallback>,
    ) -> Result<TapeId> {
        let deck_rate = self.config.sample_rate;
        let input_rate = source.sample_rate();
        let started = if input_rate != deck_rate {
            Err(ReelError::SampleRateMismatch {
                input: input_rate,
                deck: deck_rate,
            })
        } else {
            source.resume()
        };

        if let Err(e) = started {
            warn!("[RECORD] Cannot record from {}: {}", source.describe(), e);
            if from_deck_input {
                self.input = Some(source);
            }
            return Err(e);
        }

        let placeholder = TapeBuffer::silence(self.config.placeholder_samples(), deck_rate);
        let target = self.create_tape("", placeholder);
        info!("[RECORD] Recording from {} into {}", source.describe(), target);

        self.recording = Some(ActiveRecording {
            session: RecordingSession::new(deck_rate, self.config.progress_interval_samples()),
            target,
            source,
            from_deck_input,
            on_progress,
        });
        Ok(target)
    }

    /// Pull every available input block into the active recording
    ///
    /// Returns the number of samples appended (zero when not recording).
    pub fn pump_recording(&mut self) -> usize {
        self.recording.as_mut().map_or(0, ActiveRecording::drain)
    }

    /// Stop the active recording and put the result on its tape
    ///
    /// Blocks already captured are drained first. A recording that captured
    /// nothing keeps its placeholder buffer.
    ///
    /// # Errors
    /// * `NotRecording` - No recording is active
    pub fn stop_recording(&mut self) -> Result<TapeId> {
        let Some(mut active) = self.recording.take() else {
            warn!("[RECORD] Not recording");
            return Err(ReelError::NotRecording);
        };

        active.drain();
        active.session.deactivate();
        active.source.pause();

        let ActiveRecording {
            session,
            target,
            source,
            from_deck_input,
            ..
        } = active;
        if from_deck_input {
            self.input = Some(source);
        }

        if session.total_samples() == 0 {
            warn!("[RECORD] Recording into {} captured no audio; keeping placeholder", target);
            return Ok(target);
        }

        let buffer = session.finish();
        info!(
            "[RECORD] Recorded length: {:.3}s into {}",
            buffer.duration_secs(),
            target
        );
        let now = self.now();
        self.tape_mut_or_err(target)?.replace_buffer(now, buffer);
        Ok(target)
    }

    /// Start recording if idle, otherwise stop
    pub fn toggle_recording(&mut self, on_progress: Option<ProgressCallback>) -> Result<RecordingEvent> {
        if self.is_recording() {
            self.stop_recording().map(RecordingEvent::Stopped)
        } else {
            self.start_recording(on_progress).map(RecordingEvent::Started)
        }
    }
}

/// Every WAV file under `dir`, sorted by path
fn wav_files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("[DECK] Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::io::{export_wav, ExportFormat};
    use crate::engine::{BufferInput, ChannelInput};
    use approx::assert_abs_diff_eq;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::mpsc;
    use tempfile::TempDir;

    const SR: u32 = 1000;

    fn deck() -> Deck {
        Deck::new(DeckConfig {
            sample_rate: SR,
            block_size: 100,
            declick_frames: 0,
            ..DeckConfig::default()
        })
        .unwrap()
    }

    fn ramp(len: usize) -> TapeBuffer {
        TapeBuffer::new((0..len).map(|i| i as f32 / len as f32).collect(), SR)
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = DeckConfig {
            sample_rate: 0,
            ..DeckConfig::default()
        };
        assert!(matches!(Deck::new(config), Err(ReelError::Config { .. })));
    }

    #[test]
    fn test_ids_are_sequential_and_displayed() {
        let mut deck = deck();
        let a = deck.create_blank_tape("a", 1.0);
        let b = deck.create_blank_tape("b", 1.0);
        assert_eq!(a, TapeId(0));
        assert_eq!(b, TapeId(1));
        assert_eq!(b.to_string(), "tape-1");
        assert_eq!(deck.tape_ids(), vec![a, b]);
        assert_eq!(deck.tape(b).unwrap().duration(), 1.0);
    }

    #[test]
    fn test_unknown_tape_is_rejected() {
        let mut deck = deck();
        assert!(matches!(
            deck.toggle_play(TapeId(42)),
            Err(ReelError::TapeNotFound(TapeId(42)))
        ));
    }

    #[test]
    fn test_copy_shares_samples_not_transport() {
        let mut deck = deck();
        let original = deck.create_tape("Tim", ramp(2000));
        deck.toggle_play(original).unwrap();
        deck.advance(0.5);

        let copy = deck.copy_tape(original).unwrap();
        let (a, b) = (deck.tape(original).unwrap(), deck.tape(copy).unwrap());
        assert!(a.buffer().shares_samples_with(b.buffer()));
        assert_eq!(b.name(), "Tim");
        assert_eq!(b.transport_state(), TransportState::Stopped);
        assert_eq!(b.position(deck.now()), 0.0);
        assert_abs_diff_eq!(a.position(deck.now()), 0.5, epsilon = 1e-9);

        deck.rename_tape(copy, "Tim (slow)").unwrap();
        assert_eq!(deck.tape(original).unwrap().name(), "Tim");
        assert_eq!(deck.tape(copy).unwrap().name(), "Tim (slow)");
    }

    #[test]
    fn test_advance_moves_read_heads() {
        let mut deck = deck();
        let samples = (0..1000).map(|i| i as f32).collect();
        let id = deck.create_tape("ramp", TapeBuffer::new(samples, SR));
        let stopped = deck.create_tape("stopped", TapeBuffer::new(vec![0.0; 1000], SR));
        deck.toggle_play(id).unwrap();
        deck.advance(0.5);

        assert_abs_diff_eq!(deck.tape(id).unwrap().position(deck.now()), 0.5, epsilon = 1e-9);
        assert!(!deck.tape(stopped).unwrap().has_source());
        let mut out = vec![0.0; 2];
        deck.render(&mut out);
        assert_eq!(out, vec![500.0, 501.0]);
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let mut deck = deck();
        let id = deck.create_tape("t", ramp(1000));
        deck.set_rate(id, 1.0).unwrap();
        deck.set_position(id, 0.25).unwrap();

        for bad in [f64::NAN, f64::INFINITY] {
            assert!(matches!(
                deck.set_rate(id, bad),
                Err(ReelError::InvalidValue { name: "rate", .. })
            ));
            assert!(deck.set_position(id, bad).is_err());
            assert!(deck.scrub(id, bad).is_err());
            assert!(deck.apply_rate_slider(id, bad).is_err());
            assert!(deck.apply_gain_slider(id, bad).is_err());
        }

        let tape = deck.tape(id).unwrap();
        assert_eq!(tape.rate(), 1.0);
        assert_eq!(tape.gain(), 1.0);
        assert_abs_diff_eq!(tape.position(deck.now()), 0.25, epsilon = 1e-12);
        let rendered = deck.render_secs(0.1);
        assert!(rendered.iter().all(|s| s.is_finite()));
        assert_abs_diff_eq!(deck.tape(id).unwrap().position(deck.now()), 0.35, epsilon = 1e-9);
    }

    #[test]
    fn test_foreign_rate_buffer_is_resampled() {
        let mut deck = deck();
        let half_rate = TapeBuffer::new((0..1000).map(|i| i as f32).collect(), SR / 2);
        let id = deck.create_tape("slow", half_rate);

        let tape = deck.tape(id).unwrap();
        assert_eq!(tape.buffer().sample_rate(), SR);
        assert_eq!(tape.buffer().len(), 2000);
        assert_abs_diff_eq!(tape.duration(), 2.0, epsilon = 1e-12);

        // One second in, the audio and the reported position agree
        deck.toggle_play(id).unwrap();
        deck.render_secs(1.0);
        assert_abs_diff_eq!(deck.tape(id).unwrap().position(deck.now()), 1.0, epsilon = 1e-9);
        let mut out = vec![0.0; 1];
        deck.render(&mut out);
        assert_abs_diff_eq!(out[0], 500.0, epsilon = 1e-3);
    }

    #[test]
    fn test_rate_slider_while_stopped_only_saves() {
        let mut deck = deck();
        let id = deck.create_tape("t", ramp(1000));
        deck.apply_rate_slider(id, 0.25).unwrap();
        let tape = deck.tape(id).unwrap();
        assert_eq!(tape.rate(), 0.0);
        assert_eq!(tape.saved_rate(), -4.0);

        deck.toggle_play(id).unwrap();
        assert_eq!(deck.tape(id).unwrap().rate(), -4.0);
    }

    #[test]
    fn test_rate_slider_while_playing_applies() {
        let mut deck = deck();
        let id = deck.create_tape("t", ramp(1000));
        deck.toggle_play(id).unwrap();
        deck.apply_rate_slider(id, 1.0).unwrap();
        assert_eq!(deck.tape(id).unwrap().rate(), 8.0);
        assert_eq!(deck.tape(id).unwrap().saved_rate(), 8.0);
    }

    #[test]
    fn test_gain_slider() {
        let mut deck = deck();
        let id = deck.create_tape("t", ramp(1000));
        deck.apply_gain_slider(id, 0.75).unwrap();
        assert_abs_diff_eq!(deck.tape(id).unwrap().gain(), 1.0, epsilon = 1e-6);
        deck.apply_gain_slider(id, 0.0).unwrap();
        assert!(deck.tape(id).unwrap().gain() < 0.002);
    }

    #[test]
    fn test_scrub_wraps_backwards() {
        let mut deck = deck();
        let id = deck.create_tape("t", ramp(10_000));
        deck.scrub(id, -0.1).unwrap();
        assert_abs_diff_eq!(deck.tape(id).unwrap().position(deck.now()), 9.0, epsilon = 1e-9);
    }

    #[test]
    fn test_apply_commands() {
        let mut deck = deck();
        let id = deck.create_tape("t", ramp(1000));
        assert_eq!(deck.apply(id, TapeCommand::TogglePlay).unwrap(), None);
        assert_eq!(deck.tape(id).unwrap().transport_state(), TransportState::PlayingForward);
        let copy = deck.apply(id, TapeCommand::Copy).unwrap();
        assert_eq!(copy, Some(TapeId(1)));
    }

    #[test]
    fn test_poll_positions() {
        let mut deck = deck();
        let id = deck.create_tape("t", ramp(10_000));
        deck.set_position(id, 5.0).unwrap();
        deck.toggle_play(id).unwrap();
        deck.advance(2.0);

        let reports = deck.poll_positions();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].id, id);
        assert_abs_diff_eq!(reports[0].fraction, 0.7, epsilon = 1e-9);
        assert_eq!(reports[0].label, "0'7\" / 0'10\"");
        assert_eq!(reports[0].state, TransportState::PlayingForward);
    }

    #[test]
    fn test_render_mixes_and_advances_clock() {
        let mut deck = deck();
        let a = deck.create_tape("a", TapeBuffer::new(vec![0.25; 1000], SR));
        let b = deck.create_tape("b", TapeBuffer::new(vec![0.5; 1000], SR));
        deck.create_tape("stopped", TapeBuffer::new(vec![1.0; 1000], SR));
        deck.toggle_play(a).unwrap();
        deck.toggle_play(b).unwrap();

        let mut out = vec![9.0; 10];
        deck.render(&mut out);
        for sample in &out {
            assert_abs_diff_eq!(*sample, 0.75, epsilon = 1e-6);
        }
        assert_abs_diff_eq!(deck.now(), 0.01, epsilon = 1e-12);

        let rendered = deck.render_secs(0.25);
        assert_eq!(rendered.len(), 250);
        assert_abs_diff_eq!(deck.now(), 0.26, epsilon = 1e-12);
    }

    #[test]
    fn test_recording_without_input() {
        let mut deck = deck();
        assert!(matches!(deck.start_recording(None), Err(ReelError::NoInputSource)));
        assert_eq!(deck.tape_count(), 0);
        assert!(matches!(deck.stop_recording(), Err(ReelError::NotRecording)));
    }

    #[test]
    fn test_recording_from_buffer() {
        let mut deck = deck();
        let samples: Vec<f32> = (0..450).map(|i| i as f32).collect();
        let input = BufferInput::new(samples.clone(), SR, 64);

        let progress = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&progress);
        let callback: ProgressCallback = Box::new(move |p: &RecordingProgress, label: &str| {
            sink.borrow_mut().push((p.samples, label.to_string()))
        });

        let id = deck.start_recording_from(Box::new(input), Some(callback)).unwrap();
        assert!(deck.is_recording());
        // Placeholder is 0.1s of silence
        assert_eq!(deck.tape(id).unwrap().buffer().len(), 100);
        assert_eq!(deck.tape(id).unwrap().name(), "");

        assert_eq!(deck.pump_recording(), 450);
        let id_after = deck.stop_recording().unwrap();
        assert_eq!(id, id_after);
        assert!(!deck.is_recording());

        let tape = deck.tape(id).unwrap();
        assert_eq!(tape.buffer().samples(), samples.as_slice());
        // 64-sample blocks, 100-sample interval: reports at 128, 256, 384
        let progress = progress.borrow();
        assert_eq!(
            progress.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
            vec![128, 256, 384]
        );
        assert_eq!(progress[0].1, "0'0\"");
    }

    #[test]
    fn test_second_start_is_rejected_without_change() {
        let mut deck = deck();
        let id = deck
            .start_recording_from(Box::new(BufferInput::new(vec![1.0; 300], SR, 100)), None)
            .unwrap();
        deck.pump_recording();

        let err = deck
            .start_recording_from(Box::new(BufferInput::new(vec![2.0; 50], SR, 10)), None)
            .unwrap_err();
        assert!(matches!(err, ReelError::AlreadyRecording));
        assert_eq!(deck.recording_target(), Some(id));
        assert_eq!(deck.recording_progress().unwrap().samples, 300);
        assert_eq!(deck.tape_count(), 1);
    }

    #[test]
    fn test_sample_rate_mismatch_returns_input() {
        let (_tx, rx) = mpsc::channel();
        let mut deck = deck().with_input(Box::new(ChannelInput::new(rx, 48000, "mic")));
        assert!(matches!(
            deck.start_recording(None),
            Err(ReelError::SampleRateMismatch { input: 48000, deck: SR })
        ));
        assert!(deck.has_input());
        assert_eq!(deck.tape_count(), 0);
    }

    #[test]
    fn test_toggle_recording_with_live_input() {
        let (tx, rx) = mpsc::channel();
        let mut deck = deck().with_input(Box::new(ChannelInput::new(rx, SR, "mic")));

        let started = deck.toggle_recording(None).unwrap();
        let id = match started {
            RecordingEvent::Started(id) => id,
            other => panic!("unexpected {:?}", other),
        };
        assert!(!deck.has_input());

        tx.send(vec![0.5; 200]).unwrap();
        deck.pump_recording();
        tx.send(vec![0.25; 100]).unwrap();

        // Blocks still queued at stop are kept
        assert_eq!(deck.toggle_recording(None).unwrap(), RecordingEvent::Stopped(id));
        assert!(deck.has_input());
        let buffer = deck.tape(id).unwrap().buffer().clone();
        assert_eq!(buffer.len(), 300);
        assert_eq!(buffer.samples()[199], 0.5);
        assert_eq!(buffer.samples()[200], 0.25);
    }

    #[test]
    fn test_empty_recording_keeps_placeholder() {
        let (_tx, rx) = mpsc::channel::<Vec<f32>>();
        let mut deck = deck().with_input(Box::new(ChannelInput::new(rx, SR, "mic")));
        let id = deck.start_recording(None).unwrap();
        deck.stop_recording().unwrap();
        assert_eq!(deck.tape(id).unwrap().buffer().len(), 100);
    }

    #[test]
    fn test_recording_into_playing_tape_reapplies_rate() {
        let mut deck = deck();
        let id = deck
            .start_recording_from(Box::new(BufferInput::new(vec![0.5; 2000], SR, 500)), None)
            .unwrap();
        deck.toggle_play(id).unwrap();
        deck.stop_recording().unwrap();

        let tape = deck.tape(id).unwrap();
        assert_eq!(tape.duration(), 2.0);
        assert_eq!(tape.transport_state(), TransportState::PlayingForward);
        assert!(tape.has_source());
    }

    #[test]
    fn test_preload_directory() {
        let dir = TempDir::new().unwrap();
        let tone = vec![0.1f32; 500];
        export_wav(&tone, SR, &dir.path().join("b.wav"), ExportFormat::new(16)).unwrap();
        export_wav(&tone, SR, &dir.path().join("a.wav"), ExportFormat::new(16)).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not audio").unwrap();
        std::fs::write(dir.path().join("broken.wav"), "not audio either").unwrap();

        let mut deck = deck();
        let report = deck.preload(dir.path());
        assert_eq!(report.loaded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_complete());
        let names: Vec<_> = deck.tapes().map(|(_, t)| t.name().to_string()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_preload_configured_names() {
        let dir = TempDir::new().unwrap();
        export_wav(&[0.1; 100], SR, &dir.path().join("Tim.wav"), ExportFormat::default()).unwrap();

        let mut deck = Deck::new(DeckConfig {
            sample_rate: SR,
            preload: vec!["Tim".to_string(), "Ian".to_string()],
            ..DeckConfig::default()
        })
        .unwrap();
        let report = deck.preload(dir.path());
        assert_eq!(report.loaded, vec![TapeId(0)]);
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(report.failed[0].1, ReelError::FileNotFound { .. }));
        assert_eq!(deck.tape(TapeId(0)).unwrap().name(), "Tim");
    }
}

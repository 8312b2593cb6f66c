//! Word redaction pipeline.
//!
//! ## Stages (per file)
//!
//! ```text
//! 1. Match transcript words against the lexicon
//! 2. WindowCalculator → MuteWindow + ContextWindow per match
//! 3. Silence a private copy of the buffer via the configured MuteStrategy
//! 4. Spectral gate over each ContextWindow (in place, per channel)
//! 5. Re-zero the mute windows so redacted audio is exactly silent
//! ```
//!
//! Degenerate windows and regions too small for the gate are logged and
//! skipped; they never abort the file.

pub mod fade;
pub mod silence;
pub mod smooth;
pub mod strategy;
pub mod window;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::{
    audio::{read_wav, write_wav, AudioBuffer},
    config::RedactConfig,
    error::Result,
    lexicon::CurseLexicon,
    transcript::{flatten_transcript_file, flattened_path, Transcript, Word},
};

use self::{
    silence::{silence_with, zero_window},
    smooth::{smooth_region, SpectralGate},
    strategy::{strategy_for, MuteStrategy},
    window::{WindowCalculator, WordWindows},
};

/// Suffix appended to the audio path for the redacted output.
pub const CLEAN_SUFFIX: &str = "_clean_.wav";

/// Counters describing one redaction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RedactionReport {
    pub words: usize,
    pub matched: usize,
    pub muted: usize,
    pub degenerate: usize,
    pub smoothed: usize,
    pub smoothing_skipped: usize,
}

/// A denylisted word and the windows derived from it.
#[derive(Debug, Clone)]
pub struct MatchedWord {
    pub word: Word,
    pub windows: WordWindows,
}

#[derive(Debug, Clone)]
pub struct RedactionOutcome {
    pub buffer: AudioBuffer,
    pub matches: Vec<MatchedWord>,
    pub report: RedactionReport,
}

/// One (transcript, audio) pair to process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactJob {
    pub transcript: PathBuf,
    pub audio: PathBuf,
    /// Write the output here instead of next to the audio file.
    pub output_dir: Option<PathBuf>,
}

impl RedactJob {
    pub fn new(transcript: impl Into<PathBuf>, audio: impl Into<PathBuf>) -> Self {
        Self {
            transcript: transcript.into(),
            audio: audio.into(),
            output_dir: None,
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// `<audio>_clean_.wav`, optionally relocated into `output_dir`.
    pub fn output_path(&self) -> PathBuf {
        match (&self.output_dir, self.audio.file_name()) {
            (Some(dir), Some(name)) => {
                let mut name = name.to_os_string();
                name.push(CLEAN_SUFFIX);
                dir.join(name)
            }
            _ => {
                let mut path = self.audio.as_os_str().to_os_string();
                path.push(CLEAN_SUFFIX);
                PathBuf::from(path)
            }
        }
    }
}

/// A finished job: redacted buffer plus where it came from and went.
#[derive(Debug, Clone)]
pub struct ProcessedSegment {
    pub audio: PathBuf,
    pub transcript: PathBuf,
    pub output: PathBuf,
    pub buffer: AudioBuffer,
    pub report: RedactionReport,
}

/// Shared, read-only redaction engine. Wrap in `Arc` to use from many jobs.
pub struct Redactor {
    config: RedactConfig,
    lexicon: Arc<CurseLexicon>,
    calculator: WindowCalculator,
    strategy: Box<dyn MuteStrategy>,
}

impl Redactor {
    pub fn new(config: RedactConfig, lexicon: Arc<CurseLexicon>) -> Self {
        let calculator = WindowCalculator::from_config(&config);
        let strategy = strategy_for(&config);
        Self {
            config,
            lexicon,
            calculator,
            strategy,
        }
    }

    pub fn config(&self) -> &RedactConfig {
        &self.config
    }

    pub fn lexicon(&self) -> &CurseLexicon {
        &self.lexicon
    }

    /// Denylisted words in `transcript` with their windows on `buffer`.
    pub fn find_matches(&self, buffer: &AudioBuffer, transcript: &Transcript) -> Vec<MatchedWord> {
        transcript
            .iter()
            .filter(|w| self.lexicon.is_denied(&w.word))
            .map(|w| MatchedWord {
                word: w.clone(),
                windows: self.calculator.compute(w, buffer),
            })
            .collect()
    }

    /// Redact `buffer` according to `transcript`. The input is not modified.
    pub fn redact(&self, buffer: &AudioBuffer, transcript: &Transcript) -> RedactionOutcome {
        let matches = self.find_matches(buffer, transcript);
        let mut report = RedactionReport {
            words: transcript.len(),
            matched: matches.len(),
            ..RedactionReport::default()
        };

        let mut active: Vec<WordWindows> = Vec::with_capacity(matches.len());
        for m in &matches {
            if m.windows.mute.is_degenerate() {
                warn!(
                    word = %m.word.word,
                    start = m.word.start,
                    end = m.word.end,
                    "degenerate mute window; word left un-muted"
                );
                report.degenerate += 1;
                continue;
            }
            debug!(
                word = %m.word.word,
                mute_start = m.windows.mute.start_frame,
                mute_end = m.windows.mute.end_frame,
                context_start = m.windows.context.start_frame,
                context_end = m.windows.context.end_frame,
                "muting word"
            );
            active.push(m.windows);
        }
        report.muted = active.len();

        // Silencer: private copy, never the caller's buffer.
        let mut muted = silence_with(buffer, &active, self.strategy.as_ref());

        if self.config.smoothing_enabled && !active.is_empty() {
            let mut gate = SpectralGate::new(self.config.spectral_gate.clone());
            for w in &active {
                match smooth_region(&mut gate, &mut muted, &w.context) {
                    Ok(()) => report.smoothed += 1,
                    Err(e) => {
                        warn!(
                            context_start = w.context.start_frame,
                            context_end = w.context.end_frame,
                            error = %e,
                            "skipping boundary smoothing"
                        );
                        report.smoothing_skipped += 1;
                    }
                }
            }
            for w in &active {
                zero_window(&mut muted, &w.mute);
            }
        }

        RedactionOutcome {
            buffer: muted,
            matches,
            report,
        }
    }

    /// Decode, normalize, redact and encode one job.
    ///
    /// Writes the flattened transcript to `<transcript>_new.json` and the
    /// redacted audio to `job.output_path()`.
    pub fn process_file(&self, job: &RedactJob) -> Result<ProcessedSegment> {
        let span = info_span!("redact_file", audio = %job.audio.display());
        let _enter = span.enter();

        let buffer = read_wav(&job.audio)?;
        let transcript = flatten_transcript_file(&job.transcript, &flattened_path(&job.transcript))?;
        let outcome = self.redact(&buffer, &transcript);

        let output = job.output_path();
        write_wav(&outcome.buffer, &output)?;

        info!(
            output = %output.display(),
            strategy = self.strategy.name(),
            words = outcome.report.words,
            matched = outcome.report.matched,
            muted = outcome.report.muted,
            degenerate = outcome.report.degenerate,
            smoothing_skipped = outcome.report.smoothing_skipped,
            "file redacted"
        );

        Ok(ProcessedSegment {
            audio: job.audio.clone(),
            transcript: job.transcript.clone(),
            output,
            buffer: outcome.buffer,
            report: outcome.report,
        })
    }

    /// Convenience for a single (audio, transcript) pair on disk.
    pub fn process_paths(&self, audio: &Path, transcript: &Path) -> Result<ProcessedSegment> {
        self.process_file(&RedactJob::new(transcript, audio))
    }
}

impl std::fmt::Debug for Redactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Redactor")
            .field("config", &self.config)
            .field("lexicon_words", &self.lexicon.len())
            .field("strategy", &self.strategy.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MuteMode;

    fn tone(frames: usize, sample_rate: u32) -> AudioBuffer {
        let samples = (0..frames)
            .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / sample_rate as f32).sin() * 0.5)
            .collect();
        AudioBuffer::mono(samples, sample_rate)
    }

    fn redactor(config: RedactConfig) -> Redactor {
        Redactor::new(config, Arc::new(CurseLexicon::from_words(["damn", "heck"])))
    }

    fn transcript() -> Transcript {
        Transcript::new(vec![
            Word::new("well", 1.0, 1.5),
            Word::new("damn", 2.0, 2.4),
            Word::new("that", 3.0, 3.3),
            Word::new("heck", 6.0, 6.5),
        ])
    }

    #[test]
    fn matched_words_are_zero_and_shape_is_kept() {
        let input = tone(160_000, 16_000);
        let outcome = redactor(RedactConfig::default()).redact(&input, &transcript());

        assert_eq!(outcome.buffer.samples.len(), input.samples.len());
        assert_eq!(outcome.buffer.channels, input.channels);
        assert_eq!(outcome.report.matched, 2);
        assert_eq!(outcome.report.muted, 2);
        assert_eq!(outcome.report.smoothed, 2);

        let damn = &outcome.matches[0].windows.mute;
        assert_eq!((damn.start_frame, damn.end_frame), (32_640, 37_760));
        for m in &outcome.matches {
            let w = m.windows.mute;
            assert!(outcome.buffer.samples[w.start_frame..w.end_frame]
                .iter()
                .all(|&s| s == 0.0));
        }
    }

    #[test]
    fn unmatched_words_untouched_when_smoothing_disabled() {
        let input = tone(160_000, 16_000);
        let config = RedactConfig {
            smoothing_enabled: false,
            ..RedactConfig::default()
        };
        let outcome = redactor(config).redact(&input, &transcript());

        // "well" (1.0–1.5 s) and "that" (3.0–3.3 s) are not denylisted.
        assert_eq!(outcome.buffer.samples[16_000..24_000], input.samples[16_000..24_000]);
        assert_eq!(outcome.buffer.samples[48_000..52_800], input.samples[48_000..52_800]);
        // Outside every mute window the silencer changed nothing.
        assert_eq!(outcome.buffer.samples[..32_640], input.samples[..32_640]);
    }

    #[test]
    fn rerun_leaves_muted_regions_unchanged() {
        let input = tone(160_000, 16_000);
        let r = redactor(RedactConfig::default());
        let first = r.redact(&input, &transcript());
        let second = r.redact(&first.buffer, &transcript());

        for m in &first.matches {
            let w = m.windows.mute;
            assert_eq!(
                second.buffer.samples[w.start_frame..w.end_frame],
                first.buffer.samples[w.start_frame..w.end_frame]
            );
        }
    }

    #[test]
    fn input_buffer_is_never_mutated() {
        let input = tone(32_000, 16_000);
        let snapshot = input.clone();
        let t = Transcript::new(vec![Word::new("damn", 0.5, 0.9)]);
        let _ = redactor(RedactConfig::default()).redact(&input, &t);
        assert_eq!(input, snapshot);
    }

    #[test]
    fn degenerate_and_tiny_words_are_counted_not_fatal() {
        let input = tone(16_000, 16_000);
        let t = Transcript::new(vec![
            Word::new("damn", 0.5, 0.5),
            Word::new("heck", 5.0, 6.0),
        ]);
        let outcome = redactor(RedactConfig::default()).redact(&input, &t);
        assert_eq!(outcome.report.matched, 2);
        assert_eq!(outcome.report.degenerate, 2);
        assert_eq!(outcome.report.muted, 0);
        assert_eq!(outcome.buffer, input);
    }

    #[test]
    fn tiny_context_skips_smoothing_but_still_mutes() {
        let input = tone(1_000, 1_000);
        let config = RedactConfig {
            context_pad_seconds: 0.0,
            ..RedactConfig::default()
        };
        // 30 ms word → 30-frame context at 1 kHz, below the gate minimum.
        let t = Transcript::new(vec![Word::new("damn", 0.5, 0.53)]);
        let outcome = redactor(config).redact(&input, &t);
        assert_eq!(outcome.report.muted, 1);
        assert_eq!(outcome.report.smoothing_skipped, 1);
        let w = outcome.matches[0].windows.mute;
        assert!(outcome.buffer.samples[w.start_frame..w.end_frame]
            .iter()
            .all(|&s| s == 0.0));
    }

    #[test]
    fn fade_envelope_strategy_mutes_with_ramps() {
        let input = AudioBuffer::mono(vec![0.5; 160_000], 16_000);
        let config = RedactConfig {
            mute_mode: MuteMode::FadeEnvelope,
            smoothing_enabled: false,
            ..RedactConfig::default()
        };
        let outcome = redactor(config).redact(&input, &transcript());
        let w = outcome.matches[0].windows.mute;
        assert!(outcome.buffer.samples[w.start_frame..w.end_frame]
            .iter()
            .all(|&s| s == 0.0));
        assert!(outcome.buffer.samples[w.start_frame - 1] < 0.5);
        assert!(outcome.buffer.samples[w.end_frame] < 0.5);
    }

    #[test]
    fn output_path_naming() {
        let job = RedactJob::new("t.json", "/audio/take1.wav");
        assert_eq!(job.output_path(), PathBuf::from("/audio/take1.wav_clean_.wav"));
        let job = job.with_output_dir("/out");
        assert_eq!(job.output_path(), PathBuf::from("/out/take1.wav_clean_.wav"));
    }
}

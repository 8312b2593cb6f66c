//! # hushword-core
//!
//! Redaction engine: mutes denylisted words in a recorded speech track given a
//! word-level, time-aligned transcript.
//!
//! ## Architecture
//!
//! ```text
//! transcript.json ─► Transcript (normalized words)
//!                          │
//!                    CurseLexicon::is_denied
//!                          │
//!                  WindowCalculator ─► MuteWindow + ContextWindow
//!                          │
//! audio.wav ─► AudioBuffer ─► silence (copy) ─► SpectralGate over context
//!                                                    │
//!                                           <audio>_clean_.wav
//!                                                    │
//!                                       SegmentCombiner (optional)
//! ```
//!
//! `BatchOrchestrator` runs many (transcript, audio) jobs on OS threads under a
//! bounded budget. Jobs share nothing mutable; the lexicon is read-only.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod batch;
pub mod combine;
pub mod config;
pub mod error;
pub mod lexicon;
pub mod redact;
pub mod transcript;

// Convenience re-exports for downstream crates
pub use audio::AudioBuffer;
pub use batch::{AdmissionPolicy, BatchEvent, BatchOrchestrator, JobReport};
pub use combine::{CombinedOutput, SegmentCombiner};
pub use config::{MuteMode, RedactConfig, SpectralGateConfig};
pub use error::RedactError;
pub use lexicon::CurseLexicon;
pub use redact::{ProcessedSegment, RedactJob, RedactionOutcome, RedactionReport, Redactor};
pub use transcript::{Transcript, Word};

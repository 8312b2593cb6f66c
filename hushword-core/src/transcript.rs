//! Transcript normalization.
//!
//! Flattens a nested `segments[].words[].{word,start,end}` transcription into
//! an ordered list of `Word`s with punctuation-stripped, lower-cased text.
//! A previously flattened `[{word,start,end}]` array is accepted as well.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{RedactError, Result};

/// Characters stripped from both ends of every word.
const STRIP_CHARS: &[char] = &['\'', ',', '.', '"', '-', '_', '/', '`', '?', '!', ';', ' '];

/// Suffix of the flattened transcript written next to the source file.
const FLATTENED_SUFFIX: &str = "_new.json";

/// One time-aligned, normalized word.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub word: String,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
}

impl Word {
    pub fn new(word: impl AsRef<str>, start: f64, end: f64) -> Self {
        Self {
            word: normalize_word(word.as_ref()),
            start,
            end,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Chronologically ordered words.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    pub words: Vec<Word>,
}

/// Strip surrounding punctuation / quotes and lower-case.
pub fn normalize_word(raw: &str) -> String {
    raw.trim_matches(STRIP_CHARS).to_lowercase()
}

impl Transcript {
    pub fn new(words: Vec<Word>) -> Self {
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Word> {
        self.words.iter()
    }

    /// Parse a transcript file (nested or already flattened).
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&raw).map_err(|e| {
            RedactError::MalformedTranscript(format!("{}: {e}", path.display()))
        })?;
        Self::from_value(&value)
    }

    /// Flatten a parsed transcription result.
    ///
    /// # Errors
    /// `MalformedTranscript` when the root has no `segments` array, a segment
    /// has no `words` array, or a word entry is missing `word`/`start`/`end`.
    /// Entries whose fields are present but unusable are skipped with a warning.
    pub fn from_value(value: &Value) -> Result<Self> {
        let mut words = Vec::new();

        if let Some(flat) = value.as_array() {
            for (idx, entry) in flat.iter().enumerate() {
                if let Some(word) = parse_word(entry, 0, idx)? {
                    words.push(word);
                }
            }
            return Ok(Self { words });
        }

        let segments = value
            .get("segments")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                RedactError::MalformedTranscript("missing `segments` array".into())
            })?;

        for (seg_idx, segment) in segments.iter().enumerate() {
            let entries = segment
                .get("words")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    RedactError::MalformedTranscript(format!(
                        "segment {seg_idx} has no `words` array"
                    ))
                })?;
            for (idx, entry) in entries.iter().enumerate() {
                if let Some(word) = parse_word(entry, seg_idx, idx)? {
                    words.push(word);
                }
            }
        }

        Ok(Self { words })
    }

    /// Write the flattened `[{word,start,end}]` form as pretty JSON.
    pub fn save_flattened(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Word;
    type IntoIter = std::slice::Iter<'a, Word>;

    fn into_iter(self) -> Self::IntoIter {
        self.words.iter()
    }
}

/// `<input>_new.json`, next to the input file.
pub fn flattened_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push(FLATTENED_SUFFIX);
    PathBuf::from(name)
}

/// Load `input`, normalize it, and persist the flattened form to `output`.
pub fn flatten_transcript_file(input: &Path, output: &Path) -> Result<Transcript> {
    let transcript = Transcript::load(input)?;
    transcript.save_flattened(output)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        words = transcript.len(),
        "transcript flattened"
    );
    Ok(transcript)
}

fn parse_word(entry: &Value, segment: usize, index: usize) -> Result<Option<Word>> {
    let field = |name: &str| {
        entry.get(name).ok_or_else(|| {
            RedactError::MalformedTranscript(format!(
                "segment {segment} word {index} is missing `{name}`"
            ))
        })
    };
    let text = field("word")?;
    let start = field("start")?;
    let end = field("end")?;

    let (Some(text), Some(start), Some(end)) = (text.as_str(), start.as_f64(), end.as_f64())
    else {
        warn!(segment, index, "skipping word entry with mistyped fields");
        return Ok(None);
    };

    if !start.is_finite() || !end.is_finite() || start < 0.0 || start > end {
        warn!(segment, index, start, end, "skipping word entry with invalid timing");
        return Ok(None);
    }

    Ok(Some(Word::new(text, start, end)))
}

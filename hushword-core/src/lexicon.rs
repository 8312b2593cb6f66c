//! Denylisted-word lexicon.
//!
//! Words are read from the first column of a delimited text file and
//! normalized exactly like transcript words, so membership is a plain set
//! lookup: case-insensitive, punctuation-stripped, no stemming.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{RedactError, Result};
use crate::transcript::normalize_word;

#[derive(Debug, Clone, Default)]
pub struct CurseLexicon {
    words: HashSet<String>,
}

impl CurseLexicon {
    /// Build from any list of words. Entries that normalize to "" are dropped.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| normalize_word(w.as_ref()))
            .filter(|w| !w.is_empty())
            .collect();
        Self { words }
    }

    /// Load the first column of every row in `path`.
    ///
    /// # Errors
    /// `LexiconLoad` if the file cannot be read or contains no words.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| RedactError::LexiconLoad(format!("{}: {e}", path.display())))?;
        let lexicon = Self::from_words(raw.lines().filter_map(first_column));
        if lexicon.is_empty() {
            return Err(RedactError::LexiconLoad(format!(
                "{}: no words found",
                path.display()
            )));
        }
        info!(path = %path.display(), words = lexicon.len(), "lexicon loaded");
        Ok(lexicon)
    }

    /// Whether `word` (normalized first) is denylisted.
    pub fn is_denied(&self, word: &str) -> bool {
        self.words.contains(&normalize_word(word))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// First field of a comma-separated row. Handles a double-quoted field with
/// `""` escapes; returns `None` for blank rows.
fn first_column(line: &str) -> Option<String> {
    let line = line.trim_start_matches('\u{feff}').trim();
    if line.is_empty() {
        return None;
    }

    let field = if let Some(rest) = line.strip_prefix('"') {
        let mut out = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    out.push('"');
                    chars.next();
                } else {
                    break;
                }
            } else {
                out.push(c);
            }
        }
        out
    } else {
        line.split(',').next().unwrap_or_default().to_string()
    };

    let field = field.trim();
    (!field.is_empty()).then(|| field.to_string())
}

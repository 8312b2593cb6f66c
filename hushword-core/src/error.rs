use thiserror::Error;

/// All errors produced by hushword-core.
#[derive(Debug, Error)]
pub enum RedactError {
    #[error("audio decode error: {0}")]
    Decode(String),

    #[error("audio encode error: {0}")]
    Encode(String),

    #[error("malformed transcript: {0}")]
    MalformedTranscript(String),

    #[error("lexicon load error: {0}")]
    LexiconLoad(String),

    #[error("boundary smoothing skipped: {0}")]
    Smoothing(String),

    #[error("segment format mismatch in {path}: expected {expected}, found {found}")]
    FormatMismatch {
        path: std::path::PathBuf,
        expected: String,
        found: String,
    },

    #[error("no segments to combine")]
    NoSegments,

    #[error("job panicked: {0}")]
    JobPanicked(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RedactError>;

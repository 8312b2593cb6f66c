//! Mute / context window computation.
//!
//! ## Algorithm
//!
//! For a matched word spanning `[start, end]` seconds:
//!
//! 1. `diff = end - start`
//! 2. `new_end = start + diff * ratio`, `new_start = end - diff * ratio`
//! 3. Frames are `round(t * sample_rate)`; start ≥ 0, end ≤ `frames - 1`.
//! 4. The context window pads the *original* span by `pad` seconds on each
//!    side, clamped to `[0, duration]`.
//!
//! A mute window with `end_frame <= start_frame` is degenerate: nothing gets
//! muted for that word.

use crate::audio::AudioBuffer;
use crate::config::RedactConfig;
use crate::transcript::Word;

/// Half-open frame range `[start_frame, end_frame)` to silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuteWindow {
    pub start_frame: usize,
    pub end_frame: usize,
}

impl MuteWindow {
    pub fn is_degenerate(&self) -> bool {
        self.end_frame <= self.start_frame
    }

    pub fn len(&self) -> usize {
        self.end_frame.saturating_sub(self.start_frame)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Padded region around a word, handed to the boundary smoother.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextWindow {
    pub start_secs: f64,
    pub end_secs: f64,
    pub start_frame: usize,
    pub end_frame: usize,
}

impl ContextWindow {
    pub fn len(&self) -> usize {
        self.end_frame.saturating_sub(self.start_frame)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Both windows derived from one matched word.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WordWindows {
    pub mute: MuteWindow,
    pub context: ContextWindow,
    /// Inner bounds (seconds) before frame conversion.
    pub mute_start_secs: f64,
    pub mute_end_secs: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct WindowCalculator {
    shrink_ratio: f64,
    context_pad: f64,
}

impl WindowCalculator {
    pub fn new(shrink_ratio: f64, context_pad: f64) -> Self {
        Self {
            shrink_ratio,
            context_pad,
        }
    }

    pub fn from_config(config: &RedactConfig) -> Self {
        Self::new(config.mute_shrink_ratio, config.context_pad_seconds)
    }

    pub fn compute(&self, word: &Word, buffer: &AudioBuffer) -> WordWindows {
        let frames = buffer.frames();
        let last = frames.saturating_sub(1);

        let diff = word.end - word.start;
        let mute_end_secs = word.start + diff * self.shrink_ratio;
        let mute_start_secs = word.end - diff * self.shrink_ratio;

        let mute = MuteWindow {
            start_frame: buffer.secs_to_frame(mute_start_secs).min(last),
            end_frame: buffer.secs_to_frame(mute_end_secs).min(last),
        };

        let duration = buffer.duration_secs();
        let start_secs = (word.start - self.context_pad).max(0.0);
        let end_secs = (word.end + self.context_pad).min(duration);
        let context = ContextWindow {
            start_secs,
            end_secs,
            start_frame: buffer.secs_to_frame(start_secs).min(frames),
            end_frame: buffer.secs_to_frame(end_secs).min(frames),
        };

        WordWindows {
            mute,
            context,
            mute_start_secs,
            mute_end_secs,
        }
    }
}

impl Default for WindowCalculator {
    fn default() -> Self {
        Self::from_config(&RedactConfig::default())
    }
}

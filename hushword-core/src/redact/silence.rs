//! Silencer: zeroes mute windows in a private copy of the buffer.
//!
//! The caller's buffer is never touched, so repeated runs over the same
//! decoded source are reproducible.

use super::strategy::MuteStrategy;
use super::window::{MuteWindow, WordWindows};
use crate::audio::AudioBuffer;

/// Copy `buffer` and zero every channel across each window.
///
/// Windows may arrive in any order; overlaps simply zero the union.
pub fn silence(buffer: &AudioBuffer, windows: &[MuteWindow]) -> AudioBuffer {
    let mut muted = buffer.clone();
    for window in windows {
        zero_window(&mut muted, window);
    }
    muted
}

/// Copy `buffer` and apply `strategy` to each word's windows.
pub fn silence_with(
    buffer: &AudioBuffer,
    windows: &[WordWindows],
    strategy: &dyn MuteStrategy,
) -> AudioBuffer {
    let mut muted = buffer.clone();
    for w in windows {
        strategy.apply(&mut muted, w);
    }
    muted
}

/// Zero `[start_frame, end_frame)` in place. Degenerate windows are a no-op.
pub fn zero_window(buffer: &mut AudioBuffer, window: &MuteWindow) {
    if window.is_degenerate() {
        return;
    }
    buffer.zero_frames(window.start_frame, window.end_frame);
}

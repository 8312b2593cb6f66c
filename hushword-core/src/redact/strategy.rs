//! Mute strategies.
//!
//! `MuteStrategy` is the seam between window computation and the samples:
//! swap `HardZero` (default) for `FadeEnvelope` without touching the pipeline.
//! Both mutate the buffer in place; the caller owns the copy.

use super::fade::fade_in_place;
use super::silence::zero_window;
use super::window::WordWindows;
use crate::audio::AudioBuffer;
use crate::config::{MuteMode, RedactConfig};

pub trait MuteStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Silence one word's mute window in `buffer`.
    fn apply(&self, buffer: &mut AudioBuffer, windows: &WordWindows);
}

/// Zero the mute window, nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct HardZero;

impl MuteStrategy for HardZero {
    fn name(&self) -> &'static str {
        "hard_zero"
    }

    fn apply(&self, buffer: &mut AudioBuffer, windows: &WordWindows) {
        zero_window(buffer, &windows.mute);
    }
}

/// Fade out into the mute window, zero it, fade back in after it.
#[derive(Debug, Clone, Copy)]
pub struct FadeEnvelope {
    pub fade_duration: f64,
}

impl MuteStrategy for FadeEnvelope {
    fn name(&self) -> &'static str {
        "fade_envelope"
    }

    fn apply(&self, buffer: &mut AudioBuffer, windows: &WordWindows) {
        if windows.mute.is_degenerate() {
            return;
        }
        let fade_frames = buffer.secs_to_frame(self.fade_duration);
        fade_in_place(
            buffer,
            windows.mute.start_frame,
            windows.mute.end_frame,
            fade_frames,
        );
        zero_window(buffer, &windows.mute);
    }
}

/// Build the strategy selected by `config.mute_mode`.
pub fn strategy_for(config: &RedactConfig) -> Box<dyn MuteStrategy> {
    match config.mute_mode {
        MuteMode::HardZero => Box::new(HardZero),
        MuteMode::FadeEnvelope => Box::new(FadeEnvelope {
            fade_duration: config.fade_duration_seconds,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redact::window::WindowCalculator;
    use crate::transcript::Word;

    fn setup() -> (AudioBuffer, WordWindows) {
        let buffer = AudioBuffer::mono(vec![0.5; 1_000], 100);
        let windows = WindowCalculator::new(0.9, 0.1).compute(&Word::new("x", 4.0, 5.0), &buffer);
        (buffer, windows)
    }

    #[test]
    fn hard_zero_only_touches_mute_window() {
        let (mut buffer, windows) = setup();
        HardZero.apply(&mut buffer, &windows);
        let (s, e) = (windows.mute.start_frame, windows.mute.end_frame);
        assert_eq!((s, e), (410, 490));
        assert!(buffer.samples[s..e].iter().all(|&v| v == 0.0));
        assert!(buffer.samples[..s].iter().all(|&v| v == 0.5));
        assert!(buffer.samples[e..].iter().all(|&v| v == 0.5));
    }

    #[test]
    fn fade_envelope_ramps_then_zeroes() {
        let (mut buffer, windows) = setup();
        FadeEnvelope { fade_duration: 0.06 }.apply(&mut buffer, &windows);
        let (s, e) = (windows.mute.start_frame, windows.mute.end_frame);
        assert!(buffer.samples[s..e].iter().all(|&v| v == 0.0));
        // 6-frame ramps on either side; the outer ends keep full gain.
        assert!(buffer.samples[s - 5..s].iter().all(|&v| v < 0.5));
        assert_eq!(buffer.samples[s - 6], 0.5);
        assert_eq!(buffer.samples[s - 7], 0.5);
        assert!(buffer.samples[e..e + 5].iter().all(|&v| v < 0.5));
        assert_eq!(buffer.samples[e + 5], 0.5);
    }

    #[test]
    fn config_selects_strategy() {
        let mut config = RedactConfig::default();
        assert_eq!(strategy_for(&config).name(), "hard_zero");
        config.mute_mode = MuteMode::FadeEnvelope;
        assert_eq!(strategy_for(&config).name(), "fade_envelope");
    }
}

//! Linear fade envelopes around a window.
//!
//! Fade-out: gain falls linearly from 1 to 0 across `fade_duration` and
//! reaches 0 exactly at the window start. Fade-in: gain rises from 0 at the
//! window end back to 1 across `fade_duration`. The window interior is not
//! touched, so this works with or without muting.

use serde::Serialize;

use crate::audio::AudioBuffer;

/// Boundary times (seconds) of the two ramps that were applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FadeTimestamps {
    pub fade_out_start: f64,
    pub fade_out_end: f64,
    pub fade_in_start: f64,
    pub fade_in_end: f64,
}

/// Return a faded copy of `buffer` plus the ramp boundaries.
pub fn apply_fade(
    buffer: &AudioBuffer,
    start_secs: f64,
    end_secs: f64,
    fade_duration: f64,
) -> (AudioBuffer, FadeTimestamps) {
    let mut faded = buffer.clone();
    let frames = buffer.frames();
    let start = buffer.secs_to_frame(start_secs).min(frames);
    let end = buffer.secs_to_frame(end_secs).min(frames);
    let fade_frames = buffer.secs_to_frame(fade_duration.max(0.0));
    fade_in_place(&mut faded, start, end, fade_frames);

    let timestamps = FadeTimestamps {
        fade_out_start: (start_secs - fade_duration).max(0.0),
        fade_out_end: start_secs,
        fade_in_start: end_secs,
        fade_in_end: (end_secs + fade_duration).min(buffer.duration_secs()),
    };
    (faded, timestamps)
}

/// Apply both ramps in place around frames `[start, end)`.
pub fn fade_in_place(buffer: &mut AudioBuffer, start: usize, end: usize, fade_frames: usize) {
    if fade_frames == 0 {
        return;
    }
    let frames = buffer.frames();
    // Endpoints land exactly on 1 and 0; a single-frame ramp is just the 0.
    let steps = (fade_frames - 1).max(1) as f32;

    let start = start.min(frames);
    for frame in start.saturating_sub(fade_frames)..start {
        let gain = (start - 1 - frame) as f32 / steps;
        buffer.scale_frame(frame, gain);
    }

    let end = end.min(frames);
    for frame in end..(end + fade_frames).min(frames) {
        let gain = (frame - end) as f32 / steps;
        buffer.scale_frame(frame, gain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ones(frames: usize) -> AudioBuffer {
        AudioBuffer::mono(vec![1.0; frames], 100)
    }

    #[test]
    fn ramps_meet_zero_at_window_edges() {
        // 10 frames of fade at 100 Hz = 0.1 s.
        let (out, ts) = apply_fade(&ones(100), 0.3, 0.6, 0.1);

        assert_eq!(out.samples[..20], vec![1.0; 20][..]);
        assert_abs_diff_eq!(out.samples[20], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(out.samples[29], 0.0, epsilon = 1e-6);
        // Interior untouched: fading does not mute.
        assert_eq!(out.samples[30..60], vec![1.0; 30][..]);
        assert_abs_diff_eq!(out.samples[60], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(out.samples[69], 1.0, epsilon = 1e-6);
        assert_eq!(out.samples[70..], vec![1.0; 30][..]);

        assert_abs_diff_eq!(ts.fade_out_start, 0.2, epsilon = 1e-9);
        assert_eq!(ts.fade_out_end, 0.3);
        assert_eq!(ts.fade_in_start, 0.6);
        assert_abs_diff_eq!(ts.fade_in_end, 0.7, epsilon = 1e-9);
    }

    #[test]
    fn gains_are_monotonic() {
        let (out, _) = apply_fade(&ones(100), 0.3, 0.6, 0.1);
        assert!(out.samples[20..30].windows(2).all(|w| w[0] > w[1]));
        assert!(out.samples[60..70].windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn ramp_steps_are_even_between_endpoints() {
        let (out, _) = apply_fade(&ones(100), 0.3, 0.6, 0.1);
        for (i, frame) in (20..30).enumerate() {
            assert_abs_diff_eq!(out.samples[frame], 1.0 - i as f32 / 9.0, epsilon = 1e-6);
        }
        for (i, frame) in (60..70).enumerate() {
            assert_abs_diff_eq!(out.samples[frame], i as f32 / 9.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn single_frame_ramp_only_zeroes_the_edge() {
        let (out, _) = apply_fade(&ones(100), 0.3, 0.6, 0.01);
        assert_eq!(out.samples[28], 1.0);
        assert_eq!(out.samples[29], 0.0);
        assert_eq!(out.samples[30], 1.0);
        assert_eq!(out.samples[60], 0.0);
        assert_eq!(out.samples[61], 1.0);
    }

    #[test]
    fn ramps_clamp_at_buffer_edges() {
        let (out, ts) = apply_fade(&ones(100), 0.05, 0.95, 0.1);
        assert_eq!(out.frames(), 100);
        assert_abs_diff_eq!(out.samples[4], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(out.samples[95], 0.0, epsilon = 1e-6);
        assert_eq!(ts.fade_out_start, 0.0);
        assert_abs_diff_eq!(ts.fade_in_end, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn input_buffer_is_not_mutated() {
        let input = ones(50);
        let _ = apply_fade(&input, 0.2, 0.3, 0.05);
        assert!(input.samples.iter().all(|&s| s == 1.0));
    }

    #[test]
    fn stereo_frames_fade_together() {
        let input = AudioBuffer::new(vec![1.0; 200], 2, 100);
        let (out, _) = apply_fade(&input, 0.5, 0.6, 0.1);
        for frame in 40..50 {
            assert_eq!(out.samples[frame * 2], out.samples[frame * 2 + 1]);
        }
        assert_abs_diff_eq!(out.samples[49 * 2], 0.0, epsilon = 1e-6);
    }
}

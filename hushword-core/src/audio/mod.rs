//! In-memory audio buffers and WAV I/O.
//!
//! Samples are interleaved f32 in roughly [-1.0, 1.0]. A "frame" is one sample
//! per channel; every time → index conversion in the crate is in frames.
//! Redaction never changes a buffer's length or channel layout.

pub mod wav;

pub use wav::{read_wav, write_wav};

/// An owned block of interleaved PCM samples at a known rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Interleaved f32 samples.
    pub samples: Vec<f32>,
    /// Channel count (1 = mono).
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        debug_assert!(channels > 0, "AudioBuffer needs at least one channel");
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// A mono buffer.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples, 1, sample_rate)
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels.max(1))
    }

    /// Returns the duration of this buffer in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Returns true if the buffer contains no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// De-interleave frames `[start, end)` of one channel.
    pub fn channel_slice(&self, channel: usize, start: usize, end: usize) -> Vec<f32> {
        let ch = usize::from(self.channels);
        let end = end.min(self.frames());
        if channel >= ch || start >= end {
            return Vec::new();
        }
        if ch == 1 {
            return self.samples[start..end].to_vec();
        }
        (start..end).map(|f| self.samples[f * ch + channel]).collect()
    }

    /// Write `data` back into one channel starting at frame `start`, in place.
    ///
    /// Values past the end of the buffer are dropped.
    pub fn write_channel(&mut self, channel: usize, start: usize, data: &[f32]) {
        let ch = usize::from(self.channels);
        if channel >= ch {
            return;
        }
        let frames = self.frames();
        if ch == 1 {
            let end = (start + data.len()).min(frames);
            if start < end {
                self.samples[start..end].copy_from_slice(&data[..end - start]);
            }
            return;
        }
        for (offset, &value) in data.iter().enumerate() {
            let frame = start + offset;
            if frame >= frames {
                break;
            }
            self.samples[frame * ch + channel] = value;
        }
    }

    /// Zero every channel across frames `[start, end)`, in place.
    pub fn zero_frames(&mut self, start: usize, end: usize) {
        let ch = usize::from(self.channels);
        let end = end.min(self.frames());
        if start >= end {
            return;
        }
        self.samples[start * ch..end * ch].fill(0.0);
    }

    /// Multiply every channel of frame `frame` by `gain`, in place.
    pub fn scale_frame(&mut self, frame: usize, gain: f32) {
        let ch = usize::from(self.channels);
        if frame >= self.frames() {
            return;
        }
        for s in &mut self.samples[frame * ch..(frame + 1) * ch] {
            *s *= gain;
        }
    }

    /// Convert seconds to a frame index with `round(t * rate)`.
    ///
    /// Negative times map to 0; the result is not clamped to the buffer end.
    pub fn secs_to_frame(&self, secs: f64) -> usize {
        let idx = (secs * self.sample_rate as f64).round();
        if idx.is_finite() && idx > 0.0 {
            idx as usize
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_ramp(frames: usize) -> AudioBuffer {
        let mut samples = Vec::with_capacity(frames * 2);
        for f in 0..frames {
            samples.push(f as f32);
            samples.push(-(f as f32));
        }
        AudioBuffer::new(samples, 2, 8_000)
    }

    #[test]
    fn frames_and_duration_account_for_channels() {
        let buf = stereo_ramp(16_000);
        assert_eq!(buf.frames(), 16_000);
        assert!((buf.duration_secs() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn channel_slice_deinterleaves() {
        let buf = stereo_ramp(10);
        assert_eq!(buf.channel_slice(0, 2, 5), vec![2.0, 3.0, 4.0]);
        assert_eq!(buf.channel_slice(1, 2, 5), vec![-2.0, -3.0, -4.0]);
        assert!(buf.channel_slice(2, 0, 5).is_empty());
        assert!(buf.channel_slice(0, 5, 5).is_empty());
    }

    #[test]
    fn write_channel_touches_only_that_channel() {
        let mut buf = stereo_ramp(6);
        buf.write_channel(1, 4, &[9.0, 9.0, 9.0]);
        assert_eq!(buf.frames(), 6);
        assert_eq!(buf.channel_slice(1, 0, 6), vec![0.0, -1.0, -2.0, -3.0, 9.0, 9.0]);
        assert_eq!(buf.channel_slice(0, 0, 6), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn zero_frames_clears_all_channels_in_range() {
        let mut buf = stereo_ramp(8);
        buf.zero_frames(2, 4);
        assert_eq!(buf.channel_slice(0, 0, 8), vec![0.0, 1.0, 0.0, 0.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(buf.channel_slice(1, 2, 4), vec![0.0, 0.0]);
        // Out-of-range and inverted ranges are no-ops.
        let before = buf.clone();
        buf.zero_frames(6, 3);
        buf.zero_frames(100, 200);
        assert_eq!(buf, before);
    }

    #[test]
    fn secs_to_frame_rounds_and_floors_at_zero() {
        let buf = AudioBuffer::mono(vec![0.0; 10], 16_000);
        assert_eq!(buf.secs_to_frame(2.04), 32_640);
        assert_eq!(buf.secs_to_frame(2.4 - 0.4 * 0.9), 32_640);
        assert_eq!(buf.secs_to_frame(-1.0), 0);
        assert_eq!(buf.secs_to_frame(f64::NAN), 0);
    }
}

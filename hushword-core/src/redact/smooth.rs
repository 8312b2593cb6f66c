//! Boundary smoothing with a stationary spectral gate.
//!
//! ## Algorithm
//!
//! 1. STFT of the region (periodic Hann, hop = `n_fft / 4`, reflect-padded by
//!    `n_fft / 2` on each side).
//! 2. Per frequency bin, estimate a noise threshold from the region itself:
//!    `mean_db + n_std_thresh * std_db`.
//! 3. Mask = 1 where a bin exceeds its threshold, else 0.
//! 4. Smooth the mask with a triangular kernel over
//!    `freq_mask_smooth_hz` × `time_mask_smooth_ms`.
//! 5. `mask = mask * prop_decrease + (1 - prop_decrease)`; apply; inverse STFT
//!    with weighted overlap-add.
//!
//! Running this over a region that straddles a hard-zeroed cut and the
//! surrounding speech pulls both sides toward the noise floor, hiding the
//! edge of the cut.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::window::ContextWindow;
use crate::audio::AudioBuffer;
use crate::config::SpectralGateConfig;
use crate::error::{RedactError, Result};

/// Smallest region (and STFT size) the gate will process.
pub const MIN_FFT_SIZE: usize = 64;

/// dB floor below the loudest bin, as in librosa's `amplitude_to_db`.
const TOP_DB: f32 = 80.0;
const AMP_FLOOR: f32 = 1e-10;
const NORM_EPS: f32 = 1e-8;

pub struct SpectralGate {
    config: SpectralGateConfig,
    planner: FftPlanner<f32>,
}

impl SpectralGate {
    pub fn new(config: SpectralGateConfig) -> Self {
        Self {
            config,
            planner: FftPlanner::new(),
        }
    }

    /// Gate one channel of audio. Output has the same length as `samples`.
    ///
    /// # Errors
    /// `RedactError::Smoothing` when the region is shorter than `MIN_FFT_SIZE`.
    pub fn reduce(&mut self, samples: &[f32], sample_rate: u32) -> Result<Vec<f32>> {
        let len = samples.len();
        if len < MIN_FFT_SIZE {
            return Err(RedactError::Smoothing(format!(
                "region of {len} samples is shorter than {MIN_FFT_SIZE}"
            )));
        }

        let n_fft = self
            .config
            .n_fft
            .max(MIN_FFT_SIZE)
            .min(prev_power_of_two(len));
        let hop = n_fft / 4;
        let pad = n_fft / 2;
        let bins = n_fft / 2 + 1;

        let mut padded = reflect_pad(samples, pad);
        let tail = (hop - (padded.len() - n_fft) % hop) % hop;
        padded.resize(padded.len() + tail, 0.0);
        let n_frames = 1 + (padded.len() - n_fft) / hop;

        let window = build_hann_window(n_fft);
        let forward: Arc<dyn Fft<f32>> = self.planner.plan_fft_forward(n_fft);
        let inverse: Arc<dyn Fft<f32>> = self.planner.plan_fft_inverse(n_fft);

        // ── STFT ──────────────────────────────────────────────────────────
        let mut spectra: Vec<Vec<Complex<f32>>> = Vec::with_capacity(n_frames);
        for t in 0..n_frames {
            let base = t * hop;
            let mut frame: Vec<Complex<f32>> = (0..n_fft)
                .map(|i| Complex::new(padded[base + i] * window[i], 0.0))
                .collect();
            forward.process(&mut frame);
            spectra.push(frame);
        }

        // ── Magnitudes in dB ──────────────────────────────────────────────
        let mut db: Vec<Vec<f32>> = spectra
            .iter()
            .map(|frame| {
                frame[..bins]
                    .iter()
                    .map(|c| 20.0 * c.norm().max(AMP_FLOOR).log10())
                    .collect()
            })
            .collect();
        let max_db = db
            .iter()
            .flatten()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        for v in db.iter_mut().flatten() {
            *v = v.max(max_db - TOP_DB);
        }

        // ── Per-bin threshold ─────────────────────────────────────────────
        let frames_f = n_frames as f32;
        let thresholds: Vec<f32> = (0..bins)
            .map(|k| {
                let mean = db.iter().map(|row| row[k]).sum::<f32>() / frames_f;
                let var = db.iter().map(|row| (row[k] - mean).powi(2)).sum::<f32>() / frames_f;
                mean + self.config.n_std_thresh * var.sqrt()
            })
            .collect();

        // ── Mask ──────────────────────────────────────────────────────────
        let mut mask: Vec<Vec<f32>> = db
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&thresholds)
                    .map(|(v, th)| if v > th { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect();

        let hz_per_bin = sample_rate as f32 / n_fft as f32;
        let ms_per_frame = hop as f32 / sample_rate as f32 * 1000.0;
        let n_grad_freq = (self.config.freq_mask_smooth_hz / hz_per_bin).round() as usize;
        let n_grad_time = (self.config.time_mask_smooth_ms / ms_per_frame).round() as usize;
        smooth_mask(&mut mask, n_grad_freq, n_grad_time);

        let prop = self.config.prop_decrease;
        for v in mask.iter_mut().flatten() {
            *v = *v * prop + (1.0 - prop);
        }

        // ── Apply + inverse STFT (weighted overlap-add) ───────────────────
        let mut out = vec![0f32; padded.len()];
        let mut norm = vec![0f32; padded.len()];
        let scale = 1.0 / n_fft as f32;
        for (t, frame) in spectra.iter_mut().enumerate() {
            for k in 0..bins {
                let gain = mask[t][k];
                frame[k] *= gain;
                let mirror = n_fft - k;
                if k > 0 && mirror < n_fft && mirror != k {
                    frame[mirror] *= gain;
                }
            }
            inverse.process(frame);

            let base = t * hop;
            for i in 0..n_fft {
                out[base + i] += frame[i].re * scale * window[i];
                norm[base + i] += window[i] * window[i];
            }
        }

        Ok((pad..pad + len)
            .map(|i| {
                if norm[i] > NORM_EPS {
                    out[i] / norm[i]
                } else {
                    0.0
                }
            })
            .collect())
    }
}

/// Gate every channel of `buffer` over `context`, in place.
///
/// # Errors
/// `RedactError::Smoothing` if the region is too short; the buffer is left
/// unchanged in that case.
pub fn smooth_region(
    gate: &mut SpectralGate,
    buffer: &mut AudioBuffer,
    context: &ContextWindow,
) -> Result<()> {
    if context.len() < MIN_FFT_SIZE {
        return Err(RedactError::Smoothing(format!(
            "context window [{}, {}) holds {} frames",
            context.start_frame,
            context.end_frame,
            context.len()
        )));
    }

    for channel in 0..usize::from(buffer.channels) {
        let region = buffer.channel_slice(channel, context.start_frame, context.end_frame);
        let reduced = gate.reduce(&region, buffer.sample_rate)?;
        buffer.write_channel(channel, context.start_frame, &reduced);
    }
    Ok(())
}

fn prev_power_of_two(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    1 << (usize::BITS - 1 - n.leading_zeros())
}

fn build_hann_window(n: usize) -> Vec<f32> {
    use std::f32::consts::PI;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / n as f32).cos()))
        .collect()
}

/// Mirror `samples` around both ends. Requires `pad < samples.len()`.
fn reflect_pad(samples: &[f32], pad: usize) -> Vec<f32> {
    let n = samples.len();
    let mut out = Vec::with_capacity(n + 2 * pad);
    out.extend((1..=pad).rev().map(|i| samples[i.min(n - 1)]));
    out.extend_from_slice(samples);
    out.extend((1..=pad).map(|i| samples[n.saturating_sub(1 + i)]));
    out
}

/// Normalized triangle of width `2n + 1`.
fn triangle(n: usize) -> Vec<f32> {
    let raw: Vec<f32> = (0..=2 * n)
        .map(|j| 1.0 - (j as f32 - n as f32).abs() / (n as f32 + 1.0))
        .collect();
    let sum: f32 = raw.iter().sum();
    raw.into_iter().map(|v| v / sum).collect()
}

/// Separable "same"-size convolution of `mask[time][freq]`, zero-padded.
fn smooth_mask(mask: &mut [Vec<f32>], n_freq: usize, n_time: usize) {
    if n_freq > 0 {
        let kernel = triangle(n_freq);
        for row in mask.iter_mut() {
            *row = convolve_same(row, &kernel);
        }
    }
    if n_time > 0 && !mask.is_empty() {
        let kernel = triangle(n_time);
        let bins = mask[0].len();
        for k in 0..bins {
            let column: Vec<f32> = mask.iter().map(|row| row[k]).collect();
            let smoothed = convolve_same(&column, &kernel);
            for (row, v) in mask.iter_mut().zip(smoothed) {
                row[k] = v;
            }
        }
    }
}

fn convolve_same(signal: &[f32], kernel: &[f32]) -> Vec<f32> {
    let half = kernel.len() / 2;
    (0..signal.len())
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .filter_map(|(j, w)| {
                    (i + j)
                        .checked_sub(half)
                        .and_then(|idx| signal.get(idx))
                        .map(|s| s * w)
                })
                .sum()
        })
        .collect()
}

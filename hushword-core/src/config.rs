//! Redaction configuration (JSON file, all fields optional).
//!
//! Every component receives the values it needs from `RedactConfig`; there
//! are no process-wide defaults to mutate.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// How a matched word's mute window is silenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuteMode {
    /// Zero the window with a hard edge.
    #[default]
    HardZero,
    /// Linear fade-out into the window, zero it, linear fade-in after it.
    FadeEnvelope,
}

/// How batch jobs are admitted to the worker budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionPolicy {
    /// Fill a batch, run it, join every job before admitting the next batch.
    #[default]
    BatchBarrier,
    /// A finished job frees its slot immediately.
    SlidingWindow,
}

/// Parameters of the stationary spectral gate used for boundary smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralGateConfig {
    /// STFT size for regions long enough to hold it. Rounded down to a power of two.
    pub n_fft: usize,
    /// Standard deviations above the mean (dB) a bin must reach to count as signal.
    pub n_std_thresh: f32,
    /// Fraction of the gated energy removed, in [0, 1].
    pub prop_decrease: f32,
    /// Mask smoothing span along frequency (Hz).
    pub freq_mask_smooth_hz: f32,
    /// Mask smoothing span along time (ms).
    pub time_mask_smooth_ms: f32,
}

impl Default for SpectralGateConfig {
    fn default() -> Self {
        Self {
            n_fft: 1024,
            n_std_thresh: 1.5,
            prop_decrease: 1.0,
            freq_mask_smooth_hz: 500.0,
            time_mask_smooth_ms: 50.0,
        }
    }
}

/// Top-level configuration shared by every redaction component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedactConfig {
    /// Fraction of a matched word's span used for the inner mute bounds.
    pub mute_shrink_ratio: f64,
    /// Fade length for `MuteMode::FadeEnvelope` (seconds).
    pub fade_duration_seconds: f64,
    /// Padding added on each side of a word for the smoothing region (seconds).
    pub context_pad_seconds: f64,
    /// Maximum simultaneous batch jobs.
    pub max_concurrent_jobs: usize,
    pub admission_policy: AdmissionPolicy,
    pub mute_mode: MuteMode,
    /// Run the spectral gate over each context window after muting.
    pub smoothing_enabled: bool,
    pub spectral_gate: SpectralGateConfig,
    /// Reject segments whose WAV spec differs from the first one.
    pub validate_segment_formats: bool,
    /// Where the combined file is copied. `None` uses the user's Downloads folder.
    pub combined_output_dir: Option<PathBuf>,
}

impl Default for RedactConfig {
    fn default() -> Self {
        Self {
            mute_shrink_ratio: 0.9,
            fade_duration_seconds: 0.06,
            context_pad_seconds: 0.1,
            max_concurrent_jobs: 5,
            admission_policy: AdmissionPolicy::BatchBarrier,
            mute_mode: MuteMode::HardZero,
            smoothing_enabled: true,
            spectral_gate: SpectralGateConfig::default(),
            validate_segment_formats: true,
            combined_output_dir: None,
        }
    }
}

impl RedactConfig {
    /// Clamp every field to a usable range.
    pub fn normalize(&mut self) {
        let defaults = Self::default();
        if !self.mute_shrink_ratio.is_finite() {
            self.mute_shrink_ratio = defaults.mute_shrink_ratio;
        }
        self.mute_shrink_ratio = self.mute_shrink_ratio.clamp(0.0, 1.0);
        if !self.fade_duration_seconds.is_finite() {
            self.fade_duration_seconds = defaults.fade_duration_seconds;
        }
        self.fade_duration_seconds = self.fade_duration_seconds.clamp(0.0, 2.0);
        if !self.context_pad_seconds.is_finite() {
            self.context_pad_seconds = defaults.context_pad_seconds;
        }
        self.context_pad_seconds = self.context_pad_seconds.clamp(0.0, 5.0);
        self.max_concurrent_jobs = self.max_concurrent_jobs.clamp(1, 256);

        let gate = &mut self.spectral_gate;
        gate.n_fft = gate.n_fft.clamp(64, 8192);
        if !gate.n_fft.is_power_of_two() {
            gate.n_fft = gate.n_fft.next_power_of_two() / 2;
        }
        gate.n_std_thresh = gate.n_std_thresh.clamp(0.0, 10.0);
        gate.prop_decrease = gate.prop_decrease.clamp(0.0, 1.0);
        gate.freq_mask_smooth_hz = gate.freq_mask_smooth_hz.max(0.0);
        gate.time_mask_smooth_ms = gate.time_mask_smooth_ms.max(0.0);

        self.combined_output_dir = self
            .combined_output_dir
            .take()
            .filter(|p| !p.as_os_str().is_empty());
    }
}

/// Load a config file. A missing file yields defaults; a malformed file is an error.
pub fn load_config(path: &Path) -> Result<RedactConfig> {
    let mut config = match fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str::<RedactConfig>(&raw)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = ?path, "config file not found, using defaults");
            RedactConfig::default()
        }
        Err(e) => return Err(e.into()),
    };
    config.normalize();
    Ok(config)
}

/// The user's download directory, used as the combined-output destination.
pub fn default_download_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Downloads")
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("Downloads")
    }
}

//! Segment combiner: concatenates processed WAV files into one.
//!
//! The first segment's header (channels, bits per sample, sample rate,
//! sample format) is canonical. Every segment's samples are copied verbatim:
//! integers as integers, floats as floats, so nothing is re-quantized.
//!
//! With `validate_formats` off, segments are appended without checking their
//! headers. A mono + stereo pair then "succeeds" and produces a file whose
//! declared length and content are wrong.

use std::fs;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::{debug, info, warn};

use crate::config::{default_download_dir, RedactConfig};
use crate::error::{RedactError, Result};

const COMBINED_SUFFIX: &str = "combined_output.wav";

#[derive(Debug, Clone, PartialEq)]
pub struct CombinedOutput {
    /// Combined file, next to the first segment.
    pub path: PathBuf,
    /// Copy in the download directory, when one is configured.
    pub download_copy: Option<PathBuf>,
    pub spec: WavSpec,
    /// Declared frame count of the combined file.
    pub frames: u32,
}

impl CombinedOutput {
    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / self.spec.sample_rate as f64
    }
}

#[derive(Debug, Clone)]
pub struct SegmentCombiner {
    validate_formats: bool,
    download_dir: Option<PathBuf>,
}

impl SegmentCombiner {
    pub fn new(validate_formats: bool, download_dir: Option<PathBuf>) -> Self {
        Self {
            validate_formats,
            download_dir,
        }
    }

    /// Combiner that copies into `combined_output_dir`, or the user's Downloads.
    pub fn from_config(config: &RedactConfig) -> Self {
        let dir = config
            .combined_output_dir
            .clone()
            .unwrap_or_else(default_download_dir);
        Self::new(config.validate_segment_formats, Some(dir))
    }

    /// `<first segment file name>combined_output.wav` in the first segment's directory.
    pub fn combined_path(first: &Path) -> PathBuf {
        let mut name = first
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(COMBINED_SUFFIX);
        first.with_file_name(name)
    }

    /// Concatenate `segments` in order.
    ///
    /// # Errors
    /// - `NoSegments` for an empty list.
    /// - `FormatMismatch` when validation is on and a header differs.
    /// - `Decode` / `Encode` on unreadable input or write failure.
    pub fn combine(&self, segments: &[PathBuf]) -> Result<CombinedOutput> {
        let first = segments.first().ok_or(RedactError::NoSegments)?;
        let canonical = open(first)?.spec();

        // Check every header before creating the output.
        for path in &segments[1..] {
            let spec = open(path)?.spec();
            if spec == canonical {
                continue;
            }
            if self.validate_formats {
                return Err(RedactError::FormatMismatch {
                    path: path.clone(),
                    expected: describe(canonical),
                    found: describe(spec),
                });
            }
            warn!(
                path = %path.display(),
                expected = %describe(canonical),
                found = %describe(spec),
                "segment format differs; appending anyway, output will be corrupt"
            );
        }

        let output = Self::combined_path(first);
        let encode_err = |e: hound::Error| RedactError::Encode(format!("{}: {e}", output.display()));
        let mut writer = WavWriter::create(&output, canonical).map_err(encode_err)?;

        for path in segments {
            let mut reader = open(path)?;
            let decode_err = |e: hound::Error| RedactError::Decode(format!("{}: {e}", path.display()));
            match canonical.sample_format {
                SampleFormat::Float => {
                    for sample in reader.samples::<f32>() {
                        writer.write_sample(sample.map_err(decode_err)?).map_err(encode_err)?;
                    }
                }
                SampleFormat::Int => {
                    for sample in reader.samples::<i32>() {
                        writer.write_sample(sample.map_err(decode_err)?).map_err(encode_err)?;
                    }
                }
            }
        }

        let samples_written = writer.len();
        writer.finalize().map_err(encode_err)?;
        let frames = samples_written / u32::from(canonical.channels.max(1));

        let download_copy = match &self.download_dir {
            Some(dir) => Some(copy_into(&output, dir)?),
            None => None,
        };

        info!(
            output = %output.display(),
            segments = segments.len(),
            frames,
            download_copy = ?download_copy,
            "segments combined"
        );

        Ok(CombinedOutput {
            path: output,
            download_copy,
            spec: canonical,
            frames,
        })
    }
}

fn open(path: &Path) -> Result<WavReader<std::io::BufReader<fs::File>>> {
    WavReader::open(path).map_err(|e| RedactError::Decode(format!("{}: {e}", path.display())))
}

fn copy_into(file: &Path, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let name = file
        .file_name()
        .ok_or_else(|| RedactError::Other(anyhow::anyhow!("{} has no file name", file.display())))?;
    let dest = dir.join(name);
    if same_file(file, &dest)? {
        debug!(path = %file.display(), "combined output already in download dir");
        return Ok(file.to_path_buf());
    }
    fs::copy(file, &dest)?;
    Ok(dest)
}

/// `fs::copy` onto its own source truncates it, so compare resolved paths first.
fn same_file(a: &Path, b: &Path) -> Result<bool> {
    if !b.exists() {
        return Ok(false);
    }
    Ok(fs::canonicalize(a)? == fs::canonicalize(b)?)
}

fn describe(spec: WavSpec) -> String {
    format!(
        "{} ch / {}-bit {:?} / {} Hz",
        spec.channels, spec.bits_per_sample, spec.sample_format, spec.sample_rate
    )
}

//! WAV decode / encode via `hound`.
//!
//! Decoding has a fast path for the common mono 16-bit case and a generic path
//! for any channel count at 8/16/24/32-bit integer or 32-bit float. Encoding
//! always writes 16-bit PCM.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use super::AudioBuffer;
use crate::error::{RedactError, Result};

/// Decode a WAV file into an `AudioBuffer`.
///
/// # Errors
/// Returns `RedactError::Decode` if the file is unreadable, has zero channels,
/// or uses a sample layout other than 8/16/24/32-bit int or 32-bit float.
pub fn read_wav(path: &Path) -> Result<AudioBuffer> {
    let mut reader = WavReader::open(path)
        .map_err(|e| RedactError::Decode(format!("{}: {e}", path.display())))?;
    let spec = reader.spec();

    if spec.channels == 0 {
        return Err(RedactError::Decode(format!(
            "{}: header declares zero channels",
            path.display()
        )));
    }

    let samples = if spec.channels == 1
        && spec.sample_format == SampleFormat::Int
        && spec.bits_per_sample == 16
    {
        read_mono_i16(&mut reader, path)?
    } else {
        read_generic(&mut reader, spec, path)?
    };

    let mut buffer = AudioBuffer::new(samples, spec.channels, spec.sample_rate);
    // Drop a trailing partial frame so interleaving stays consistent.
    let whole = buffer.frames() * usize::from(spec.channels);
    buffer.samples.truncate(whole);

    debug!(
        path = %path.display(),
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        frames = buffer.frames(),
        "decoded wav"
    );
    Ok(buffer)
}

fn read_mono_i16<R: std::io::Read>(reader: &mut WavReader<R>, path: &Path) -> Result<Vec<f32>> {
    reader
        .samples::<i16>()
        .map(|s| {
            s.map(|v| v as f32 / i16::MAX as f32)
                .map_err(|e| RedactError::Decode(format!("{}: {e}", path.display())))
        })
        .collect()
}

fn read_generic<R: std::io::Read>(
    reader: &mut WavReader<R>,
    spec: WavSpec,
    path: &Path,
) -> Result<Vec<f32>> {
    let decode_err = |e: hound::Error| RedactError::Decode(format!("{}: {e}", path.display()));

    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .map(|s| s.map_err(decode_err))
            .collect(),
        (SampleFormat::Int, bits @ (8 | 16)) => {
            let max = ((1_i32 << (bits - 1)) - 1) as f32;
            reader
                .samples::<i16>()
                .map(|s| s.map(|v| v as f32 / max).map_err(decode_err))
                .collect()
        }
        (SampleFormat::Int, bits @ (24 | 32)) => {
            let max = ((1_i64 << (bits - 1)) - 1) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max).map_err(decode_err))
                .collect()
        }
        (format, bits) => Err(RedactError::Decode(format!(
            "{}: unsupported sample layout {format:?} {bits}-bit",
            path.display()
        ))),
    }
}

/// Encode `buffer` as a 16-bit PCM WAV at `path`, creating parent directories.
///
/// # Errors
/// Returns `RedactError::Encode` on any write failure.
pub fn write_wav(buffer: &AudioBuffer, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let spec = WavSpec {
        channels: buffer.channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let encode_err = |e: hound::Error| RedactError::Encode(format!("{}: {e}", path.display()));

    let mut writer = WavWriter::create(path, spec).map_err(encode_err)?;
    for &sample in &buffer.samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        writer.write_sample(value).map_err(encode_err)?;
    }
    writer.finalize().map_err(encode_err)?;

    debug!(path = %path.display(), frames = buffer.frames(), "encoded wav");
    Ok(())
}

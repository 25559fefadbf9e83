// src/wav.rs
//
// WAV container boundary. The core only ever sees per-channel sample
// sequences plus sample rate and bit depth; all framing and metadata live
// here.

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;

use crate::core::reconstruct;

/// Decoded PCM audio, deinterleaved per channel.
pub struct AudioData {
    pub channels: Vec<Vec<i32>>,
    pub sample_rate: u32,
    pub bits_per_sample: u32,
    pub duration_secs: f64,
}

impl AudioData {
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn samples_per_channel(&self) -> usize {
        self.channels.first().map(Vec::len).unwrap_or(0)
    }
}

/// Read an integer-PCM WAV file into per-channel streams.
pub fn read_wav(path: &Path) -> Result<AudioData> {
    let mut reader = WavReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let spec = reader.spec();

    if spec.sample_format != SampleFormat::Int {
        bail!("{}: float WAV is not supported, only integer PCM", path.display());
    }
    if !(8..=32).contains(&spec.bits_per_sample) {
        bail!("{}: unsupported bit depth {}", path.display(), spec.bits_per_sample);
    }

    let num_channels = spec.channels as usize;
    let mut channels: Vec<Vec<i32>> = vec![Vec::new(); num_channels];

    for (i, sample) in reader.samples::<i32>().enumerate() {
        let sample = sample.with_context(|| format!("Decode error in {}", path.display()))?;
        channels[i % num_channels].push(sample);
    }

    // Drop any ragged tail so all channels are equal length.
    let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
    for channel in &mut channels {
        channel.truncate(frames);
    }

    let duration_secs = frames as f64 / spec.sample_rate as f64;

    Ok(AudioData {
        channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample as u32,
        duration_secs,
    })
}

/// Write per-channel streams as an interleaved integer-PCM WAV file.
pub fn write_wav(
    path: &Path,
    channels: &[Vec<i32>],
    sample_rate: u32,
    bits_per_sample: u32,
) -> Result<()> {
    if channels.is_empty() {
        bail!("no channels to write");
    }
    let frames = channels[0].len();
    if channels.iter().any(|c| c.len() != frames) {
        bail!("channel lengths differ");
    }

    let spec = WavSpec {
        channels: channels.len() as u16,
        sample_rate,
        bits_per_sample: bits_per_sample as u16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    for frame in 0..frames {
        for channel in channels {
            if bits_per_sample <= 16 {
                writer.write_sample(channel[frame] as i16)?;
            } else {
                writer.write_sample(channel[frame])?;
            }
        }
    }

    writer
        .finalize()
        .with_context(|| format!("Failed to finalize {}", path.display()))?;
    Ok(())
}

/// Recombine a reduced WAV with its correction WAV into the original.
///
/// The two inputs must agree on sample rate, channel count, and length; the
/// correction file is written at 32-bit width regardless of source depth, so
/// only rate and geometry are checked.
pub fn merge_wavs(reduced_path: &Path, correction_path: &Path, output_path: &Path) -> Result<()> {
    let reduced = read_wav(reduced_path)?;
    let correction = read_wav(correction_path)?;

    if reduced.sample_rate != correction.sample_rate {
        bail!(
            "sample rate mismatch: {} vs {}",
            reduced.sample_rate,
            correction.sample_rate
        );
    }
    if reduced.num_channels() != correction.num_channels() {
        bail!(
            "channel count mismatch: {} vs {}",
            reduced.num_channels(),
            correction.num_channels()
        );
    }
    if reduced.samples_per_channel() != correction.samples_per_channel() {
        bail!(
            "length mismatch: {} vs {} samples",
            reduced.samples_per_channel(),
            correction.samples_per_channel()
        );
    }

    let restored: Vec<Vec<i32>> = reduced
        .channels
        .iter()
        .zip(&correction.channels)
        .map(|(r, c)| reconstruct(r, c))
        .collect();

    write_wav(
        output_path,
        &restored,
        reduced.sample_rate,
        reduced.bits_per_sample,
    )
}

/// Correction streams are written at 32-bit width: residuals can exceed the
/// source width at the extremes of the sample range.
pub const CORRECTION_BITS: u32 = 32;

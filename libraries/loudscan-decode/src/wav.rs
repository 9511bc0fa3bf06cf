//! WAV input family built on hound
//!
//! The reference adapter: total frames come straight from the header, reads
//! stream one second at a time through the reusable buffer, and integer
//! samples are scaled symmetrically (divide by 2^(N-1)) into [-1.0, 1.0).
//! WAV files carry no channel map that hound exposes, so `map_channels`
//! reports `NoChannelMap` and the engine defaults stay in effect.

use crate::adapter::DecoderAdapter;
use crate::error::{DecodeError, Result};
use crate::registry::DecoderFamily;
use hound::{SampleFormat, WavReader};
use loudscan_engine::LoudnessState;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// The hound-backed WAV family.
pub struct WavFamily;

impl DecoderFamily for WavFamily {
    fn name(&self) -> &'static str {
        "wav"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["wav", "wave"]
    }

    fn open(&self, path: &Path) -> Result<Box<dyn DecoderAdapter>> {
        Ok(Box::new(WavAdapter::open(path)?))
    }
}

/// One open WAV file.
pub struct WavAdapter {
    reader: Option<WavReader<BufReader<File>>>,
    path: PathBuf,
    channels: u32,
    sample_rate: u32,
    total_frames: u64,
    bits_per_sample: u16,
    sample_format: SampleFormat,
    buffer: Vec<f32>,
}

impl WavAdapter {
    fn open(path: &Path) -> Result<Self> {
        let open_failed = |reason: String| DecodeError::OpenFailed {
            path: path.to_path_buf(),
            reason,
        };

        let reader = WavReader::open(path).map_err(|e| open_failed(e.to_string()))?;
        let spec = reader.spec();

        if spec.channels == 0 {
            return Err(open_failed("header declares zero channels".into()));
        }
        if spec.sample_rate == 0 {
            return Err(open_failed("header declares a zero sample rate".into()));
        }
        match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, 32) | (SampleFormat::Int, 16 | 24 | 32) => {}
            (format, bits) => {
                return Err(open_failed(format!(
                    "unsupported sample format: {bits}-bit {format:?}"
                )));
            }
        }

        let total_frames = u64::from(reader.duration());

        Ok(Self {
            reader: Some(reader),
            path: path.to_path_buf(),
            channels: u32::from(spec.channels),
            sample_rate: spec.sample_rate,
            total_frames,
            bits_per_sample: spec.bits_per_sample,
            sample_format: spec.sample_format,
            buffer: Vec::new(),
        })
    }
}

impl std::fmt::Debug for WavAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WavAdapter")
            .field("path", &self.path)
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("total_frames", &self.total_frames)
            .field("bits_per_sample", &self.bits_per_sample)
            .field("sample_format", &self.sample_format)
            .finish()
    }
}

impl DecoderAdapter for WavAdapter {
    fn channels(&self) -> u32 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_frames(&self) -> u64 {
        self.total_frames
    }

    fn allocate_buffer(&mut self) -> Result<()> {
        let len = self.sample_rate as usize * self.channels as usize;
        self.buffer.clear();
        self.buffer
            .try_reserve_exact(len)
            .map_err(|_| DecodeError::AllocFailed)?;
        self.buffer.resize(len, 0.0);
        Ok(())
    }

    fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    fn read_frames(&mut self) -> Result<usize> {
        let want = self.sample_rate as usize * self.channels as usize;
        if self.buffer.len() < want {
            return Err(DecodeError::AllocFailed);
        }
        let channels = self.channels as usize;
        let path = self.path.clone();

        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| DecodeError::CloseFailed("file already closed".into()))?;

        let mut written = 0_usize;
        match (self.sample_format, self.bits_per_sample) {
            (SampleFormat::Float, _) => {
                for sample in reader.samples::<f32>().take(want) {
                    match sample {
                        Ok(sample) => {
                            self.buffer[written] = sample;
                            written += 1;
                        }
                        Err(err) => {
                            // Corrupt trailing data ends the stream early; the
                            // scan core flags the short read.
                            tracing::warn!(path = %path.display(), error = %err, "sample read failed, ending stream early");
                            break;
                        }
                    }
                }
            }
            (SampleFormat::Int, bits) => {
                let scale = (1_i64 << (bits - 1)) as f32;
                for sample in reader.samples::<i32>().take(want) {
                    match sample {
                        Ok(sample) => {
                            self.buffer[written] = sample as f32 / scale;
                            written += 1;
                        }
                        Err(err) => {
                            tracing::warn!(path = %path.display(), error = %err, "sample read failed, ending stream early");
                            break;
                        }
                    }
                }
            }
        }

        // A truncated final frame is dropped rather than fed half-filled.
        Ok(written / channels)
    }

    fn map_channels(&self, _state: &mut LoudnessState) -> Result<()> {
        Err(DecodeError::NoChannelMap)
    }

    fn close(&mut self) -> Result<()> {
        if self.reader.take().is_none() {
            return Err(DecodeError::CloseFailed("file already closed".into()));
        }
        self.buffer = Vec::new();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_file_fails() {
        let err = WavAdapter::open(Path::new("/nonexistent/input.wav")).unwrap_err();
        assert!(matches!(err, DecodeError::OpenFailed { .. }));
    }

    #[test]
    fn read_before_allocate_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..800 {
            writer.write_sample(1000_i16).unwrap();
        }
        writer.finalize().unwrap();

        let mut adapter = WavAdapter::open(&path).unwrap();
        assert!(matches!(adapter.read_frames(), Err(DecodeError::AllocFailed)));
    }
}

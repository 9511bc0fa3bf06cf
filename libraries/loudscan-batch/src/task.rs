//! Per-file scan task
//!
//! Discovery first: open the file, size a fresh engine state to its layout,
//! apply the channel map. Then streaming measurement: one-second reads fed
//! to the engine, the per-file and shared progress counters updated after
//! every read, until the decoder reports end of stream. All state here is
//! exclusively owned by this task; the shared progress counter is the only
//! cross-task touch point.

use crate::error::{Result, ScanError};
use crate::options::ScanOptions;
use crate::progress::ProgressState;
use crate::record::{FileRecord, Measurement};
use loudscan_decode::{DecodeError, DecoderRegistry};
use loudscan_engine::{EngineError, LoudnessState};
use std::path::Path;

/// Scan one file to completion. Failures land on the record; they never
/// propagate to sibling tasks.
pub(crate) fn scan_file(
    registry: &DecoderRegistry,
    options: ScanOptions,
    progress: &ProgressState,
    path: &Path,
    total_frames: u64,
) -> FileRecord {
    let mut record = FileRecord::pending(path.to_path_buf(), total_frames);
    if let Err(err) = run(registry, options, progress, &mut record) {
        tracing::debug!(path = %record.path.display(), error = %err, "scan failed");
        record.error = Some(err);
    }
    record
}

fn run(
    registry: &DecoderRegistry,
    options: ScanOptions,
    progress: &ProgressState,
    record: &mut FileRecord,
) -> Result<()> {
    // Discovery
    let mut decoder = registry.resolve(&record.path)?;
    let channels = decoder.channels();
    let sample_rate = decoder.sample_rate();
    if channels == 0 || sample_rate == 0 {
        let _ = decoder.close();
        return Err(ScanError::OpenFailed(format!(
            "{}: stream reports no channels or no sample rate",
            record.path.display()
        )));
    }

    let mut state = LoudnessState::new(channels, sample_rate, options.measures())?;
    match decoder.map_channels(&mut state) {
        Ok(()) => {}
        Err(DecodeError::NoChannelMap) => {
            tracing::debug!(path = %record.path.display(), "no channel map, engine defaults apply");
        }
        Err(err) => {
            // Best-effort: a broken map falls back to engine defaults.
            tracing::warn!(path = %record.path.display(), error = %err, "channel map rejected, engine defaults apply");
        }
    }

    decoder.allocate_buffer().map_err(ScanError::from)?;

    // Streaming measurement
    let one_second = sample_rate as usize;
    let mut frames_read_all: u64 = 0;
    loop {
        let frames = decoder.read_frames().map_err(ScanError::from)?;
        if frames == 0 {
            break;
        }

        state.add_frames(&decoder.buffer()[..frames * channels as usize])?;
        frames_read_all += frames as u64;

        // The per-file counter (and with it the shared denominator) is capped
        // at the declared total; the mismatch is flagged below either way.
        let credited = u64::min(frames as u64, record.total_frames - record.elapsed_frames);
        record.elapsed_frames += credited;
        if credited > 0 {
            progress.add(credited);
        }

        if frames < one_second {
            break;
        }
    }

    if frames_read_all != record.total_frames {
        record.short_read = true;
        tracing::warn!(
            path = %record.path.display(),
            declared = record.total_frames,
            read = frames_read_all,
            "decoded frame count differs from the declared total"
        );
    }

    if let Err(err) = decoder.close() {
        // The measurement is already captured; a close failure cannot
        // invalidate it.
        tracing::warn!(path = %record.path.display(), error = %err, "failed to close input");
    }

    // Queries per the batch options
    let measurement = Measurement {
        integrated_lufs: optional(state.integrated_loudness())?,
        loudness_range_lu: if options.loudness_range {
            optional(state.loudness_range())?
        } else {
            None
        },
        sample_peak: if options.peak.wants_sample() {
            optional(state.sample_peak())?
        } else {
            None
        },
        true_peak: if options.peak.wants_true() {
            optional(state.true_peak())?
        } else {
            None
        },
    };

    record.measurement = Some(measurement);
    record.state = Some(state);
    record.scanned = true;
    Ok(())
}

/// `NotEnoughData` is an answer, not a failure: the stream was too short or
/// too quiet to gate, and the record carries no value for that measurement.
fn optional(result: loudscan_engine::Result<f64>) -> Result<Option<f64>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(EngineError::NotEnoughData) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

//! Per-file scan records

use crate::error::ScanError;
use loudscan_engine::{linear_to_dbfs, LoudnessState};
use serde::Serialize;
use std::path::PathBuf;

/// A finished set of measurements for one file.
///
/// Every value is optional: a measurement is absent when it was not enabled
/// by the batch options, or when the engine saw too little audio to gate
/// (empty and silent streams report no loudness rather than a number).
/// Peaks are linear; use the dBFS helpers for display.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Measurement {
    /// Integrated loudness in LUFS
    pub integrated_lufs: Option<f64>,
    /// Loudness range in LU
    pub loudness_range_lu: Option<f64>,
    /// Maximum sample peak across channels, linear
    pub sample_peak: Option<f64>,
    /// Maximum true peak across channels, linear
    pub true_peak: Option<f64>,
}

impl Measurement {
    /// Sample peak in dBFS.
    pub fn sample_peak_dbfs(&self) -> Option<f64> {
        self.sample_peak.map(linear_to_dbfs)
    }

    /// True peak in dBTP.
    pub fn true_peak_dbfs(&self) -> Option<f64> {
        self.true_peak.map(linear_to_dbfs)
    }
}

/// One entry per input path.
///
/// The record is exclusively owned by the task scanning its file until the
/// pool drains; afterwards the collection is immutable. `scanned` makes a
/// single false-to-true transition when the measurement is recorded, and
/// `elapsed_frames` never exceeds `total_frames`.
#[derive(Debug)]
pub struct FileRecord {
    /// Input path
    pub path: PathBuf,
    /// Frame count declared by the container during discovery
    pub total_frames: u64,
    /// Frames actually streamed through the engine, capped at the declared
    /// total
    pub elapsed_frames: u64,
    /// Whether the scan completed and the measurement below is valid
    pub scanned: bool,
    /// The decoded frame count disagreed with the declared total; the
    /// measurement still stands
    pub short_read: bool,
    /// Measurements, written once at task completion
    pub measurement: Option<Measurement>,
    /// Why the file was excluded, when it was
    pub error: Option<ScanError>,
    /// Engine state retained for batch-level combination
    pub(crate) state: Option<LoudnessState>,
}

impl FileRecord {
    pub(crate) fn pending(path: PathBuf, total_frames: u64) -> Self {
        Self {
            path,
            total_frames,
            elapsed_frames: 0,
            scanned: false,
            short_read: false,
            measurement: None,
            error: None,
            state: None,
        }
    }

    pub(crate) fn failed(path: PathBuf, error: ScanError) -> Self {
        Self {
            error: Some(error),
            ..Self::pending(path, 0)
        }
    }
}

//! Batch-level combination of per-file results
//!
//! Runs only after the worker pool has drained. Loudness and range combine
//! at the engine's gating-block level, never by averaging the per-file
//! scalar values; peaks are a plain maximum. Files that failed are absent
//! from the combination, not counted as silence.

use crate::options::ScanOptions;
use crate::record::FileRecord;
use loudscan_engine::{linear_to_dbfs, EngineError, LoudnessState};
use serde::Serialize;
use std::path::PathBuf;

/// Combined statistics over the successfully scanned files of one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Files that produced a measurement
    pub files_scanned: usize,
    /// Integrated loudness over the whole batch in LUFS
    pub integrated_lufs: Option<f64>,
    /// Loudness range over the whole batch in LU
    pub loudness_range_lu: Option<f64>,
    /// Maximum sample peak across files, linear
    pub sample_peak: Option<f64>,
    /// Maximum true peak across files, linear
    pub true_peak: Option<f64>,
    /// Excluded files with their failure, in input order
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    /// Batch sample peak in dBFS.
    pub fn sample_peak_dbfs(&self) -> Option<f64> {
        self.sample_peak.map(linear_to_dbfs)
    }

    /// Batch true peak in dBTP.
    pub fn true_peak_dbfs(&self) -> Option<f64> {
        self.true_peak.map(linear_to_dbfs)
    }
}

pub(crate) fn summarize(files: &[FileRecord], options: ScanOptions) -> BatchSummary {
    let failures = files
        .iter()
        .filter_map(|record| {
            record
                .error
                .as_ref()
                .map(|err| (record.path.clone(), err.to_string()))
        })
        .collect();

    let states: Vec<&LoudnessState> = files
        .iter()
        .filter(|record| record.scanned)
        .filter_map(|record| record.state.as_ref())
        .collect();
    let files_scanned = states.len();

    let integrated_lufs = combined(&states, LoudnessState::combined_loudness);
    let loudness_range_lu = if options.loudness_range {
        combined(&states, LoudnessState::combined_range)
    } else {
        None
    };

    let sample_peak = max_peak(files, |m| m.sample_peak);
    let true_peak = max_peak(files, |m| m.true_peak);

    BatchSummary {
        files_scanned,
        integrated_lufs,
        loudness_range_lu,
        sample_peak,
        true_peak,
        failures,
    }
}

fn combined(
    states: &[&LoudnessState],
    combine: fn(&[&LoudnessState]) -> loudscan_engine::Result<f64>,
) -> Option<f64> {
    if states.is_empty() {
        return None;
    }
    match combine(states) {
        Ok(value) => Some(value),
        Err(EngineError::NotEnoughData) => None,
        Err(err) => {
            tracing::warn!(error = %err, "combining engine states failed");
            None
        }
    }
}

fn max_peak(
    files: &[FileRecord],
    peak: fn(&crate::record::Measurement) -> Option<f64>,
) -> Option<f64> {
    files
        .iter()
        .filter(|record| record.scanned)
        .filter_map(|record| record.measurement.as_ref().and_then(peak))
        .reduce(f64::max)
}

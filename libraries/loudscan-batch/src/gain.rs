//! ReplayGain 2.0 style gain derivation
//!
//! ReplayGain 2.0 is based on EBU R128 loudness and uses -18 LUFS as the
//! reference level. Gains here are derived from finished measurements only;
//! nothing is written back to any file.

use crate::aggregate::BatchSummary;
use crate::record::Measurement;
use loudscan_engine::linear_to_dbfs;
use serde::Serialize;

/// ReplayGain 2.0 reference loudness level
pub const REPLAYGAIN_REFERENCE_LUFS: f64 = -18.0;

/// A gain that would bring a program to the reference level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GainSuggestion {
    /// Gain to apply in dB (negative for loud programs)
    pub gain_db: f64,
    /// Peak of the program, linear; true peak when measured, sample peak
    /// otherwise
    pub peak: Option<f64>,
    /// Reference level the gain targets
    pub reference_lufs: f64,
}

impl GainSuggestion {
    /// Whether applying this gain would push the peak past full scale.
    /// Unknown peaks are treated as safe.
    pub fn would_clip(&self) -> bool {
        match self.peak {
            Some(peak) => self.gain_db + linear_to_dbfs(peak) > 0.0,
            None => false,
        }
    }

    /// The gain limited so the peak stays at or below full scale.
    pub fn safe_gain_db(&self) -> f64 {
        match self.peak {
            Some(peak) => self.gain_db.min(-linear_to_dbfs(peak)),
            None => self.gain_db,
        }
    }
}

/// Track gain for one measured file. `None` when the file produced no
/// integrated loudness.
pub fn track_gain(measurement: &Measurement) -> Option<GainSuggestion> {
    let integrated = measurement.integrated_lufs?;
    Some(GainSuggestion {
        gain_db: REPLAYGAIN_REFERENCE_LUFS - integrated,
        peak: measurement.true_peak.or(measurement.sample_peak),
        reference_lufs: REPLAYGAIN_REFERENCE_LUFS,
    })
}

/// Album gain for a finished batch. `None` when the batch produced no
/// combined loudness.
pub fn album_gain(summary: &BatchSummary) -> Option<GainSuggestion> {
    let integrated = summary.integrated_lufs?;
    Some(GainSuggestion {
        gain_db: REPLAYGAIN_REFERENCE_LUFS - integrated,
        peak: summary.true_peak.or(summary.sample_peak),
        reference_lufs: REPLAYGAIN_REFERENCE_LUFS,
    })
}

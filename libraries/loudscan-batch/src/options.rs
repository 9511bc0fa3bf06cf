//! Batch scan configuration

use loudscan_engine::Measures;
use serde::{Deserialize, Serialize};

/// Which peak statistic to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakMode {
    /// No peak measurement
    None,
    /// Maximum absolute sample value at the native rate
    #[default]
    Sample,
    /// Inter-sample peak after oversampling
    True,
    /// Both sample and true peak
    All,
}

impl PeakMode {
    pub(crate) fn wants_sample(self) -> bool {
        matches!(self, Self::Sample | Self::All)
    }

    pub(crate) fn wants_true(self) -> bool {
        matches!(self, Self::True | Self::All)
    }
}

/// Immutable per-batch configuration, shared read-only by every scan task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Also measure loudness range (more expensive)
    pub loudness_range: bool,
    /// Peak statistic to report
    pub peak: PeakMode,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            loudness_range: false,
            peak: PeakMode::Sample,
        }
    }
}

impl ScanOptions {
    pub(crate) fn measures(self) -> Measures {
        Measures {
            loudness_range: self.loudness_range,
            sample_peak: self.peak.wants_sample(),
            true_peak: self.peak.wants_true(),
        }
    }
}

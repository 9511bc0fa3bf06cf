//! Per-stream EBU R128 engine state
//!
//! `LoudnessState` owns one `ebur128::EbuR128` instance. The scan pipeline
//! creates one per file, feeds it interleaved f32 blocks, and queries the
//! results once the stream is exhausted. The instance is kept alive after the
//! scan so batches can be combined at the gating-block level.

use crate::error::{EngineError, Result};
use ebur128::{Channel, EbuR128, Mode};
use std::fmt;

/// Optional measurements to enable when creating a state.
///
/// Integrated loudness is always measured; everything else costs extra work
/// in the engine and is opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Measures {
    /// Loudness range (LRA)
    pub loudness_range: bool,
    /// Per-channel sample peak
    pub sample_peak: bool,
    /// Per-channel true peak (4x oversampling below 96 kHz)
    pub true_peak: bool,
}

impl Measures {
    /// Enable every optional measurement.
    pub fn all() -> Self {
        Self {
            loudness_range: true,
            sample_peak: true,
            true_peak: true,
        }
    }

    fn mode(self) -> Mode {
        let mut mode = Mode::I;
        if self.loudness_range {
            mode |= Mode::LRA;
        }
        if self.sample_peak {
            mode |= Mode::SAMPLE_PEAK;
        }
        if self.true_peak {
            mode |= Mode::TRUE_PEAK;
        }
        mode
    }
}

/// Semantic assignment of a physical channel, deciding how it is weighted in
/// the loudness sum. `Unused` channels stay in the interleave but contribute
/// nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRole {
    /// Front left
    Left,
    /// Front right
    Right,
    /// Front center
    Center,
    /// Left surround
    LeftSurround,
    /// Right surround
    RightSurround,
    /// Single channel carrying a dual-mono program
    DualMono,
    /// Present in the stream but excluded from the loudness sum
    Unused,
}

impl ChannelRole {
    fn to_engine(self) -> Channel {
        match self {
            ChannelRole::Left => Channel::Left,
            ChannelRole::Right => Channel::Right,
            ChannelRole::Center => Channel::Center,
            ChannelRole::LeftSurround => Channel::LeftSurround,
            ChannelRole::RightSurround => Channel::RightSurround,
            ChannelRole::DualMono => Channel::DualMono,
            ChannelRole::Unused => Channel::Unused,
        }
    }
}

/// Convert a linear peak value to dBFS.
pub fn linear_to_dbfs(value: f64) -> f64 {
    if value > 0.0 {
        20.0 * value.log10()
    } else {
        f64::NEG_INFINITY
    }
}

/// One engine instance, exclusively owned by the task scanning its stream.
pub struct LoudnessState {
    inner: EbuR128,
    channels: u32,
    sample_rate: u32,
    measures: Measures,
    frames_fed: u64,
}

impl LoudnessState {
    /// Create a state sized to a stream.
    ///
    /// # Errors
    /// Returns an error for a zero or out-of-range sample rate or channel
    /// count, or if the engine rejects the configuration.
    pub fn new(channels: u32, sample_rate: u32, measures: Measures) -> Result<Self> {
        if !(8_000..=384_000).contains(&sample_rate) {
            return Err(EngineError::InvalidSampleRate(sample_rate));
        }
        if !(1..=32).contains(&channels) {
            return Err(EngineError::InvalidChannelCount(channels));
        }

        let inner = EbuR128::new(channels, sample_rate, measures.mode())?;

        Ok(Self {
            inner,
            channels,
            sample_rate,
            measures,
            frames_fed: 0,
        })
    }

    /// Channel count the state was created with.
    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Sample rate the state was created with.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Measurements enabled at creation.
    pub fn measures(&self) -> Measures {
        self.measures
    }

    /// Frames fed so far.
    pub fn frames_fed(&self) -> u64 {
        self.frames_fed
    }

    /// Assign a role to one physical channel. Defaults (set by the engine at
    /// creation) remain in effect for channels never assigned here.
    pub fn set_channel(&mut self, index: u32, role: ChannelRole) -> Result<()> {
        if index >= self.channels {
            return Err(EngineError::ChannelIndexOutOfRange {
                index,
                channels: self.channels,
            });
        }
        self.inner.set_channel(index, role.to_engine())?;
        Ok(())
    }

    /// Feed one interleaved block.
    ///
    /// The block length must be a multiple of the channel count; an empty
    /// block is a no-op.
    pub fn add_frames(&mut self, interleaved: &[f32]) -> Result<()> {
        if interleaved.is_empty() {
            return Ok(());
        }
        if interleaved.len() % self.channels as usize != 0 {
            return Err(EngineError::UnalignedBlock(interleaved.len(), self.channels));
        }

        self.inner.add_frames_f32(interleaved)?;
        self.frames_fed += (interleaved.len() / self.channels as usize) as u64;
        Ok(())
    }

    /// Integrated loudness in LUFS.
    ///
    /// # Errors
    /// `NotEnoughData` when the gate never opened (empty or silent streams
    /// report no loudness rather than a numeric value).
    pub fn integrated_loudness(&self) -> Result<f64> {
        finite_or_not_enough(self.inner.loudness_global()?)
    }

    /// Loudness range in LU.
    pub fn loudness_range(&self) -> Result<f64> {
        if !self.measures.loudness_range {
            return Err(EngineError::NotEnabled("loudness range"));
        }
        if self.frames_fed == 0 {
            return Err(EngineError::NotEnoughData);
        }
        finite_or_not_enough(self.inner.loudness_range()?)
    }

    /// Maximum sample peak across all channels, linear.
    pub fn sample_peak(&self) -> Result<f64> {
        if !self.measures.sample_peak {
            return Err(EngineError::NotEnabled("sample peak"));
        }
        if self.frames_fed == 0 {
            return Err(EngineError::NotEnoughData);
        }

        let mut max = 0.0_f64;
        for ch in 0..self.channels {
            let peak = self.inner.sample_peak(ch)?;
            if peak > max {
                max = peak;
            }
        }
        Ok(max)
    }

    /// Maximum true peak across all channels, linear.
    pub fn true_peak(&self) -> Result<f64> {
        if !self.measures.true_peak {
            return Err(EngineError::NotEnabled("true peak"));
        }
        if self.frames_fed == 0 {
            return Err(EngineError::NotEnoughData);
        }

        let mut max = 0.0_f64;
        for ch in 0..self.channels {
            let peak = self.inner.true_peak(ch)?;
            if peak > max {
                max = peak;
            }
        }
        Ok(max)
    }

    /// Integrated loudness over several states at once, combining their
    /// gating blocks. Order-independent; not an average of the per-state
    /// scalar values.
    pub fn combined_loudness(states: &[&LoudnessState]) -> Result<f64> {
        if states.is_empty() {
            return Err(EngineError::NotEnoughData);
        }
        tracing::debug!(states = states.len(), "combining loudness states");

        let inners: Vec<&EbuR128> = states.iter().map(|s| &s.inner).collect();
        finite_or_not_enough(EbuR128::loudness_global_multiple(inners.iter().copied())?)
    }

    /// Loudness range over several states at once. Every state must have been
    /// created with `loudness_range` enabled.
    pub fn combined_range(states: &[&LoudnessState]) -> Result<f64> {
        if states.is_empty() {
            return Err(EngineError::NotEnoughData);
        }
        if states.iter().any(|s| !s.measures.loudness_range) {
            return Err(EngineError::NotEnabled("loudness range"));
        }
        if states.iter().all(|s| s.frames_fed == 0) {
            return Err(EngineError::NotEnoughData);
        }

        let inners: Vec<&EbuR128> = states.iter().map(|s| &s.inner).collect();
        finite_or_not_enough(EbuR128::loudness_range_multiple(inners.iter().copied())?)
    }
}

impl fmt::Debug for LoudnessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoudnessState")
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("measures", &self.measures)
            .field("frames_fed", &self.frames_fed)
            .finish_non_exhaustive()
    }
}

fn finite_or_not_enough(value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EngineError::NotEnoughData)
    }
}

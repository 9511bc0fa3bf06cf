//! Error types for the loudness engine binding

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while driving the loudness engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid sample rate
    #[error("Invalid sample rate: {0} Hz (must be between 8000 and 384000)")]
    InvalidSampleRate(u32),

    /// Invalid channel count
    #[error("Invalid channel count: {0} (must be 1-32)")]
    InvalidChannelCount(u32),

    /// Channel index past the end of the stream's layout
    #[error("Channel index {index} out of range for {channels} channels")]
    ChannelIndexOutOfRange {
        /// Requested channel index
        index: u32,
        /// Channels the state was created with
        channels: u32,
    },

    /// Block length not divisible by the channel count
    #[error("Block of {0} samples is not a multiple of the channel count {1}")]
    UnalignedBlock(usize, u32),

    /// The gated measurement has not seen enough audio to produce a value
    #[error("Not enough audio for a gated measurement")]
    NotEnoughData,

    /// Queried a measurement that was not enabled at creation
    #[error("Measurement {0:?} was not enabled for this state")]
    NotEnabled(&'static str),

    /// Error reported by the underlying engine
    #[error("EBU R128 engine error: {0}")]
    Engine(String),
}

impl From<ebur128::Error> for EngineError {
    fn from(err: ebur128::Error) -> Self {
        Self::Engine(format!("{:?}", err))
    }
}

//! Error taxonomy for batch scanning
//!
//! Everything here is per-file unless noted: an error is captured on the
//! file's record and reported in the summary, and never aborts sibling tasks
//! or the batch. Short reads and close failures are warnings, not errors;
//! they live as flags/log lines, because the measurement is still valid.

use loudscan_decode::DecodeError;
use loudscan_engine::EngineError;
use thiserror::Error;

/// Result type for batch operations
pub type Result<T> = std::result::Result<T, ScanError>;

/// Why a file was excluded from measurement and aggregation
#[derive(Error, Debug)]
pub enum ScanError {
    /// No decoder claims the file's extension
    #[error("No decoder registered for extension {0:?}")]
    UnsupportedFormat(String),

    /// The decoder could not open or parse the file
    #[error("Failed to open input: {0}")]
    OpenFailed(String),

    /// The one-second decode buffer could not be allocated
    #[error("Failed to allocate the decode buffer")]
    AllocFailed,

    /// The decoder failed mid-stream in a way it could not absorb
    #[error("Decode failed: {0}")]
    Decode(String),

    /// The loudness engine rejected the stream or a block
    #[error("Loudness engine failed: {0}")]
    Engine(String),

    /// A decoder library's process-wide init failed; fatal to the whole
    /// batch, surfaced at scanner construction
    #[error("Decoder library initialization failed: {0}")]
    Init(String),

    /// The worker pool could not be built; fatal to the whole batch
    #[error("Failed to build the worker pool: {0}")]
    Pool(String),
}

impl From<DecodeError> for ScanError {
    fn from(err: DecodeError) -> Self {
        match err {
            DecodeError::UnsupportedFormat(ext) => Self::UnsupportedFormat(ext),
            DecodeError::AllocFailed => Self::AllocFailed,
            open @ DecodeError::OpenFailed { .. } => Self::OpenFailed(open.to_string()),
            init @ DecodeError::LibraryInit(..) => Self::Init(init.to_string()),
            other => Self::Decode(other.to_string()),
        }
    }
}

impl From<EngineError> for ScanError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err.to_string())
    }
}

//! Error types for decoding

use std::path::PathBuf;
use thiserror::Error;

/// Result type for decode operations
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Errors that can occur while opening and streaming an input file
#[derive(Error, Debug)]
pub enum DecodeError {
    /// No family claims the extension
    #[error("No decoder registered for extension {0:?}")]
    UnsupportedFormat(String),

    /// The decoder could not open or parse the file header
    #[error("Failed to open {path}: {reason}")]
    OpenFailed {
        /// Input path
        path: PathBuf,
        /// Decoder-reported reason
        reason: String,
    },

    /// The one-second read buffer could not be allocated (or was never
    /// allocated before a read)
    #[error("Failed to allocate the decode buffer")]
    AllocFailed,

    /// The underlying file handle could not be released cleanly
    #[error("Failed to close the input file: {0}")]
    CloseFailed(String),

    /// The container carries no channel map; engine defaults apply
    #[error("No channel map available")]
    NoChannelMap,

    /// Applying a recognized channel map to the engine failed
    #[error("Failed to apply channel map: {0}")]
    ChannelMap(#[from] loudscan_engine::EngineError),

    /// Process-wide init for a decoder library failed; fatal for every file
    /// of that family
    #[error("Decoder library {0} failed to initialize: {1}")]
    LibraryInit(&'static str, String),

    /// IO error outside the decoder's own reporting
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

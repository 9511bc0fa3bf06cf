//! Concurrent batch loudness scanning
//!
//! The orchestration core of loudscan: takes an ordered list of file paths
//! plus [`ScanOptions`], scans every file through a bounded worker pool, and
//! combines the per-file measurements into batch statistics.
//!
//! Each file goes through two stages. Discovery opens the file through the
//! decoder registry, reads its layout and declared length, and sizes a fresh
//! loudness engine state to the stream. Streaming measurement then feeds
//! one-second blocks of decoded audio to the engine, crediting the file's
//! elapsed-frame counter and the shared progress counter after every read,
//! until the decoder reports end of stream.
//!
//! A sizing pre-pass over all files fixes the progress denominator before
//! any streaming starts, so a reporter thread can render a stable
//! fraction/ETA while tasks run in arbitrary interleavings. After the pool
//! drains, the aggregator combines the retained engine states at the
//! gating-block level — the same audio split across files yields the same
//! batch loudness regardless of scheduling.
//!
//! # Example
//!
//! ```no_run
//! use loudscan_batch::{BatchScanner, PeakMode, ScanOptions};
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), loudscan_batch::ScanError> {
//! let scanner = BatchScanner::new(ScanOptions {
//!     loudness_range: true,
//!     peak: PeakMode::True,
//! })?
//! .workers(4);
//!
//! let report = scanner.scan(&[PathBuf::from("a.wav"), PathBuf::from("b.flac")])?;
//! for record in &report.files {
//!     if let Some(measurement) = &record.measurement {
//!         println!("{}: {:?} LUFS", record.path.display(), measurement.integrated_lufs);
//!     }
//! }
//! println!("album: {:?} LUFS", report.summary.integrated_lufs);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod aggregate;
mod error;
mod gain;
mod options;
mod progress;
mod record;
mod scheduler;
mod task;

pub use aggregate::BatchSummary;
pub use error::{Result, ScanError};
pub use gain::{album_gain, track_gain, GainSuggestion, REPLAYGAIN_REFERENCE_LUFS};
pub use options::{PeakMode, ScanOptions};
pub use progress::ProgressSnapshot;
pub use record::{FileRecord, Measurement};
pub use scheduler::{BatchReport, BatchScanner};

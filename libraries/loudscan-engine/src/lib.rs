//! Loudness engine binding for loudscan
//!
//! This crate wraps the ebur128 crate behind an ownership-safe interface used
//! by the scan pipeline. One `LoudnessState` is created per audio stream,
//! sized to that stream's channel count and sample rate, and fed interleaved
//! f32 blocks. It measures:
//! - Integrated loudness (LUFS) per ITU-R BS.1770 / EBU R128
//! - Loudness range (LU), optional
//! - Sample peak (linear), optional
//! - True peak (linear, 4x oversampling), optional
//!
//! States retain their gating-block history, so several of them can be
//! combined into album-level loudness and range figures without re-reading
//! any audio.

#![forbid(unsafe_code)]

mod error;
mod state;

pub use error::{EngineError, Result};
pub use state::{linear_to_dbfs, ChannelRole, LoudnessState, Measures};

//! The uniform decoder capability interface

use crate::error::Result;
use loudscan_engine::LoudnessState;

/// One open input file.
///
/// An adapter is exclusively owned by the task scanning its file; it is never
/// shared or accessed concurrently. The read protocol is: `allocate_buffer`
/// once, then `read_frames` until it reports end of stream, slicing
/// `buffer()` to `frames_read * channels` samples after each read, then
/// `close`.
pub trait DecoderAdapter: Send {
    /// Number of interleaved channels in the stream.
    fn channels(&self) -> u32;

    /// Stream sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Total frame count declared by the container header. Streams that
    /// cannot declare a length up front are rejected at open.
    fn total_frames(&self) -> u64;

    /// Allocate the reusable read buffer: one second of interleaved samples
    /// at the stream's rate and channel count, bounding peak memory per task.
    fn allocate_buffer(&mut self) -> Result<()>;

    /// The read buffer. Only the first `frames_read * channels` samples from
    /// the most recent `read_frames` call hold decoded audio.
    fn buffer(&self) -> &[f32];

    /// Decode up to one second of audio into the buffer and return the number
    /// of frames read. Zero, or fewer frames than one second holds, signals
    /// end of stream.
    fn read_frames(&mut self) -> Result<usize>;

    /// Assign channel roles on the loudness state from the container's
    /// channel map. `Err(DecodeError::NoChannelMap)` means the container has
    /// no map and the engine defaults stay in effect; recognized maps assign
    /// every entry, marking unrecognized positions unused rather than
    /// dropping them.
    fn map_channels(&self, state: &mut LoudnessState) -> Result<()>;

    /// Release the underlying file handle.
    fn close(&mut self) -> Result<()>;
}

impl std::fmt::Debug for dyn DecoderAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoderAdapter")
            .field("channels", &self.channels())
            .field("sample_rate", &self.sample_rate())
            .field("total_frames", &self.total_frames())
            .finish()
    }
}

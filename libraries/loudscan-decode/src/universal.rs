//! Compressed-format input family built on symphonia
//!
//! Covers every non-WAV extension through symphonia's probe/decode pipeline.
//! Packets decode into whatever block size the codec produces; the adapter
//! rebuffers them so `read_frames` always hands back one-second slices until
//! the stream drains. Containers that cannot declare a total frame count up
//! front are rejected at open.

use crate::adapter::DecoderAdapter;
use crate::error::{DecodeError, Result};
use crate::registry::DecoderFamily;
use loudscan_engine::{ChannelRole, LoudnessState};
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Channels, Signal};
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

/// The symphonia-backed family for compressed formats.
pub struct SymphoniaFamily;

impl DecoderFamily for SymphoniaFamily {
    fn name(&self) -> &'static str {
        "symphonia"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["flac", "ogg", "oga", "mp3", "m4a", "aac"]
    }

    fn open(&self, path: &Path) -> Result<Box<dyn DecoderAdapter>> {
        Ok(Box::new(SymphoniaAdapter::open(path)?))
    }
}

/// One open symphonia stream.
pub struct SymphoniaAdapter {
    path: PathBuf,
    format: Option<Box<dyn FormatReader>>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    channels: u32,
    channel_layout: Channels,
    sample_rate: u32,
    total_frames: u64,
    /// The one-second read buffer handed to callers.
    buffer: Vec<f32>,
    /// Interleaved samples decoded past the end of the previous read.
    pending: Vec<f32>,
    eof: bool,
}

impl SymphoniaAdapter {
    fn open(path: &Path) -> Result<Self> {
        let open_failed = |reason: String| DecodeError::OpenFailed {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::open(path).map_err(|e| open_failed(e.to_string()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| open_failed(format!("failed to probe container: {e}")))?;
        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| open_failed("no audio track".into()))?;

        let sample_rate = track
            .codec_params
            .sample_rate
            .filter(|rate| *rate > 0)
            .ok_or_else(|| open_failed("header declares no sample rate".into()))?;
        let channel_layout = track
            .codec_params
            .channels
            .filter(|layout| layout.count() > 0)
            .ok_or_else(|| open_failed("header declares no channels".into()))?;
        let total_frames = track
            .codec_params
            .n_frames
            .ok_or_else(|| open_failed("container does not declare a total frame count".into()))?;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| open_failed(format!("failed to create decoder: {e}")))?;
        let track_id = track.id;

        Ok(Self {
            path: path.to_path_buf(),
            format: Some(format),
            decoder,
            track_id,
            channels: channel_layout.count() as u32,
            channel_layout,
            sample_rate,
            total_frames,
            buffer: Vec::new(),
            pending: Vec::new(),
            eof: false,
        })
    }

    /// Decode packets until at least one more block lands in `pending` or the
    /// stream ends. Read and decode failures past the header end the stream
    /// early; the scan core flags the resulting short read.
    fn decode_more(&mut self) -> Result<()> {
        let format = self
            .format
            .as_mut()
            .ok_or_else(|| DecodeError::CloseFailed("file already closed".into()))?;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    self.eof = true;
                    return Ok(());
                }
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), error = %err, "packet read failed, ending stream early");
                    self.eof = true;
                    return Ok(());
                }
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    if decoded.spec().channels.count() as u32 != self.channels {
                        tracing::warn!(path = %self.path.display(), "channel layout changed mid-stream, ending stream early");
                        self.eof = true;
                        return Ok(());
                    }
                    append_interleaved(&decoded, self.channels as usize, &mut self.pending);
                    return Ok(());
                }
                Err(SymphoniaError::DecodeError(err)) => {
                    tracing::warn!(path = %self.path.display(), error = %err, "recoverable decode error, skipping packet");
                    continue;
                }
                Err(err) => {
                    tracing::warn!(path = %self.path.display(), error = %err, "decoder failed, ending stream early");
                    self.eof = true;
                    return Ok(());
                }
            }
        }
    }
}

impl std::fmt::Debug for SymphoniaAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymphoniaAdapter")
            .field("path", &self.path)
            .field("track_id", &self.track_id)
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .field("total_frames", &self.total_frames)
            .field("eof", &self.eof)
            .finish()
    }
}

impl DecoderAdapter for SymphoniaAdapter {
    fn channels(&self) -> u32 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_frames(&self) -> u64 {
        self.total_frames
    }

    fn allocate_buffer(&mut self) -> Result<()> {
        let len = self.sample_rate as usize * self.channels as usize;
        self.buffer.clear();
        self.buffer
            .try_reserve_exact(len)
            .map_err(|_| DecodeError::AllocFailed)?;
        self.buffer.resize(len, 0.0);
        Ok(())
    }

    fn buffer(&self) -> &[f32] {
        &self.buffer
    }

    fn read_frames(&mut self) -> Result<usize> {
        let want = self.sample_rate as usize * self.channels as usize;
        if self.buffer.len() < want {
            return Err(DecodeError::AllocFailed);
        }

        while self.pending.len() < want && !self.eof {
            self.decode_more()?;
        }

        let take = want.min(self.pending.len());
        self.buffer[..take].copy_from_slice(&self.pending[..take]);
        self.pending.drain(..take);
        Ok(take / self.channels as usize)
    }

    fn map_channels(&self, state: &mut LoudnessState) -> Result<()> {
        // Mono programs weight like a center channel.
        if self.channels == 1 {
            state.set_channel(0, ChannelRole::Center)?;
            return Ok(());
        }

        for (index, role) in channel_roles(self.channel_layout).into_iter().enumerate() {
            state.set_channel(index as u32, role)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.format.take().is_none() {
            return Err(DecodeError::CloseFailed("file already closed".into()));
        }
        self.pending = Vec::new();
        self.buffer = Vec::new();
        Ok(())
    }
}

/// Roles for each channel of the layout, in interleave order. Positions
/// without an EBU R128 role stay in the stream marked unused rather than
/// being dropped from the count.
fn channel_roles(layout: Channels) -> Vec<ChannelRole> {
    let mut roles = Vec::with_capacity(layout.count());
    for bit in 0..u32::BITS {
        let Some(position) = Channels::from_bits(1 << bit) else {
            continue;
        };
        if layout.contains(position) {
            roles.push(role_for(position));
        }
    }
    roles
}

fn role_for(position: Channels) -> ChannelRole {
    if position == Channels::FRONT_LEFT {
        ChannelRole::Left
    } else if position == Channels::FRONT_RIGHT {
        ChannelRole::Right
    } else if position == Channels::FRONT_CENTRE {
        ChannelRole::Center
    } else if position == Channels::REAR_LEFT || position == Channels::SIDE_LEFT {
        ChannelRole::LeftSurround
    } else if position == Channels::REAR_RIGHT || position == Channels::SIDE_RIGHT {
        ChannelRole::RightSurround
    } else {
        ChannelRole::Unused
    }
}

/// Interleave a decoded block onto `out`, converting to f32 with symmetric
/// scaling (divide by 2^(N-1)) for signed integers.
fn append_interleaved(decoded: &AudioBufferRef<'_>, channels: usize, out: &mut Vec<f32>) {
    match decoded {
        AudioBufferRef::F32(buf) => extend_planes(buf, channels, out, |s| s),
        AudioBufferRef::F64(buf) => extend_planes(buf, channels, out, |s| s as f32),
        AudioBufferRef::S32(buf) => {
            extend_planes(buf, channels, out, |s| s as f32 / 2147483648.0);
        }
        AudioBufferRef::S24(buf) => {
            extend_planes(buf, channels, out, |s| s.inner() as f32 / 8388608.0);
        }
        AudioBufferRef::S16(buf) => extend_planes(buf, channels, out, |s| s as f32 / 32768.0),
        AudioBufferRef::S8(buf) => extend_planes(buf, channels, out, |s| s as f32 / 128.0),
        AudioBufferRef::U32(buf) => {
            extend_planes(buf, channels, out, |s| (s as f32 / u32::MAX as f32) * 2.0 - 1.0);
        }
        AudioBufferRef::U24(buf) => {
            extend_planes(buf, channels, out, |s| (s.inner() as f32 / 16777215.0) * 2.0 - 1.0);
        }
        AudioBufferRef::U16(buf) => {
            extend_planes(buf, channels, out, |s| (s as f32 / u16::MAX as f32) * 2.0 - 1.0);
        }
        AudioBufferRef::U8(buf) => {
            extend_planes(buf, channels, out, |s| (s as f32 / u8::MAX as f32) * 2.0 - 1.0);
        }
    }
}

fn extend_planes<T, F>(buf: &AudioBuffer<T>, channels: usize, out: &mut Vec<f32>, convert: F)
where
    T: Sample + Copy,
    F: Fn(T) -> f32,
{
    let frames = buf.frames();
    out.reserve(frames * channels);
    for frame in 0..frames {
        for ch in 0..channels {
            out.push(convert(buf.chan(ch)[frame]));
        }
    }
}

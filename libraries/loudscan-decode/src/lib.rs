//! Decoder adapters for loudscan
//!
//! Every supported container/codec is reached through one capability
//! interface, [`DecoderAdapter`]: open a file, report its layout and declared
//! length, stream decoded interleaved f32 audio one second at a time into a
//! reusable buffer, map physical channels onto loudness roles, and close.
//!
//! [`DecoderRegistry`] selects the implementation by lowercase file
//! extension. Adapters are statically linked and grouped into
//! [`DecoderFamily`] values, one per underlying decoding library, whose
//! process-wide `init`/`exit` lifecycle the registry runs exactly once each.
//!
//! Built-in families:
//! - WAV via `hound` (`wav`, `wave`)
//! - Everything else via `symphonia` (`flac`, `ogg`, `oga`, `mp3`, `m4a`,
//!   `aac`)

#![forbid(unsafe_code)]

mod adapter;
mod error;
mod registry;
mod universal;
mod wav;

pub use adapter::DecoderAdapter;
pub use error::{DecodeError, Result};
pub use registry::{DecoderFamily, DecoderRegistry};
pub use universal::SymphoniaFamily;
pub use wav::WavFamily;

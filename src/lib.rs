//! Streaming chiptune playback adapter
//!
//! Wraps a forward-only tracker decoder and exposes it as a continuous,
//! seekable, thread-safe stream of interleaved little-endian 16-bit stereo
//! PCM, suitable for any pull-based audio sink. The adapter handles buffered
//! incremental decoding, sample-accurate position bookkeeping, loop-vs-end
//! behavior, volume scaling and mono-to-stereo duplication; the tracker
//! format itself stays behind the opaque [`TrackDecoder`] capability.
//!
//! # Crate feature flags
//! - `softsynth` (default): Built-in non-accurate square-voice demo decoder
//!   (`softsynth`)
//! - `streaming` (opt-in): Real-time audio output (enables optional `rodio`
//!   dep, `stream::sink` / `stream::source`)
//! - `export-wav` (opt-in): Render a stream to a WAV file (enables optional
//!   `hound` dep, `export`)
//!
//! # Quick start
//! ## Pull PCM by hand
//! ```no_run
//! # #[cfg(feature = "softsynth")]
//! # {
//! use ym_stream::softsynth::SoftToneDecoder;
//! use ym_stream::{StreamConfig, YmStream};
//! let data = std::fs::read("track.notes").unwrap();
//! let config = StreamConfig::default().with_volume(0.5);
//! let stream = YmStream::open::<SoftToneDecoder>(&data, &config).unwrap();
//! let mut pcm = vec![0u8; 4096];
//! let outcome = stream.pull(&mut pcm);
//! assert_eq!(outcome.bytes_written, pcm.len());
//! # }
//! ```
//!
//! ## Real-time playback
//! ```no_run
//! # #[cfg(all(feature = "softsynth", feature = "streaming"))]
//! # {
//! use ym_stream::softsynth::{demo_track, SoftToneDecoder};
//! use ym_stream::{AudioDevice, StreamConfig, YmStream};
//! let config = StreamConfig::default().with_looping(true);
//! let stream = YmStream::open::<SoftToneDecoder>(demo_track(), &config).unwrap();
//! let device = AudioDevice::new().unwrap();
//! device.attach(&stream);
//! device.wait_until_end();
//! # }
//! ```

#![warn(missing_docs)]

pub mod decoder; // Decoder capability traits
#[cfg(feature = "export-wav")]
pub mod export; // WAV rendering
#[cfg(feature = "softsynth")]
pub mod softsynth; // Demo square-voice decoder
pub mod stream; // PCM Stream Adapter & Playback Sink

/// Error types for stream adapter operations
#[derive(thiserror::Error, Debug)]
pub enum YmStreamError {
    /// The track bytes could not be parsed by the decoder capability.
    /// Raised only at construction; nothing is leaked on this path.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The adapter loaded but could not be bound into a playback sink
    /// (missing output device, incompatible format). The adapter itself
    /// remains owned by the caller and stays usable.
    #[error("Sink attach error: {0}")]
    SinkAttach(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for YmStreamError {
    fn from(msg: String) -> Self {
        YmStreamError::Other(msg)
    }
}

impl From<&str> for YmStreamError {
    fn from(msg: &str) -> Self {
        YmStreamError::Other(msg.to_string())
    }
}

/// Result type for stream adapter operations
pub type Result<T> = std::result::Result<T, YmStreamError>;

// Public API exports
pub use decoder::{Batch, LoadTrack, TrackDecoder};
pub use stream::{PullOutcome, StreamConfig, YmStream};

#[cfg(feature = "softsynth")]
pub use softsynth::SoftToneDecoder;
#[cfg(feature = "streaming")]
pub use stream::{AudioDevice, StreamSource};

//! Decoder capability traits
//!
//! The stream adapter treats the tracker format as opaque: any component
//! that can fill batches of mono `i16` samples on demand and rewind to the
//! start of the track is a usable decoder. The register/channel model of a
//! concrete chip stays entirely behind this boundary.

/// Result of one [`TrackDecoder::decode_batch`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    /// Number of real samples written to the front of the output slice.
    pub produced: usize,
    /// True when the current pass of the track ended during this batch.
    pub exhausted: bool,
}

/// Forward-only batch decoder for a loaded track.
///
/// # Contract
///
/// - `decode_batch` writes `produced` real samples to the front of `out`
///   and zero-fills the remainder.
/// - `exhausted` is reported only when the batch could not be fully
///   satisfied (`produced < out.len()`). A batch that the track fills
///   exactly to its last sample reports `exhausted: false`; the following
///   batch then produces nothing and reports the end. This keeps the
///   adapter's end-of-stream signal off the exact-boundary pull.
/// - A transient decode fault inside a batch is not an error: the decoder
///   substitutes silence for the affected samples (counting them as
///   produced) and keeps going. There is deliberately no error channel
///   here, so nothing on the audio pull path can fail.
pub trait TrackDecoder: Send {
    /// Fill `out` with mono samples, zero-padding past the end of the pass.
    fn decode_batch(&mut self, out: &mut [i16]) -> Batch;

    /// Rewind to the start of the track for another pass.
    fn restart(&mut self);

    /// Total duration of one pass in milliseconds.
    fn duration_ms(&self) -> u64;
}

/// Construction of a decoder from raw track bytes.
///
/// Failing to parse is the one fatal decode error in the crate; since the
/// half-built decoder is dropped before the error propagates, construction
/// never leaks a resource.
pub trait LoadTrack: TrackDecoder + Sized {
    /// Parse compressed track bytes for playback at `sample_rate` Hz.
    fn load(data: &[u8], sample_rate: u32) -> crate::Result<Self>;
}

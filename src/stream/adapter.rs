//! The stream adapter: seekable stereo PCM over a forward-only decoder.

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::Arc;

use parking_lot::Mutex;

use super::{StreamConfig, BYTES_PER_FRAME, DECODE_CHUNK};
use crate::decoder::{LoadTrack, TrackDecoder};
use crate::Result;

/// What a [`YmStream::pull`] call delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PullOutcome {
    /// Bytes written into the caller's buffer. Equal to the frame-truncated
    /// request for every pull on an open adapter; zero after `close`.
    pub bytes_written: usize,
    /// True once the decoder is terminally exhausted (never with looping).
    pub end_of_stream: bool,
}

/// State behind the adapter's single exclusive lock.
struct Inner {
    /// `None` once closed; the decoder is dropped exactly once.
    decoder: Option<Box<dyn TrackDecoder>>,
    /// Reusable mono decode buffer. Capacity is fixed at construction and
    /// never exposed outside the adapter.
    scratch: Vec<i16>,
    /// Playback position in mono samples since stream start.
    position_samples: u64,
    /// Latched once a non-looping decoder runs out of samples.
    exhausted: bool,
    /// Gain in `[0.0, 1.0]`, applied to every outgoing sample.
    volume: f64,
}

/// Seekable, thread-safe stereo PCM stream over a [`TrackDecoder`].
///
/// The handle is cheap to clone; all clones share one adapter, so a
/// playback sink can own one handle while transport controls (seek,
/// volume) use another. Every operation takes the adapter's single
/// exclusive lock: concurrent callers serialize, no call ever observes a
/// torn intermediate state, and each pull reflects a position strictly
/// after the one left by the preceding pull or seek.
///
/// Output format: interleaved little-endian 16-bit stereo at the
/// construction sample rate. The decoder is mono; both channels carry the
/// same value, preserving the original track's mono output exactly rather
/// than synthesizing stereo.
#[derive(Clone)]
pub struct YmStream {
    inner: Arc<Mutex<Inner>>,
    sample_rate: u32,
    looping: bool,
    total_samples: u64,
}

impl std::fmt::Debug for YmStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YmStream")
            .field("sample_rate", &self.sample_rate)
            .field("looping", &self.looping)
            .field("total_samples", &self.total_samples)
            .finish_non_exhaustive()
    }
}

impl YmStream {
    /// Load compressed track bytes through a [`LoadTrack`] decoder and wrap
    /// the result.
    ///
    /// Fails with [`YmStreamError::Decode`](crate::YmStreamError::Decode)
    /// when the bytes are not a valid track, or
    /// [`YmStreamError::Config`](crate::YmStreamError::Config) for a bad
    /// configuration. A decoder that failed mid-construction is dropped
    /// before the error returns.
    pub fn open<D: LoadTrack + 'static>(data: &[u8], config: &StreamConfig) -> Result<YmStream> {
        config.validate()?;
        let decoder = D::load(data, config.sample_rate)?;
        Ok(Self::from_decoder(Box::new(decoder), config))
    }

    /// Wrap an already-constructed decoder.
    ///
    /// Total duration metadata is queried once, here; end-of-stream during
    /// playback is detected from the decoder's own exhaustion signal, never
    /// from the duration. An out-of-range volume is clamped.
    pub fn from_decoder(decoder: Box<dyn TrackDecoder>, config: &StreamConfig) -> YmStream {
        let total_samples = decoder.duration_ms() * u64::from(config.sample_rate) / 1000;
        YmStream {
            inner: Arc::new(Mutex::new(Inner {
                decoder: Some(decoder),
                scratch: vec![0; DECODE_CHUNK],
                position_samples: 0,
                exhausted: false,
                volume: config.volume.clamp(0.0, 1.0),
            })),
            sample_rate: config.sample_rate,
            looping: config.looping,
            total_samples,
        }
    }

    /// Fill `out` with interleaved 16-bit stereo PCM.
    ///
    /// Always produces the full frame-truncated request (`out.len()`
    /// rounded down to a whole stereo frame; trailing bytes of an
    /// off-contract request are ignored). When a non-looping decoder runs
    /// out, the remainder is zero-filled and `end_of_stream` is reported on
    /// this and every later pull; the pull that consumes exactly the last
    /// sample does *not* report it yet. With looping the decoder restarts
    /// transparently and `end_of_stream` is never reported.
    ///
    /// After [`close`](Self::close) a pull writes nothing.
    pub fn pull(&self, out: &mut [u8]) -> PullOutcome {
        let usable = out.len() - out.len() % BYTES_PER_FRAME;
        let frames_needed = usable / BYTES_PER_FRAME;

        let mut inner = self.inner.lock();
        let inner = &mut *inner;

        let Some(decoder) = inner.decoder.as_mut() else {
            return PullOutcome {
                bytes_written: 0,
                end_of_stream: true,
            };
        };

        if inner.exhausted {
            out[..usable].fill(0);
            return PullOutcome {
                bytes_written: usable,
                end_of_stream: true,
            };
        }

        let mut processed = 0usize;
        let mut end_of_stream = false;
        let mut just_restarted = false;

        while processed < frames_needed {
            let chunk = (frames_needed - processed).min(DECODE_CHUNK);
            let batch = decoder.decode_batch(&mut inner.scratch[..chunk]);
            let produced = batch.produced.min(chunk);

            for (i, &raw) in inner.scratch[..produced].iter().enumerate() {
                let scaled = (f64::from(raw) * inner.volume)
                    .clamp(f64::from(i16::MIN), f64::from(i16::MAX))
                    as i16;
                let [lo, hi] = scaled.to_le_bytes();
                let base = (processed + i) * BYTES_PER_FRAME;
                out[base] = lo;
                out[base + 1] = hi;
                out[base + 2] = lo;
                out[base + 3] = hi;
            }
            processed += produced;
            inner.position_samples += produced as u64;
            if self.total_samples > 0 {
                inner.position_samples = inner.position_samples.min(self.total_samples);
            }

            if batch.exhausted {
                // A restart that immediately exhausts again means the track
                // has nothing left to give; end the stream even when looping.
                if !self.looping || (just_restarted && produced == 0) {
                    out[processed * BYTES_PER_FRAME..usable].fill(0);
                    inner.exhausted = true;
                    end_of_stream = true;
                    break;
                }
                decoder.restart();
                inner.position_samples =
                    inner.position_samples.saturating_sub(self.total_samples);
                just_restarted = true;
                continue;
            }
            just_restarted = false;

            if produced == 0 {
                // A faulting batch yields no samples without claiming
                // exhaustion; substitute a chunk of silence rather than spin.
                out[processed * BYTES_PER_FRAME..(processed + chunk) * BYTES_PER_FRAME].fill(0);
                processed += chunk;
                inner.position_samples += chunk as u64;
            }
        }

        PullOutcome {
            bytes_written: usable,
            end_of_stream,
        }
    }

    /// Move the reported playback position, in mono sample units.
    ///
    /// The target computed from the origin and offset is clamped into
    /// `[0, total_samples]` and returned.
    ///
    /// This seek is **position-accounting-only**: the decoder capability is
    /// forward-only, so the decode point is not moved and subsequent audio
    /// continues from wherever decoding already was. The one exception is a
    /// seek on a terminally exhausted adapter, which restarts the decoder
    /// and clears the end-of-stream latch so that "rewind after the track
    /// ended" audibly works.
    pub fn seek_samples(&self, pos: SeekFrom) -> Result<u64> {
        let mut inner = self.inner.lock();

        let target = match pos {
            SeekFrom::Start(n) => i64::try_from(n).unwrap_or(i64::MAX),
            SeekFrom::Current(delta) => inner.position_samples as i64 + delta,
            SeekFrom::End(delta) => self.total_samples as i64 + delta,
        };
        let clamped = target.clamp(0, self.total_samples as i64) as u64;
        inner.position_samples = clamped;

        if inner.exhausted {
            if let Some(decoder) = inner.decoder.as_mut() {
                decoder.restart();
                inner.exhausted = false;
            }
        }
        Ok(clamped)
    }

    /// Set the gain factor, clamped into `[0.0, 1.0]`. Takes effect on the
    /// next pull; samples already delivered downstream are unaffected.
    pub fn set_volume(&self, volume: f64) {
        self.inner.lock().volume = volume.clamp(0.0, 1.0);
    }

    /// Current gain factor.
    pub fn volume(&self) -> f64 {
        self.inner.lock().volume
    }

    /// Current playback position in mono samples.
    pub fn position_samples(&self) -> u64 {
        self.inner.lock().position_samples
    }

    /// Track length in mono samples, derived once from decoder metadata.
    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    /// Output sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Whether exhaustion restarts the track.
    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Whether a non-looping decoder has terminally run out.
    pub fn is_exhausted(&self) -> bool {
        self.inner.lock().exhausted
    }

    /// Whether [`close`](Self::close) has released the decoder.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().decoder.is_none()
    }

    /// Release the decoder. Idempotent, callable from any thread;
    /// subsequent pulls write nothing and subsequent seeks only adjust
    /// bookkeeping.
    pub fn close(&self) {
        self.inner.lock().decoder = None;
    }
}

/// Byte-stream view of the adapter. `read` delegates to
/// [`pull`](YmStream::pull) and returns `Ok(0)` only once the stream is
/// terminally exhausted or closed.
impl Read for YmStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.is_exhausted() || self.is_closed() {
            return Ok(0);
        }
        let outcome = self.pull(buf);
        Ok(outcome.bytes_written)
    }
}

/// Byte-offset seeking over the PCM stream: one stereo frame is four
/// bytes, so byte offsets map to `offset / 4` mono samples.
impl Seek for YmStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let sample_pos = match pos {
            SeekFrom::Start(bytes) => SeekFrom::Start(bytes / BYTES_PER_FRAME as u64),
            SeekFrom::Current(delta) => SeekFrom::Current(delta / BYTES_PER_FRAME as i64),
            SeekFrom::End(delta) => SeekFrom::End(delta / BYTES_PER_FRAME as i64),
        };
        let samples = self
            .seek_samples(sample_pos)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        Ok(samples * BYTES_PER_FRAME as u64)
    }
}

//! rodio source bridge for the stream adapter.

use std::time::Duration;

use rodio::Source;

use super::{YmStream, BYTES_PER_FRAME};

/// Bytes pulled from the adapter per refill. Batching keeps the per-sample
/// iterator from taking the adapter lock 44100 times a second.
const LOCAL_BATCH_BYTES: usize = 4096;

/// Sample source feeding a rodio sink from a shared [`YmStream`].
///
/// Iterates interleaved stereo `i16` samples. Ends (returns `None`) once
/// the adapter reports terminal end-of-stream or has been closed, so a
/// non-looping track finishes the sink queue instead of playing silence
/// forever; a looping adapter never ends.
pub struct StreamSource {
    stream: YmStream,
    scratch: Vec<u8>,
    local: Vec<i16>,
    local_pos: usize,
    ended: bool,
}

impl StreamSource {
    /// Create a source over a clone of the adapter handle.
    pub fn new(stream: YmStream) -> Self {
        StreamSource {
            stream,
            scratch: vec![0; LOCAL_BATCH_BYTES],
            local: Vec::with_capacity(LOCAL_BATCH_BYTES / 2),
            local_pos: 0,
            ended: false,
        }
    }

    fn refill(&mut self) {
        let outcome = self.stream.pull(&mut self.scratch);
        self.local.clear();
        for pair in self.scratch[..outcome.bytes_written].chunks_exact(2) {
            self.local.push(i16::from_le_bytes([pair[0], pair[1]]));
        }
        self.local_pos = 0;
        if outcome.end_of_stream {
            self.ended = true;
        }
    }
}

impl Iterator for StreamSource {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if self.local_pos >= self.local.len() {
            if self.ended {
                return None;
            }
            self.refill();
            if self.local.is_empty() {
                // closed adapter: nothing was written at all
                return None;
            }
        }
        let sample = self.local[self.local_pos];
        self.local_pos += 1;
        Some(sample)
    }
}

impl Source for StreamSource {
    fn current_frame_len(&self) -> Option<usize> {
        if self.stream.looping() {
            None
        } else {
            let remaining = self
                .stream
                .total_samples()
                .saturating_sub(self.stream.position_samples());
            if remaining > 0 {
                // two interleaved output samples per mono sample
                Some((remaining as usize).saturating_mul(2))
            } else {
                Some(LOCAL_BATCH_BYTES / BYTES_PER_FRAME)
            }
        }
    }

    fn channels(&self) -> u16 {
        2
    }

    fn sample_rate(&self) -> u32 {
        self.stream.sample_rate()
    }

    fn total_duration(&self) -> Option<Duration> {
        if self.stream.looping() {
            None
        } else {
            Some(Duration::from_secs_f64(
                self.stream.total_samples() as f64 / f64::from(self.stream.sample_rate()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{Batch, TrackDecoder};
    use crate::stream::StreamConfig;

    struct ToneDecoder {
        len: u64,
        pos: u64,
    }

    impl TrackDecoder for ToneDecoder {
        fn decode_batch(&mut self, out: &mut [i16]) -> Batch {
            let avail = (self.len - self.pos).min(out.len() as u64) as usize;
            out[..avail].fill(2000);
            out[avail..].fill(0);
            self.pos += avail as u64;
            Batch {
                produced: avail,
                exhausted: avail < out.len(),
            }
        }

        fn restart(&mut self) {
            self.pos = 0;
        }

        fn duration_ms(&self) -> u64 {
            self.len * 1000 / 1000
        }
    }

    fn stream_of(len: u64, looping: bool) -> YmStream {
        let config = StreamConfig::new(1000).with_volume(1.0).with_looping(looping);
        YmStream::from_decoder(Box::new(ToneDecoder { len, pos: 0 }), &config)
    }

    #[test]
    fn test_source_reports_stereo_format() {
        let source = StreamSource::new(stream_of(100, false));
        assert_eq!(source.channels(), 2);
        assert_eq!(source.sample_rate(), 1000);
        assert_eq!(source.total_duration(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_looping_source_has_no_end() {
        let source = StreamSource::new(stream_of(100, true));
        assert_eq!(source.current_frame_len(), None);
        assert_eq!(source.total_duration(), None);
    }

    #[test]
    fn test_source_ends_after_terminal_exhaustion() {
        let mut source = StreamSource::new(stream_of(10, false));
        // 10 mono samples -> 20 interleaved output samples of real audio,
        // then the padding tail of the terminal pull, then None.
        let emitted: Vec<i16> = source.by_ref().collect();
        assert!(emitted.len() >= 20);
        assert!(emitted[..20].iter().all(|&s| s == 2000));
        assert!(emitted[20..].iter().all(|&s| s == 0));
        assert_eq!(source.next(), None);
    }

    #[test]
    fn test_source_ends_when_adapter_closed() {
        let stream = stream_of(1000, true);
        let mut source = StreamSource::new(stream.clone());
        assert!(source.next().is_some());
        stream.close();
        // local batch drains first, then the closed adapter ends the source
        let drained = source.by_ref().count();
        assert!(drained < LOCAL_BATCH_BYTES / 2);
        assert_eq!(source.next(), None);
    }
}

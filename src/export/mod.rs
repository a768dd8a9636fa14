//! WAV file export functionality
//!
//! Renders the remainder of a stream to disk through the same pull path
//! the playback sink uses, so a render is byte-for-byte what playback
//! would have produced.

use std::path::Path;

use crate::stream::YmStream;
use crate::{Result, YmStreamError};

/// Render a stream to a 16-bit stereo WAV file.
///
/// Pulls from the adapter's current position until terminal exhaustion.
/// Refuses a looping adapter, since that render would never terminate.
///
/// # Examples
///
/// ```no_run
/// # #[cfg(feature = "softsynth")]
/// # {
/// use ym_stream::export::export_to_wav;
/// use ym_stream::softsynth::SoftToneDecoder;
/// use ym_stream::{StreamConfig, YmStream};
///
/// let data = std::fs::read("track.notes").unwrap();
/// let stream = YmStream::open::<SoftToneDecoder>(&data, &StreamConfig::default()).unwrap();
/// export_to_wav(&stream, "output.wav").unwrap();
/// # }
/// ```
pub fn export_to_wav<P: AsRef<Path>>(stream: &YmStream, output_path: P) -> Result<()> {
    if stream.looping() {
        return Err(YmStreamError::Config(
            "cannot render a looping stream to a file".to_string(),
        ));
    }

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: stream.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(output_path, spec)
        .map_err(|e| YmStreamError::Other(format!("failed to create WAV file: {e}")))?;

    let mut buf = vec![0u8; 4096];
    loop {
        let outcome = stream.pull(&mut buf);
        for pair in buf[..outcome.bytes_written].chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
                .map_err(|e| YmStreamError::Other(format!("failed to write sample: {e}")))?;
        }
        if outcome.end_of_stream {
            break;
        }
    }

    writer
        .finalize()
        .map_err(|e| YmStreamError::Other(format!("failed to finalize WAV file: {e}")))?;
    Ok(())
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
            out[..avail].fill(3000);
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

    #[test]
    fn test_export_writes_scaled_stereo_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");

        let config = StreamConfig::new(1000).with_volume(0.5);
        let stream = YmStream::from_decoder(Box::new(ToneDecoder { len: 500, pos: 0 }), &config);
        export_to_wav(&stream, &path).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.sample_rate, 1000);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        // 500 mono samples -> 1000 interleaved, plus terminal padding
        assert!(samples.len() >= 1000);
        assert!(samples[..1000].iter().all(|&s| s == 1500));
        assert!(samples[1000..].iter().all(|&s| s == 0));
    }

    #[test]
    fn test_export_refuses_looping_stream() {
        let config = StreamConfig::new(1000).with_looping(true);
        let stream = YmStream::from_decoder(Box::new(ToneDecoder { len: 10, pos: 0 }), &config);
        let err = export_to_wav(&stream, "unused.wav").unwrap_err();
        assert!(matches!(err, crate::YmStreamError::Config(_)));
    }
}

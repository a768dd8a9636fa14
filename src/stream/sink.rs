//! Audio device integration using rodio
//!
//! Binds a [`YmStream`] to the system audio output. The device owns the
//! output stream and sink; the adapter stays owned by the caller, which is
//! responsible for closing it during teardown.

use rodio::{OutputStream, Sink};

use super::source::StreamSource;
use super::YmStream;
use crate::{Result, YmStreamError};

/// Audio playback device using rodio.
///
/// Construction failure is a [`YmStreamError::SinkAttach`]; the enclosing
/// application is expected to degrade to silent operation rather than
/// terminate when no output device is available.
pub struct AudioDevice {
    _stream: OutputStream,
    sink: Sink,
}

impl AudioDevice {
    /// Open the default output device and create a playback sink on it.
    pub fn new() -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default().map_err(|e| {
            YmStreamError::SinkAttach(format!("failed to open audio output: {e}"))
        })?;

        let sink = Sink::try_new(&stream_handle).map_err(|e| {
            YmStreamError::SinkAttach(format!("failed to create playback sink: {e}"))
        })?;

        Ok(AudioDevice {
            _stream: stream,
            sink,
        })
    }

    /// Schedule a stream for playback. The sink pulls PCM from a clone of
    /// the adapter handle on its own audio thread.
    pub fn attach(&self, stream: &YmStream) {
        self.sink.append(StreamSource::new(stream.clone()));
    }

    /// Pause playback.
    pub fn pause(&self) {
        self.sink.pause();
    }

    /// Resume playback.
    pub fn resume(&self) {
        self.sink.play();
    }

    /// Stop playback and drop everything queued.
    pub fn stop(&self) {
        self.sink.stop();
    }

    /// Block until every attached stream has ended. Never returns for a
    /// looping stream unless it is closed.
    pub fn wait_until_end(&self) {
        self.sink.sleep_until_end();
    }

    /// Whether nothing is queued for playback.
    pub fn is_empty(&self) -> bool {
        self.sink.empty()
    }
}

impl Drop for AudioDevice {
    fn drop(&mut self) {
        self.pause();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{Batch, TrackDecoder};
    use crate::stream::StreamConfig;

    struct SilentDecoder {
        len: u64,
        pos: u64,
    }

    impl TrackDecoder for SilentDecoder {
        fn decode_batch(&mut self, out: &mut [i16]) -> Batch {
            let avail = (self.len - self.pos).min(out.len() as u64) as usize;
            out.fill(0);
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
            self.len * 1000 / 44_100
        }
    }

    fn try_audio_device() -> Option<AudioDevice> {
        match AudioDevice::new() {
            Ok(device) => Some(device),
            Err(err) => {
                eprintln!("Skipping stream::sink test (audio backend unavailable): {err}");
                None
            }
        }
    }

    #[test]
    fn test_attach_and_drain_short_stream() {
        let Some(device) = try_audio_device() else {
            return;
        };
        let stream = YmStream::from_decoder(
            Box::new(SilentDecoder { len: 441, pos: 0 }),
            &StreamConfig::default(),
        );
        device.attach(&stream);
        device.wait_until_end();
        assert!(device.is_empty());
        assert!(stream.is_exhausted());
    }

    #[test]
    fn test_pause_and_resume() {
        let Some(device) = try_audio_device() else {
            return;
        };
        device.pause();
        device.resume();
        device.stop();
        assert!(device.is_empty());
    }
}

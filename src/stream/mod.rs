//! PCM stream adapter and playback sink
//!
//! [`YmStream`] is the heart of the crate: it turns a forward-only
//! [`TrackDecoder`](crate::TrackDecoder) into a byte-oriented, seekable
//! stereo PCM stream. With the `streaming` feature, [`AudioDevice`] binds
//! such a stream to the system audio output via rodio.

use serde::{Deserialize, Serialize};

use crate::{Result, YmStreamError};

mod adapter;
#[cfg(feature = "streaming")]
mod sink;
#[cfg(feature = "streaming")]
mod source;

pub use adapter::{PullOutcome, YmStream};
#[cfg(feature = "streaming")]
pub use sink::AudioDevice;
#[cfg(feature = "streaming")]
pub use source::StreamSource;

/// Standard audio sample rate (44.1 kHz CD quality).
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default gain applied to decoded samples.
pub const DEFAULT_VOLUME: f64 = 0.7;

/// Bytes per interleaved 16-bit stereo frame.
pub const BYTES_PER_FRAME: usize = 4;

/// Capacity of the adapter's reusable mono decode buffer, in samples.
pub(crate) const DECODE_CHUNK: usize = 4096;

fn default_volume() -> f64 {
    DEFAULT_VOLUME
}

/// Configuration for a [`YmStream`].
///
/// Deserializable so hosts can keep playback settings in a JSON config
/// file next to their other options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Restart the track on exhaustion instead of ending the stream.
    #[serde(default)]
    pub looping: bool,
    /// Initial gain in `[0.0, 1.0]`.
    #[serde(default = "default_volume")]
    pub volume: f64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            looping: false,
            volume: DEFAULT_VOLUME,
        }
    }
}

impl StreamConfig {
    /// Create a configuration for the given output rate.
    pub fn new(sample_rate: u32) -> Self {
        StreamConfig {
            sample_rate,
            ..Default::default()
        }
    }

    /// Set loop behavior.
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Set the initial gain.
    pub fn with_volume(mut self, volume: f64) -> Self {
        self.volume = volume;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(YmStreamError::Config(
                "sample rate must be non-zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(YmStreamError::Config(format!(
                "volume {} outside [0.0, 1.0]",
                self.volume
            )));
        }
        Ok(())
    }

    /// Parse and validate a configuration from a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: StreamConfig = serde_json::from_str(json)
            .map_err(|e| YmStreamError::Config(format!("invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StreamConfig::default();
        assert_eq!(config.sample_rate, 44_100);
        assert!(!config.looping);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = StreamConfig::new(48_000).with_looping(true).with_volume(0.5);
        assert_eq!(config.sample_rate, 48_000);
        assert!(config.looping);
        assert!((config.volume - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(StreamConfig::new(0).validate().is_err());
        assert!(StreamConfig::new(44_100).with_volume(1.5).validate().is_err());
        assert!(StreamConfig::new(44_100).with_volume(-0.1).validate().is_err());
    }

    #[test]
    fn test_from_json() {
        let config =
            StreamConfig::from_json(r#"{ "sample_rate": 44100, "looping": true }"#).unwrap();
        assert!(config.looping);
        assert!((config.volume - DEFAULT_VOLUME).abs() < f64::EPSILON);

        assert!(StreamConfig::from_json(r#"{ "sample_rate": 0 }"#).is_err());
        assert!(StreamConfig::from_json("not json").is_err());
    }
}

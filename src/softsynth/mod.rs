//! Demo square-voice decoder (non-accurate)
//!
//! A deliberately simple, musical-not-faithful synthesizer that gives the
//! crate a concrete [`TrackDecoder`] out of the box: the CLI stays playable
//! without bundling a real tracker engine. One square voice, one byte per
//! step, eight steps per second.
//!
//! Track format: each byte is a MIDI note number (0-127), `0xFF` is a
//! rest. Anything else fails to load.

use crate::decoder::{Batch, LoadTrack, TrackDecoder};
use crate::{Result, YmStreamError};

/// Sequencer steps per second.
pub const STEPS_PER_SECOND: u32 = 8;

/// Rest marker in the track byte stream.
pub const REST: u8 = 0xFF;

/// Square amplitude before the adapter's volume scaling.
const BASE_AMPLITUDE: f32 = 0.25 * i16::MAX as f32;

/// Attack/release ramp length in seconds, to avoid clicks at step edges.
const EDGE_SECONDS: f32 = 0.005;

/// Single square voice playing a fixed note sequence.
pub struct SoftToneDecoder {
    sample_rate: u32,
    /// Phase increment per sample for each step; `None` is a rest.
    steps: Vec<Option<f32>>,
    samples_per_step: u64,
    pass_len: u64,
    pos: u64,
    phase: f32,
}

impl SoftToneDecoder {
    /// Build a decoder from raw note bytes.
    pub fn new(notes: &[u8], sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(YmStreamError::Config(
                "sample rate must be non-zero".to_string(),
            ));
        }
        if notes.is_empty() {
            return Err(YmStreamError::Decode("empty track".to_string()));
        }

        let steps = notes
            .iter()
            .map(|&note| match note {
                REST => Ok(None),
                0..=127 => Ok(Some(note_phase_increment(note, sample_rate))),
                _ => Err(YmStreamError::Decode(format!(
                    "invalid note byte 0x{note:02X}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        let samples_per_step = u64::from(sample_rate / STEPS_PER_SECOND);
        let pass_len = samples_per_step * steps.len() as u64;

        Ok(SoftToneDecoder {
            sample_rate,
            steps,
            samples_per_step,
            pass_len,
            pos: 0,
            phase: 0.0,
        })
    }

    fn sample_at(&mut self, pos: u64) -> i16 {
        let step = (pos / self.samples_per_step) as usize;
        let within = pos % self.samples_per_step;
        let Some(increment) = self.steps[step] else {
            return 0;
        };

        // short linear ramps in and out of each step
        let edge = (self.sample_rate as f32 * EDGE_SECONDS).max(1.0);
        let remaining = (self.samples_per_step - within - 1) as f32;
        let gain = (within as f32 / edge).min(1.0) * (remaining / edge).min(1.0);

        let level = if self.phase < 0.5 { 1.0 } else { -1.0 };
        self.phase += increment;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        (level * gain * BASE_AMPLITUDE) as i16
    }
}

fn note_phase_increment(note: u8, sample_rate: u32) -> f32 {
    let freq = 440.0 * 2f32.powf((f32::from(note) - 69.0) / 12.0);
    freq / sample_rate as f32
}

impl TrackDecoder for SoftToneDecoder {
    fn decode_batch(&mut self, out: &mut [i16]) -> Batch {
        let avail = (self.pass_len - self.pos).min(out.len() as u64) as usize;
        for slot in out[..avail].iter_mut() {
            *slot = self.sample_at(self.pos);
            self.pos += 1;
        }
        out[avail..].fill(0);
        Batch {
            produced: avail,
            exhausted: avail < out.len(),
        }
    }

    fn restart(&mut self) {
        self.pos = 0;
        self.phase = 0.0;
    }

    fn duration_ms(&self) -> u64 {
        self.pass_len * 1000 / u64::from(self.sample_rate)
    }
}

impl LoadTrack for SoftToneDecoder {
    fn load(data: &[u8], sample_rate: u32) -> Result<Self> {
        SoftToneDecoder::new(data, sample_rate)
    }
}

/// Built-in four-second arpeggio, used by the CLI when no track file is
/// given.
pub fn demo_track() -> &'static [u8] {
    &[
        57, 60, 64, 69, 64, 60, 57, REST, // A minor up and down
        55, 59, 62, 67, 62, 59, 55, REST, // G major
        53, 57, 60, 65, 60, 57, 53, REST, // F major
        52, 55, 59, 64, 59, 55, 52, REST, // E minor
    ]
}

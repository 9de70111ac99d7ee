//! Export-time audio mixer.
//!
//! During an export every unmuted clip's track is routed here; the mixer
//! sums them into one master track handed to the recorder at finalize.
//! Routing is all-or-nothing per track: a sample-rate mismatch rejects
//! that track (the caller logs and skips it) rather than resampling.

use log::debug;

use crate::entities::source::AudioTrack;

/// Audio routing errors.
#[derive(Debug, PartialEq)]
pub enum AudioError {
    SampleRateMismatch { expected: u32, got: u32 },
}

impl std::fmt::Display for AudioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioError::SampleRateMismatch { expected, got } => {
                write!(f, "Sample rate mismatch: mixer at {} Hz, track at {} Hz", expected, got)
            }
        }
    }
}

impl std::error::Error for AudioError {}

/// Sums routed tracks into one master buffer.
#[derive(Debug, Default)]
pub struct AudioMixer {
    master: Vec<f32>,
    sample_rate: Option<u32>,
    routed: usize,
}

impl AudioMixer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracks routed so far.
    pub fn routed(&self) -> usize {
        self.routed
    }

    pub fn has_routes(&self) -> bool {
        self.routed > 0
    }

    /// Add a track into the mix. The first track fixes the mixer's sample
    /// rate; later tracks must match it.
    pub fn route(&mut self, label: &str, track: &AudioTrack) -> Result<(), AudioError> {
        match self.sample_rate {
            None => self.sample_rate = Some(track.sample_rate),
            Some(rate) if rate != track.sample_rate => {
                return Err(AudioError::SampleRateMismatch {
                    expected: rate,
                    got: track.sample_rate,
                });
            }
            Some(_) => {}
        }

        if self.master.len() < track.samples.len() {
            self.master.resize(track.samples.len(), 0.0);
        }
        for (dst, src) in self.master.iter_mut().zip(&track.samples) {
            *dst += src;
        }
        self.routed += 1;
        debug!("Routed audio track '{}' ({} samples)", label, track.samples.len());
        Ok(())
    }

    /// Finish the mix: summed samples clamped to [-1, 1], plus the rate.
    /// None when nothing was routed.
    pub fn mix(mut self) -> Option<(Vec<f32>, u32)> {
        let rate = self.sample_rate?;
        if self.routed == 0 {
            return None;
        }
        for s in &mut self.master {
            *s = s.clamp(-1.0, 1.0);
        }
        Some((self.master, rate))
    }
}

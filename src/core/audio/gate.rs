//! Energy-based noise gate.
//!
//! Frames whose RMS falls below the threshold are replaced by silence of the
//! same length, so the stream stays continuous and correctly timed while
//! ambient noise never reaches the remote model as speech.

/// Default RMS threshold below which a frame is treated as silence.
pub const DEFAULT_NOISE_THRESHOLD: f32 = 0.01;

/// Multiplier applied to RMS for the UI volume meter.
pub const VOLUME_GAIN: f32 = 5.0;

/// Outcome of gating one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct GatedFrame {
    /// Samples to transmit: the input, or zeros when gated.
    pub samples: Vec<f32>,
    /// Raw RMS of the input frame.
    pub rms: f32,
    /// Meter value in `[0, 1]`; zero when gated.
    pub volume: f32,
    pub gated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseGate {
    threshold: f32,
}

impl Default for NoiseGate {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_THRESHOLD)
    }
}

impl NoiseGate {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.max(0.0),
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Root-mean-square energy of `frame`. Empty frames have zero energy.
    pub fn rms(frame: &[f32]) -> f32 {
        if frame.is_empty() {
            return 0.0;
        }
        let sum: f32 = frame.iter().map(|s| s * s).sum();
        (sum / frame.len() as f32).sqrt()
    }

    /// Meter value for an ungated frame.
    #[inline]
    pub fn volume_for(rms: f32) -> f32 {
        (rms * VOLUME_GAIN).min(1.0)
    }

    pub fn process(&self, frame: &[f32]) -> GatedFrame {
        let rms = Self::rms(frame);
        if rms < self.threshold {
            GatedFrame {
                samples: vec![0.0; frame.len()],
                rms,
                volume: 0.0,
                gated: true,
            }
        } else {
            GatedFrame {
                samples: frame.to_vec(),
                rms,
                volume: Self::volume_for(rms),
                gated: false,
            }
        }
    }
}

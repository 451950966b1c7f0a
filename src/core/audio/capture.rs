//! Microphone capture pipeline.
//!
//! Raw device chunks are re-framed to a fixed tick size, gated, and encoded
//! for the realtime input channel. Each tick also yields a volume reading for
//! the UI, whether or not the frame was gated.

use super::codec;
use super::gate::{GatedFrame, NoiseGate};

/// Default capture tick: 2048 samples, 128 ms at 16 kHz.
pub const DEFAULT_FRAME_SIZE: usize = 2048;

/// Re-chunks an arbitrary sample stream into fixed-size frames.
#[derive(Debug, Clone)]
pub struct FrameAccumulator {
    frame_size: usize,
    pending: Vec<f32>,
}

impl FrameAccumulator {
    pub fn new(frame_size: usize) -> Self {
        let frame_size = frame_size.max(1);
        Self {
            frame_size,
            pending: Vec::with_capacity(frame_size),
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Samples held back until the next frame completes.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

    /// Append `chunk` and return every frame it completes, in order.
    pub fn push(&mut self, chunk: &[f32]) -> Vec<Vec<f32>> {
        let mut frames = Vec::new();
        let mut rest = chunk;
        while !rest.is_empty() {
            let take = (self.frame_size - self.pending.len()).min(rest.len());
            self.pending.extend_from_slice(&rest[..take]);
            rest = &rest[take..];
            if self.pending.len() == self.frame_size {
                frames.push(std::mem::replace(
                    &mut self.pending,
                    Vec::with_capacity(self.frame_size),
                ));
            }
        }
        frames
    }
}

/// One frame ready for transmission.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedFrame {
    /// Base64 PCM16 of the gate output.
    pub payload: String,
    pub volume: f32,
    pub gated: bool,
}

#[derive(Debug, Clone)]
pub struct CapturePipeline {
    gate: NoiseGate,
    accumulator: FrameAccumulator,
}

impl CapturePipeline {
    pub fn new(frame_size: usize, noise_threshold: f32) -> Self {
        Self {
            gate: NoiseGate::new(noise_threshold),
            accumulator: FrameAccumulator::new(frame_size),
        }
    }

    pub fn frame_size(&self) -> usize {
        self.accumulator.frame_size()
    }

    /// Gate and encode one complete frame.
    pub fn process_frame(&self, frame: &[f32]) -> CapturedFrame {
        let GatedFrame {
            samples,
            volume,
            gated,
            ..
        } = self.gate.process(frame);
        CapturedFrame {
            payload: codec::encode(&samples),
            volume,
            gated,
        }
    }

    /// Feed a device chunk and return the frames it completes.
    pub fn push(&mut self, chunk: &[f32]) -> Vec<CapturedFrame> {
        self.accumulator
            .push(chunk)
            .iter()
            .map(|frame| self.process_frame(frame))
            .collect()
    }
}

impl Default for CapturePipeline {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_SIZE, super::gate::DEFAULT_NOISE_THRESHOLD)
    }
}

//! Software playback timeline.
//!
//! A sample-accurate mixer that implements [`PlaybackContext`]. Its clock is
//! the number of frames pulled through [`Timeline::render`], so the output
//! device (or a test) drives time forward. Buffers are started at absolute
//! clock positions and summed into the output as the clock passes them.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::base::{
    AudioBuffer, AudioContext, AudioError, AudioResult, EndedCallback, PlaybackContext,
    ScheduledSource,
};

struct Voice {
    id: u64,
    start_frame: u64,
    samples: Vec<f32>,
    on_ended: Option<EndedCallback>,
}

impl Voice {
    fn end_frame(&self) -> u64 {
        self.start_frame + self.samples.len() as u64
    }
}

#[derive(Default)]
struct Mixer {
    frames_rendered: u64,
    voices: Vec<Voice>,
}

struct Shared {
    sample_rate: u32,
    closed: AtomicBool,
    next_id: AtomicU64,
    mixer: Mutex<Mixer>,
}

/// Cloneable handle to a software mixer clocked by rendered frames.
#[derive(Clone)]
pub struct Timeline {
    shared: Arc<Shared>,
}

impl Timeline {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            shared: Arc::new(Shared {
                sample_rate,
                closed: AtomicBool::new(false),
                next_id: AtomicU64::new(1),
                mixer: Mutex::new(Mixer::default()),
            }),
        }
    }

    /// Number of voices started and not yet finished or stopped.
    pub fn active_voices(&self) -> usize {
        self.shared.mixer.lock().voices.len()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.shared.mixer.lock().frames_rendered
    }

    /// Mix the next `out.len()` frames into `out` and advance the clock.
    ///
    /// Ended callbacks run after the mixer lock is released.
    pub fn render(&self, out: &mut [f32]) {
        out.fill(0.0);
        if self.shared.closed.load(Ordering::Acquire) {
            return;
        }

        let finished = {
            let mut mixer = self.shared.mixer.lock();
            let window_start = mixer.frames_rendered;
            let window_end = window_start + out.len() as u64;

            for voice in &mixer.voices {
                let from = voice.start_frame.max(window_start);
                let to = voice.end_frame().min(window_end);
                if from >= to {
                    continue;
                }
                let src = (from - voice.start_frame) as usize;
                let dst = (from - window_start) as usize;
                let len = (to - from) as usize;
                for (o, s) in out[dst..dst + len]
                    .iter_mut()
                    .zip(&voice.samples[src..src + len])
                {
                    *o += *s;
                }
            }

            mixer.frames_rendered = window_end;

            let mut finished = Vec::new();
            mixer.voices.retain_mut(|voice| {
                if voice.end_frame() <= window_end {
                    if let Some(cb) = voice.on_ended.take() {
                        finished.push(cb);
                    }
                    false
                } else {
                    true
                }
            });
            finished
        };

        for sample in out.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
        for cb in finished {
            cb();
        }
    }

    /// Advance the clock by `seconds` without keeping the rendered output.
    pub fn advance(&self, seconds: f64) {
        let frames = (seconds * self.shared.sample_rate as f64).round() as usize;
        let mut scratch = vec![0.0; frames];
        self.render(&mut scratch);
    }
}

impl AudioContext for Timeline {
    fn sample_rate(&self) -> u32 {
        self.shared.sample_rate
    }

    fn close(&self) -> AudioResult<()> {
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return Err(AudioError::ContextClosed);
        }
        self.shared.mixer.lock().voices.clear();
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }
}

impl PlaybackContext for Timeline {
    fn current_time(&self) -> f64 {
        super::codec::duration_secs(
            self.shared.mixer.lock().frames_rendered as usize,
            self.shared.sample_rate,
        )
    }

    fn start(
        &self,
        buffer: AudioBuffer,
        when: f64,
        on_ended: EndedCallback,
    ) -> AudioResult<Box<dyn ScheduledSource>> {
        if self.is_closed() {
            return Err(AudioError::ContextClosed);
        }

        let samples = if buffer.sample_rate == self.shared.sample_rate {
            buffer.samples
        } else {
            resample_linear(&buffer.samples, buffer.sample_rate, self.shared.sample_rate)
        };

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let requested = (when.max(0.0) * self.shared.sample_rate as f64).round() as u64;

        let mut mixer = self.shared.mixer.lock();
        let start_frame = requested.max(mixer.frames_rendered);
        mixer.voices.push(Voice {
            id,
            start_frame,
            samples,
            on_ended: Some(on_ended),
        });

        Ok(Box::new(TimelineSource {
            id,
            shared: Arc::downgrade(&self.shared),
        }))
    }
}

struct TimelineSource {
    id: u64,
    shared: Weak<Shared>,
}

impl ScheduledSource for TimelineSource {
    fn stop(&self) -> AudioResult<()> {
        let shared = self.shared.upgrade().ok_or(AudioError::ContextClosed)?;
        shared.mixer.lock().voices.retain(|voice| voice.id != self.id);
        Ok(())
    }
}

/// Linear-interpolation resampler for buffers whose rate differs from the
/// timeline's.
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if samples.is_empty() || from_rate == 0 || to_rate == 0 || from_rate == to_rate {
        return samples.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((samples.len() as f64) / ratio).round() as usize;
    (0..out_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = pos.floor() as usize;
            let frac = (pos - idx as f64) as f32;
            let a = samples[idx.min(samples.len() - 1)];
            let b = samples[(idx + 1).min(samples.len() - 1)];
            a + (b - a) * frac
        })
        .collect()
}

/// Average interleaved frames of `channels` samples down to mono.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Streaming linear-interpolation resampler.
///
/// Keeps its read position and the unconsumed tail of the input between
/// calls, so a stream cut into arbitrary chunks resamples without seams.
#[derive(Debug, Clone)]
pub struct StreamResampler {
    step: f64,
    position: f64,
    pending: Vec<f32>,
}

impl StreamResampler {
    pub fn new(from_rate: u32, to_rate: u32) -> Self {
        let step = if from_rate == 0 || to_rate == 0 {
            1.0
        } else {
            from_rate as f64 / to_rate as f64
        };
        Self {
            step,
            position: 0.0,
            pending: Vec::new(),
        }
    }

    /// Input samples consumed per output sample.
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Feed `input` and append every output sample it completes to `out`.
    pub fn process(&mut self, input: &[f32], out: &mut Vec<f32>) {
        if self.step == 1.0 {
            out.extend_from_slice(input);
            return;
        }
        self.pending.extend_from_slice(input);

        while (self.position as usize) + 1 < self.pending.len() {
            let idx = self.position as usize;
            let frac = (self.position - idx as f64) as f32;
            let a = self.pending[idx];
            let b = self.pending[idx + 1];
            out.push(a + (b - a) * frac);
            self.position += self.step;
        }

        let consumed = (self.position as usize).min(self.pending.len());
        self.pending.drain(..consumed);
        self.position -= consumed as f64;
    }
}

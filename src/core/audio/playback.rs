//! Gapless playback scheduling with barge-in support.
//!
//! Inbound audio arrives in bursts at irregular intervals. Every decoded
//! buffer is started at `max(cursor, now)` and the cursor is advanced by the
//! buffer duration right away, so consecutive buffers line up back-to-back on
//! the playback clock no matter when they arrive. An interruption stops every
//! tracked source and resets the cursor to zero.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::base::{AudioBuffer, AudioResult, PlaybackContext, ScheduledSource};
use super::codec;

/// Placement of one buffer on the playback clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledBuffer {
    pub id: u64,
    pub start: f64,
    pub duration: f64,
}

#[derive(Default)]
struct SchedulerState {
    cursor: f64,
    next_id: u64,
    sources: HashMap<u64, Box<dyn ScheduledSource>>,
}

#[derive(Clone)]
pub struct PlaybackScheduler {
    context: Arc<dyn PlaybackContext>,
    state: Arc<Mutex<SchedulerState>>,
}

impl PlaybackScheduler {
    pub fn new(context: Arc<dyn PlaybackContext>) -> Self {
        Self {
            context,
            state: Arc::new(Mutex::new(SchedulerState::default())),
        }
    }

    pub fn context(&self) -> &Arc<dyn PlaybackContext> {
        &self.context
    }

    /// Earliest start time for the next buffer.
    pub fn cursor(&self) -> f64 {
        self.state.lock().cursor
    }

    /// Number of sources started and not yet finished.
    pub fn pending(&self) -> usize {
        self.state.lock().sources.len()
    }

    /// Decode a base64 PCM16 payload at the context rate and schedule it.
    pub fn schedule_payload(&self, payload: &str) -> AudioResult<ScheduledBuffer> {
        let samples = codec::decode(payload)?;
        self.schedule(AudioBuffer::new(samples, self.context.sample_rate()))
    }

    pub fn schedule(&self, buffer: AudioBuffer) -> AudioResult<ScheduledBuffer> {
        let duration = buffer.duration();
        let weak = Arc::downgrade(&self.state);

        let mut state = self.state.lock();
        let start = state.cursor.max(self.context.current_time());
        let id = state.next_id;

        let source = self.context.start(
            buffer,
            start,
            Box::new(move || {
                if let Some(state) = weak.upgrade() {
                    state.lock().sources.remove(&id);
                }
            }),
        )?;

        state.next_id += 1;
        state.cursor = start + duration;
        state.sources.insert(id, source);

        tracing::trace!(id, start, duration, "Scheduled playback buffer");
        Ok(ScheduledBuffer {
            id,
            start,
            duration,
        })
    }

    /// Stop every tracked source and reset the cursor. Returns how many were
    /// stopped.
    pub fn interrupt(&self) -> usize {
        let mut state = self.state.lock();
        let stopped = state.sources.len();
        for (id, source) in state.sources.drain() {
            if let Err(e) = source.stop() {
                tracing::debug!(id, "Ignoring failure to stop playback source: {}", e);
            }
        }
        state.cursor = 0.0;
        stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::audio::base::AudioContext;
    use crate::core::audio::timeline::Timeline;

    fn scheduler(rate: u32) -> (Timeline, PlaybackScheduler) {
        let timeline = Timeline::new(rate);
        let scheduler = PlaybackScheduler::new(Arc::new(timeline.clone()));
        (timeline, scheduler)
    }

    #[test]
    fn test_buffers_are_back_to_back() {
        let (_timeline, scheduler) = scheduler(100);
        let durations = [10usize, 25, 5, 40];

        let mut previous: Option<ScheduledBuffer> = None;
        for len in durations {
            let placed = scheduler
                .schedule(AudioBuffer::new(vec![0.1; len], 100))
                .unwrap();
            if let Some(prev) = previous {
                assert!(placed.start >= prev.start + prev.duration - 1e-9);
            }
            previous = Some(placed);
        }

        let total: f64 = durations.iter().map(|&n| n as f64 / 100.0).sum();
        assert!((scheduler.cursor() - total).abs() < 1e-9);
        assert_eq!(scheduler.pending(), 4);
    }

    #[test]
    fn test_late_arrival_starts_at_clock_time() {
        let (timeline, scheduler) = scheduler(100);
        scheduler
            .schedule(AudioBuffer::new(vec![0.1; 10], 100))
            .unwrap();

        timeline.advance(0.5);
        let placed = scheduler
            .schedule(AudioBuffer::new(vec![0.1; 10], 100))
            .unwrap();

        assert!((placed.start - 0.5).abs() < 1e-9);
        assert!((scheduler.cursor() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_finished_sources_leave_the_set() {
        let (timeline, scheduler) = scheduler(100);
        scheduler
            .schedule(AudioBuffer::new(vec![0.1; 10], 100))
            .unwrap();
        scheduler
            .schedule(AudioBuffer::new(vec![0.1; 10], 100))
            .unwrap();

        timeline.advance(0.1);
        assert_eq!(scheduler.pending(), 1);
        timeline.advance(0.1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_interrupt_clears_everything() {
        let (timeline, scheduler) = scheduler(100);
        for _ in 0..5 {
            scheduler
                .schedule(AudioBuffer::new(vec![0.1; 50], 100))
                .unwrap();
        }
        timeline.advance(0.2);

        let stopped = scheduler.interrupt();

        assert_eq!(stopped, 5);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.cursor(), 0.0);
        assert_eq!(timeline.active_voices(), 0);

        let placed = scheduler
            .schedule(AudioBuffer::new(vec![0.1; 10], 100))
            .unwrap();
        assert!((placed.start - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_interrupt_on_empty_scheduler() {
        let (_timeline, scheduler) = scheduler(100);
        assert_eq!(scheduler.interrupt(), 0);
        assert_eq!(scheduler.cursor(), 0.0);
    }

    #[test]
    fn test_schedule_payload_decodes_pcm16() {
        let (_timeline, scheduler) = scheduler(24000);
        let payload = codec::encode(&vec![0.25; 2400]);

        let placed = scheduler.schedule_payload(&payload).unwrap();

        assert!((placed.duration - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_schedule_on_closed_context_fails_without_advancing() {
        let (timeline, scheduler) = scheduler(100);
        timeline.close().unwrap();

        assert!(
            scheduler
                .schedule(AudioBuffer::new(vec![0.1; 10], 100))
                .is_err()
        );
        assert_eq!(scheduler.cursor(), 0.0);
        assert_eq!(scheduler.pending(), 0);
    }
}

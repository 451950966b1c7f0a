//! The record of everything one session owns.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::audio::{AudioContext, MediaTrack, MicrophoneStream, PlaybackScheduler};
use crate::core::realtime::BoxedChannel;

/// Resources acquired by one `connect` call.
///
/// Created empty when the attempt starts and filled in as each resource is
/// acquired. Exactly one record is live at a time; `disconnect` takes it and
/// calls [`SessionResources::release`].
pub struct SessionResources {
    pub token: u64,
    pub capture_context: Option<Arc<dyn AudioContext>>,
    pub playback: Option<PlaybackScheduler>,
    pub microphone_tracks: Vec<Arc<dyn MediaTrack>>,
    /// Raw microphone chunks, taken by the capture task once the channel opens.
    pub microphone_samples: Option<mpsc::Receiver<Vec<f32>>>,
    pub channel: Option<BoxedChannel>,
    /// Event loop, capture and trigger tasks.
    pub tasks: Vec<JoinHandle<()>>,
}

impl SessionResources {
    pub fn new(token: u64) -> Self {
        Self {
            token,
            capture_context: None,
            playback: None,
            microphone_tracks: Vec::new(),
            microphone_samples: None,
            channel: None,
            tasks: Vec::new(),
        }
    }

    /// Release everything, best effort.
    ///
    /// Each step runs regardless of earlier failures. Failures are logged at
    /// debug level since they are almost always already-closed resources.
    pub fn release(self) {
        let token = self.token;

        if let Some(playback) = &self.playback {
            let stopped = playback.interrupt();
            if stopped > 0 {
                tracing::debug!(token, stopped, "Stopped pending playback");
            }
        }

        if let Some(channel) = &self.channel
            && let Err(e) = channel.close()
        {
            tracing::debug!(token, "Ignoring channel close failure: {}", e);
        }

        for e in MicrophoneStream::stop_tracks(&self.microphone_tracks) {
            tracing::debug!(token, "Ignoring track stop failure: {}", e);
        }
        drop(self.microphone_samples);

        for task in &self.tasks {
            task.abort();
        }

        if let Some(context) = &self.capture_context
            && !context.is_closed()
            && let Err(e) = context.close()
        {
            tracing::debug!(token, "Ignoring capture context close failure: {}", e);
        }

        if let Some(playback) = &self.playback {
            let context = playback.context();
            if !context.is_closed()
                && let Err(e) = context.close()
            {
                tracing::debug!(token, "Ignoring playback context close failure: {}", e);
            }
        }

        tracing::debug!(token, "Session resources released");
    }
}

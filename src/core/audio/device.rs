//! Host audio backend built on CPAL.
//!
//! CPAL streams are not `Send`, so every stream lives on its own OS thread
//! that builds it, plays it and parks until asked to stop. Capture chunks are
//! forwarded to the async side with a non-blocking `try_send`; playback pulls
//! from a [`Timeline`] inside the output callback.
//!
//! Streams open in the device's default format. Input is converted to mono
//! `f32` and resampled to the capture rate; output is resampled from the
//! timeline rate and duplicated across the device's channels.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::base::{
    AudioBackend, AudioBuffer, AudioContext, AudioError, AudioResult, CaptureConstraints,
    EndedCallback, MediaTrack, MicrophoneStream, PlaybackContext, ScheduledSource,
};
use super::timeline::{StreamResampler, Timeline, downmix};

/// Capacity of the chunk channel between the input callback and the session.
const CAPTURE_CHANNEL_CAPACITY: usize = 64;

// =============================================================================
// Stream threads
// =============================================================================

/// Owner of a CPAL stream running on a dedicated thread.
struct StreamThread {
    stop_tx: Mutex<Option<std_mpsc::Sender<()>>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl StreamThread {
    async fn spawn<F>(name: &str, build: F) -> AudioResult<Self>
    where
        F: FnOnce() -> AudioResult<cpal::Stream> + Send + 'static,
    {
        let (ready_tx, ready_rx) = oneshot::channel::<AudioResult<()>>();
        let (stop_tx, stop_rx) = std_mpsc::channel::<()>();

        let thread = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let stream = match build().and_then(|stream| {
                    stream
                        .play()
                        .map_err(|e| AudioError::StreamError(e.to_string()))?;
                    Ok(stream)
                }) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                // Any message or a dropped sender ends the stream.
                let _ = stop_rx.recv();
                drop(stream);
            })
            .map_err(|e| AudioError::StreamError(e.to_string()))?;

        match ready_rx.await {
            Ok(Ok(())) => Ok(Self {
                stop_tx: Mutex::new(Some(stop_tx)),
                thread: Mutex::new(Some(thread)),
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(AudioError::StreamError(
                "audio thread exited before the stream started".to_string(),
            )),
        }
    }

    /// Signal the thread to drop its stream. Returns false if already stopped.
    fn stop(&self) -> bool {
        let Some(tx) = self.stop_tx.lock().take() else {
            return false;
        };
        let _ = tx.send(());
        if let Some(handle) = self.thread.lock().take()
            && handle.join().is_err()
        {
            warn!("Audio stream thread panicked during shutdown");
        }
        true
    }

    fn is_running(&self) -> bool {
        self.stop_tx.lock().is_some()
    }
}

impl Drop for StreamThread {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// Contexts
// =============================================================================

/// Input-side context. Holds the selected device name; the stream itself is
/// opened by [`DeviceBackend::open_microphone`].
pub struct DeviceCaptureContext {
    sample_rate: u32,
    device_name: String,
    closed: AtomicBool,
}

impl DeviceCaptureContext {
    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl AudioContext for DeviceCaptureContext {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn close(&self) -> AudioResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(AudioError::ContextClosed);
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Output context: a [`Timeline`] rendered by the default output device.
pub struct DevicePlaybackContext {
    timeline: Timeline,
    stream: StreamThread,
}

impl AudioContext for DevicePlaybackContext {
    fn sample_rate(&self) -> u32 {
        self.timeline.sample_rate()
    }

    fn close(&self) -> AudioResult<()> {
        self.stream.stop();
        self.timeline.close()
    }

    fn is_closed(&self) -> bool {
        self.timeline.is_closed()
    }
}

impl PlaybackContext for DevicePlaybackContext {
    fn current_time(&self) -> f64 {
        self.timeline.current_time()
    }

    fn start(
        &self,
        buffer: AudioBuffer,
        when: f64,
        on_ended: EndedCallback,
    ) -> AudioResult<Box<dyn ScheduledSource>> {
        self.timeline.start(buffer, when, on_ended)
    }
}

struct DeviceTrack {
    label: String,
    stream: StreamThread,
}

impl MediaTrack for DeviceTrack {
    fn label(&self) -> &str {
        &self.label
    }

    fn stop(&self) -> AudioResult<()> {
        if self.stream.stop() {
            debug!(track = %self.label, "Microphone track stopped");
            Ok(())
        } else {
            Err(AudioError::StreamError(format!(
                "track {} already stopped",
                self.label
            )))
        }
    }

    fn is_live(&self) -> bool {
        self.stream.is_running()
    }
}

// =============================================================================
// Stream builders
// =============================================================================

/// Input stream in the device's native format, delivering mono chunks at
/// `target_rate`.
fn build_input<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    target_rate: u32,
    tx: mpsc::Sender<Vec<f32>>,
) -> AudioResult<cpal::Stream>
where
    T: SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    let channels = config.channels.max(1) as usize;
    let mut resampler = StreamResampler::new(config.sample_rate.0, target_rate);
    let mut converted = Vec::new();

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                converted.clear();
                converted.extend(data.iter().map(|s| s.to_sample::<f32>()));
                let mono = downmix(&converted, channels);

                let mut chunk = Vec::with_capacity(mono.len());
                resampler.process(&mono, &mut chunk);
                if chunk.is_empty() {
                    return;
                }
                if tx.try_send(chunk).is_err() {
                    debug!("Dropping capture chunk; session is not draining");
                }
            },
            move |err| warn!("Capture stream error: {}", err),
            None,
        )
        .map_err(|e| AudioError::UnsupportedConfig(e.to_string()))
}

/// Output stream in the device's native format, rendering `timeline` and
/// resampling it to the device rate.
fn build_output<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    timeline: Timeline,
) -> AudioResult<cpal::Stream>
where
    T: SizedSample + FromSample<f32> + Send + 'static,
{
    let channels = config.channels.max(1) as usize;
    let mut resampler = StreamResampler::new(timeline.sample_rate(), config.sample_rate.0);
    let mut rendered = Vec::new();
    let mut ready: Vec<f32> = Vec::new();

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let frames = data.len() / channels;
                while ready.len() < frames {
                    let missing = frames - ready.len();
                    let block = (missing as f64 * resampler.step()).ceil() as usize + 1;
                    rendered.resize(block, 0.0);
                    timeline.render(&mut rendered);
                    resampler.process(&rendered, &mut ready);
                }
                for (frame, sample) in data.chunks_mut(channels).zip(ready.drain(..frames)) {
                    frame.fill(T::from_sample(sample));
                }
            },
            move |err| warn!("Playback stream error: {}", err),
            None,
        )
        .map_err(|e| AudioError::UnsupportedConfig(e.to_string()))
}

// =============================================================================
// Backend
// =============================================================================

/// [`AudioBackend`] backed by the host's default input and output devices.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeviceBackend;

impl DeviceBackend {
    pub fn new() -> Self {
        Self
    }

    /// Names of the available input devices.
    pub fn list_input_devices() -> AudioResult<Vec<String>> {
        let devices = cpal::default_host()
            .input_devices()
            .map_err(|e| AudioError::DeviceUnavailable(e.to_string()))?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }
}

#[async_trait]
impl AudioBackend for DeviceBackend {
    async fn open_capture_context(&self, sample_rate: u32) -> AudioResult<Arc<dyn AudioContext>> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| AudioError::DeviceUnavailable("no input device".to_string()))?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());
        info!(device = %device_name, sample_rate, "Opened capture context");

        Ok(Arc::new(DeviceCaptureContext {
            sample_rate,
            device_name,
            closed: AtomicBool::new(false),
        }))
    }

    async fn open_playback_context(
        &self,
        sample_rate: u32,
    ) -> AudioResult<Arc<dyn PlaybackContext>> {
        let timeline = Timeline::new(sample_rate);
        let render_timeline = timeline.clone();

        let stream = StreamThread::spawn("playback-output", move || {
            let device = cpal::default_host()
                .default_output_device()
                .ok_or_else(|| AudioError::DeviceUnavailable("no output device".to_string()))?;
            let supported = device
                .default_output_config()
                .map_err(|e| AudioError::UnsupportedConfig(e.to_string()))?;
            let config = supported.config();
            info!(
                device = %device.name().unwrap_or_else(|_| "unknown".to_string()),
                device_rate = config.sample_rate.0,
                channels = config.channels,
                format = ?supported.sample_format(),
                "Starting playback stream"
            );

            match supported.sample_format() {
                SampleFormat::F32 => build_output::<f32>(&device, &config, render_timeline),
                SampleFormat::I16 => build_output::<i16>(&device, &config, render_timeline),
                SampleFormat::U16 => build_output::<u16>(&device, &config, render_timeline),
                other => Err(AudioError::UnsupportedConfig(format!(
                    "output sample format {other:?}"
                ))),
            }
        })
        .await?;

        Ok(Arc::new(DevicePlaybackContext { timeline, stream }))
    }

    async fn open_microphone(
        &self,
        constraints: &CaptureConstraints,
    ) -> AudioResult<MicrophoneStream> {
        let (tx, rx) = mpsc::channel::<Vec<f32>>(CAPTURE_CHANNEL_CAPACITY);
        let constraints = *constraints;
        let label = Arc::new(Mutex::new(String::from("microphone")));
        let label_slot = label.clone();

        if constraints.echo_cancellation
            || constraints.noise_suppression
            || constraints.auto_gain_control
        {
            debug!("Host input has no processing controls; capture hints not applied");
        }

        let stream = StreamThread::spawn("microphone-input", move || {
            let device = cpal::default_host()
                .default_input_device()
                .ok_or_else(|| AudioError::PermissionDenied("no input device".to_string()))?;
            if let Ok(name) = device.name() {
                *label_slot.lock() = name;
            }
            let supported = device
                .default_input_config()
                .map_err(|e| AudioError::UnsupportedConfig(e.to_string()))?;
            let config = supported.config();
            let target_rate = constraints.sample_rate;
            info!(
                device_rate = config.sample_rate.0,
                channels = config.channels,
                format = ?supported.sample_format(),
                target_rate,
                "Starting capture stream"
            );

            match supported.sample_format() {
                SampleFormat::F32 => build_input::<f32>(&device, &config, target_rate, tx),
                SampleFormat::I16 => build_input::<i16>(&device, &config, target_rate, tx),
                SampleFormat::U16 => build_input::<u16>(&device, &config, target_rate, tx),
                other => Err(AudioError::UnsupportedConfig(format!(
                    "input sample format {other:?}"
                ))),
            }
        })
        .await?;

        let label = label.lock().clone();
        info!(track = %label, "Microphone opened");
        let track: Arc<dyn MediaTrack> = Arc::new(DeviceTrack { label, stream });
        Ok(MicrophoneStream {
            tracks: vec![track],
            samples: rx,
        })
    }
}

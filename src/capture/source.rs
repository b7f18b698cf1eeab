//! System-audio stream acquisition seam.
//!
//! [`StreamSource`] abstracts where display/system audio comes from;
//! [`AudioStream`] is the live stream it hands back.  The production
//! implementation, [`CpalLoopbackSource`], reads a loopback/monitor input
//! device through `cpal` — on most desktops the "What U Hear" / monitor
//! device carries whatever the system is playing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

// ---------------------------------------------------------------------------
// StreamConstraints
// ---------------------------------------------------------------------------

/// Processing constraints requested when acquiring a stream.
///
/// Analysis wants the signal as played, so the defaults disable every
/// voice-call style processing stage.
#[derive(Debug, Clone, Copy)]
pub struct StreamConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            echo_cancellation: false,
            noise_suppression: false,
            auto_gain_control: false,
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors that can occur while acquiring a system-audio stream.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no loopback or monitor input device found on the default audio host")]
    NoDevice,

    #[error("audio capture permission denied")]
    PermissionDenied,

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

// ---------------------------------------------------------------------------
// AudioStream / StreamSource traits
// ---------------------------------------------------------------------------

/// A live audio stream handed out by a [`StreamSource`].
///
/// Not `Send`: platform stream handles (cpal's included) are not movable
/// across threads everywhere, so the owning engine stays on one thread.
pub trait AudioStream {
    /// Sample rate of the stream in Hz.
    fn sample_rate(&self) -> u32;

    /// Take every mono sample delivered since the previous call.
    fn drain_samples(&mut self) -> Vec<f32>;

    /// `true` once the stream has ended on its own (device unplugged,
    /// share revoked).  An ended stream delivers no further samples.
    fn is_ended(&self) -> bool;

    /// Release the underlying platform stream.  Idempotent.
    fn stop(&mut self);
}

/// Where system audio comes from.
pub trait StreamSource {
    /// Whether this host can provide system audio at all.
    fn supported(&self) -> bool;

    /// Acquire a live stream honouring `constraints`.
    fn acquire(&mut self, constraints: &StreamConstraints)
        -> Result<Box<dyn AudioStream>, CaptureError>;
}

// ---------------------------------------------------------------------------
// CpalLoopbackSource
// ---------------------------------------------------------------------------

/// Production [`StreamSource`] reading the default input device through
/// `cpal`.
///
/// System-audio capture relies on the host exposing a loopback/monitor
/// input (PulseAudio/PipeWire monitor sources, WASAPI loopback endpoints,
/// virtual devices like BlackHole on macOS).
pub struct CpalLoopbackSource;

impl CpalLoopbackSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpalLoopbackSource {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSource for CpalLoopbackSource {
    fn supported(&self) -> bool {
        cpal::default_host().default_input_device().is_some()
    }

    fn acquire(
        &mut self,
        _constraints: &StreamConstraints,
    ) -> Result<Box<dyn AudioStream>, CaptureError> {
        // cpal input streams carry the raw signal; the constraint stages we
        // disable have no cpal equivalent to switch off.
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;

        let supported = device.default_input_config()?;
        let channels = supported.channels() as usize;
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        let (tx, rx) = mpsc::channel::<Vec<f32>>();
        let ended = Arc::new(AtomicBool::new(false));
        let ended_cb = Arc::clone(&ended);

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // Downmix interleaved frames to mono before forwarding.
                let mono: Vec<f32> = data
                    .chunks(channels.max(1))
                    .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
                    .collect();
                // Ignore send errors; the receiver may have been dropped.
                let _ = tx.send(mono);
            },
            move |err: cpal::StreamError| {
                log::error!("cpal stream error: {err}");
                ended_cb.store(true, Ordering::SeqCst);
            },
            None, // no timeout
        )?;

        stream.play()?;

        Ok(Box::new(CpalStream {
            stream: Some(stream),
            rx,
            sample_rate,
            ended,
        }))
    }
}

struct CpalStream {
    /// Keeps the cpal stream alive; `None` after [`AudioStream::stop`].
    stream: Option<cpal::Stream>,
    rx: mpsc::Receiver<Vec<f32>>,
    sample_rate: u32,
    ended: Arc<AtomicBool>,
}

impl AudioStream for CpalStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn drain_samples(&mut self) -> Vec<f32> {
        let mut samples = Vec::new();
        while let Ok(chunk) = self.rx.try_recv() {
            samples.extend_from_slice(&chunk);
        }
        samples
    }

    fn is_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }

    fn stop(&mut self) {
        // Dropping the cpal stream stops the hardware callback.
        self.stream = None;
    }
}

// ---------------------------------------------------------------------------
// FakeSource / FakeStream  (test-only)
// ---------------------------------------------------------------------------

/// Shared observation state between a [`FakeStream`] and the test that
/// boxed it into the engine.
#[cfg(test)]
#[derive(Default)]
pub struct FakeStreamState {
    pub pending: std::sync::Mutex<std::collections::VecDeque<Vec<f32>>>,
    pub ended: AtomicBool,
    pub stopped: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl FakeStreamState {
    /// Queue one chunk for the next `drain_samples` call.
    pub fn push_chunk(&self, chunk: Vec<f32>) {
        self.pending.lock().unwrap().push_back(chunk);
    }

    /// Simulate the platform revoking the stream (track ended).
    pub fn end(&self) {
        self.ended.store(true, Ordering::SeqCst);
    }

    pub fn stop_count(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Test double stream fed by its shared [`FakeStreamState`].
#[cfg(test)]
pub struct FakeStream {
    state: Arc<FakeStreamState>,
    sample_rate: u32,
}

#[cfg(test)]
impl AudioStream for FakeStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn drain_samples(&mut self) -> Vec<f32> {
        let mut out = Vec::new();
        let mut pending = self.state.pending.lock().unwrap();
        while let Some(chunk) = pending.pop_front() {
            out.extend_from_slice(&chunk);
        }
        out
    }

    fn is_ended(&self) -> bool {
        self.state.ended.load(Ordering::SeqCst)
    }

    fn stop(&mut self) {
        self.state.stopped.fetch_add(1, Ordering::SeqCst);
    }
}

/// Test double source handing out [`FakeStream`]s over one shared state.
#[cfg(test)]
pub struct FakeSource {
    state: Arc<FakeStreamState>,
    supported: bool,
    fail_acquire: bool,
    sample_rate: u32,
}

#[cfg(test)]
impl FakeSource {
    pub fn new() -> (Self, Arc<FakeStreamState>) {
        let state = Arc::new(FakeStreamState::default());
        (
            Self {
                state: Arc::clone(&state),
                supported: true,
                fail_acquire: false,
                sample_rate: 48_000,
            },
            state,
        )
    }

    /// A source reporting no system-audio capability.
    pub fn unsupported() -> Self {
        let (mut source, _) = Self::new();
        source.supported = false;
        source
    }

    /// A source whose `acquire` fails (permission denied).
    pub fn denying() -> Self {
        let (mut source, _) = Self::new();
        source.fail_acquire = true;
        source
    }
}

#[cfg(test)]
impl StreamSource for FakeSource {
    fn supported(&self) -> bool {
        self.supported
    }

    fn acquire(
        &mut self,
        _constraints: &StreamConstraints,
    ) -> Result<Box<dyn AudioStream>, CaptureError> {
        if self.fail_acquire {
            return Err(CaptureError::PermissionDenied);
        }
        Ok(Box::new(FakeStream {
            state: Arc::clone(&self.state),
            sample_rate: self.sample_rate,
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

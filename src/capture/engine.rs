//! System audio capture engine.
//!
//! [`CaptureEngine`] owns a [`StreamSource`] and, while capturing, one live
//! [`AudioStream`] plus its [`SpectrumAnalyser`].  The host drives analysis
//! by calling [`on_frame`](CaptureEngine::on_frame) once per frame tick; the
//! return value tells the host whether to schedule another tick, so the
//! analysis loop terminates itself when capture stops for any reason.

use crate::capture::analyser::SpectrumAnalyser;
use crate::capture::analysis;
use crate::capture::source::{AudioStream, StreamConstraints, StreamSource};
use crate::config::CaptureConfig;

// ---------------------------------------------------------------------------
// Callbacks
// ---------------------------------------------------------------------------

/// Fired with the combined loudness level after each analysed frame.
pub type LevelCallback = Box<dyn FnMut(f32)>;
/// Fired with the dB spectrum snapshot after each analysed frame.
pub type SpectrumCallback = Box<dyn FnMut(&[f32])>;

// ---------------------------------------------------------------------------
// CaptureEngine
// ---------------------------------------------------------------------------

struct CaptureSession {
    stream: Box<dyn AudioStream>,
    analyser: SpectrumAnalyser,
}

/// Captures system audio and publishes a perceptual loudness level plus a
/// frequency snapshot per frame.
///
/// One active session at most; `start_capturing` while capturing is a no-op
/// and `stop_capturing` is idempotent.  Expected failures (unsupported host,
/// denied acquisition) land in [`error`](Self::error), not in a `Result`.
pub struct CaptureEngine {
    source: Box<dyn StreamSource>,
    config: CaptureConfig,
    session: Option<CaptureSession>,
    capturing: bool,
    level: f32,
    /// Last published spectrum.  Retained after stop so a UI can keep
    /// rendering the final frame.
    spectrum: Vec<f32>,
    error: Option<String>,
    on_audio_level: Option<LevelCallback>,
    on_spectrum: Option<SpectrumCallback>,
}

impl CaptureEngine {
    pub fn new(source: Box<dyn StreamSource>, config: CaptureConfig) -> Self {
        Self {
            source,
            config,
            session: None,
            capturing: false,
            level: 0.0,
            spectrum: Vec::new(),
            error: None,
            on_audio_level: None,
            on_spectrum: None,
        }
    }

    /// Register a callback fired with the combined level each frame.
    pub fn set_on_audio_level(&mut self, cb: LevelCallback) {
        self.on_audio_level = Some(cb);
    }

    /// Register a callback fired with the spectrum snapshot each frame.
    pub fn set_on_spectrum(&mut self, cb: SpectrumCallback) {
        self.on_spectrum = Some(cb);
    }

    // ---- Queries -----------------------------------------------------------

    /// Whether this host can provide system audio at all.
    pub fn supports_audio_capture(&self) -> bool {
        self.source.supported()
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    /// Combined loudness level in `[0.0, 1.0]`.  `0.0` while not capturing.
    pub fn audio_level(&self) -> f32 {
        self.level
    }

    /// Last published dB spectrum (empty before the first analysed frame).
    pub fn spectrum(&self) -> &[f32] {
        &self.spectrum
    }

    /// Latest user-facing error message, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    // ---- Operations ----------------------------------------------------------

    /// Acquire a system-audio stream and begin per-frame analysis.
    ///
    /// On failure the error message is stored and the engine is left fully
    /// stopped; the caller never has to clean up a half-started session.
    pub fn start_capturing(&mut self) {
        if !self.source.supported() {
            self.error = Some("System audio capture is not supported on this host.".into());
            return;
        }
        if self.capturing {
            log::warn!("start_capturing called while already capturing");
            return;
        }

        self.error = None;

        match self.source.acquire(&StreamConstraints::default()) {
            Ok(stream) => {
                log::info!("system audio capture started ({} Hz)", stream.sample_rate());
                let analyser = SpectrumAnalyser::new(stream.sample_rate(), &self.config);
                self.session = Some(CaptureSession { stream, analyser });
                self.capturing = true;
            }
            Err(e) => {
                log::error!("system audio acquisition failed: {e}");
                self.error = Some(format!("Failed to capture system audio: {e}"));
                self.stop_capturing();
            }
        }
    }

    /// Stop capturing and release the stream.  Idempotent.
    ///
    /// The level resets to `0.0`; the last spectrum snapshot is retained.
    pub fn stop_capturing(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.stream.stop();
            log::info!("system audio capture stopped");
        }
        self.capturing = false;
        self.level = 0.0;
    }

    /// Analyse one frame.  Returns `true` when the host should schedule
    /// another frame tick, `false` once the loop should end.
    ///
    /// A stream that ended on its own (share revoked, device unplugged) is
    /// treated as a normal stop, not an error.
    pub fn on_frame(&mut self) -> bool {
        if !self.capturing {
            return false;
        }

        let ended = self
            .session
            .as_ref()
            .map_or(true, |s| s.stream.is_ended());
        if ended {
            log::info!("system audio stream ended");
            self.stop_capturing();
            return false;
        }

        let Some(session) = self.session.as_mut() else {
            return false;
        };

        let samples = session.stream.drain_samples();
        session.analyser.feed(&samples);
        session.analyser.analyse();

        let time_domain = session.analyser.time_domain_snapshot();
        let rms = analysis::rms_level(&time_domain);
        let speech = analysis::speech_band_level(
            session.analyser.frequency_snapshot(),
            session.analyser.sample_rate(),
            session.analyser.fft_size(),
            self.config.min_decibels,
            self.config.max_decibels,
        );
        let combined = analysis::combined_level(rms, speech);

        self.level = combined;
        self.spectrum.clear();
        self.spectrum
            .extend_from_slice(session.analyser.frequency_snapshot());

        if let Some(cb) = self.on_audio_level.as_mut() {
            cb(combined);
        }
        if let Some(cb) = self.on_spectrum.as_mut() {
            cb(&self.spectrum);
        }

        true
    }
}

impl Drop for CaptureEngine {
    fn drop(&mut self) {
        self.stop_capturing();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::source::FakeSource;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine() -> (CaptureEngine, std::sync::Arc<crate::capture::source::FakeStreamState>) {
        let (source, state) = FakeSource::new();
        (
            CaptureEngine::new(Box::new(source), CaptureConfig::default()),
            state,
        )
    }

    fn loud_chunk(len: usize) -> Vec<f32> {
        use std::f32::consts::TAU;
        (0..len)
            .map(|i| (TAU * 1000.0 * i as f32 / 48_000.0).sin() * 0.8)
            .collect()
    }

    // ---- Start / capability ---------------------------------------------------

    #[test]
    fn start_sets_capturing_and_clears_error() {
        let (mut eng, _state) = engine();
        eng.start_capturing();
        assert!(eng.is_capturing());
        assert!(eng.error().is_none());
    }

    #[test]
    fn unsupported_host_sets_error_without_capturing() {
        let mut eng = CaptureEngine::new(
            Box::new(FakeSource::unsupported()),
            CaptureConfig::default(),
        );
        assert!(!eng.supports_audio_capture());

        eng.start_capturing();
        assert!(!eng.is_capturing());
        assert_eq!(
            eng.error(),
            Some("System audio capture is not supported on this host.")
        );
    }

    #[test]
    fn denied_acquisition_sets_error_and_leaves_engine_stopped() {
        let mut eng =
            CaptureEngine::new(Box::new(FakeSource::denying()), CaptureConfig::default());
        eng.start_capturing();

        assert!(!eng.is_capturing());
        assert_eq!(
            eng.error(),
            Some("Failed to capture system audio: audio capture permission denied")
        );
        assert_eq!(eng.audio_level(), 0.0);
    }

    #[test]
    fn start_while_capturing_is_a_no_op() {
        let (mut eng, state) = engine();
        eng.start_capturing();
        eng.start_capturing();

        assert!(eng.is_capturing());
        // The original session was never torn down.
        assert_eq!(state.stop_count(), 0);
    }

    // ---- Frame loop -------------------------------------------------------------

    #[test]
    fn on_frame_without_capture_declines_reschedule() {
        let (mut eng, _state) = engine();
        assert!(!eng.on_frame());
    }

    #[test]
    fn loud_audio_raises_the_level() {
        let (mut eng, state) = engine();
        eng.start_capturing();

        state.push_chunk(loud_chunk(2048));
        assert!(eng.on_frame());
        let loud = eng.audio_level();
        assert!(loud > 0.1, "level = {loud}");
        assert_eq!(eng.spectrum().len(), 1024);
    }

    #[test]
    fn silence_keeps_the_level_near_zero() {
        let (mut eng, state) = engine();
        eng.start_capturing();

        state.push_chunk(vec![0.0; 2048]);
        assert!(eng.on_frame());
        assert!(eng.audio_level() < 0.01, "level = {}", eng.audio_level());
    }

    #[test]
    fn callbacks_fire_each_frame() {
        let (mut eng, state) = engine();
        let levels = Rc::new(RefCell::new(Vec::new()));
        let spectra = Rc::new(RefCell::new(0_usize));

        let levels_cb = Rc::clone(&levels);
        eng.set_on_audio_level(Box::new(move |l| levels_cb.borrow_mut().push(l)));
        let spectra_cb = Rc::clone(&spectra);
        eng.set_on_spectrum(Box::new(move |s| {
            assert_eq!(s.len(), 1024);
            *spectra_cb.borrow_mut() += 1;
        }));

        eng.start_capturing();
        for _ in 0..3 {
            state.push_chunk(loud_chunk(2048));
            assert!(eng.on_frame());
        }

        assert_eq!(levels.borrow().len(), 3);
        assert_eq!(*spectra.borrow(), 3);
    }

    #[test]
    fn ended_stream_stops_the_loop_as_a_normal_stop() {
        let (mut eng, state) = engine();
        eng.start_capturing();

        state.push_chunk(loud_chunk(2048));
        assert!(eng.on_frame());

        state.end();
        assert!(!eng.on_frame());
        assert!(!eng.is_capturing());
        assert!(eng.error().is_none());
        assert_eq!(state.stop_count(), 1);
    }

    #[test]
    fn frames_then_stop_without_reschedule() {
        let (mut eng, state) = engine();
        eng.start_capturing();

        for _ in 0..10 {
            state.push_chunk(loud_chunk(2048));
            assert!(eng.on_frame());
        }

        eng.stop_capturing();
        assert!(!eng.on_frame());
        assert_eq!(eng.audio_level(), 0.0);
    }

    // ---- Stop semantics -----------------------------------------------------------

    #[test]
    fn stop_is_idempotent() {
        let (mut eng, state) = engine();
        eng.start_capturing();

        eng.stop_capturing();
        eng.stop_capturing();
        assert_eq!(state.stop_count(), 1);
        assert!(!eng.is_capturing());
    }

    #[test]
    fn stop_resets_level_but_keeps_spectrum() {
        let (mut eng, state) = engine();
        eng.start_capturing();

        state.push_chunk(loud_chunk(2048));
        eng.on_frame();
        assert!(eng.audio_level() > 0.0);

        eng.stop_capturing();
        assert_eq!(eng.audio_level(), 0.0);
        assert_eq!(eng.spectrum().len(), 1024);
    }

    #[test]
    fn drop_releases_the_stream() {
        let (mut eng, state) = engine();
        eng.start_capturing();
        drop(eng);
        assert_eq!(state.stop_count(), 1);
    }
}

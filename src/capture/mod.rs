//! System audio capture — acquires a loopback/system stream and publishes a
//! perceptual loudness level plus a dB spectrum snapshot per host frame.
//!
//! Layered from the hardware up:
//! - [`source`] — the [`StreamSource`]/[`AudioStream`] acquisition seam and
//!   the cpal-backed production source,
//! - [`ring`] — the sliding sample window the analyser reads from,
//! - [`analyser`] — windowed FFT with smoothing and dB conversion,
//! - [`analysis`] — pure level math (RMS, speech band, combined),
//! - [`engine`] — the capture lifecycle and per-frame loop,
//! - [`detector`] — the simulated speech-activity gate for the demo.

pub mod analyser;
pub mod analysis;
pub mod detector;
pub mod engine;
pub mod ring;
pub mod source;

pub use analyser::SpectrumAnalyser;
pub use analysis::{combined_level, rms_level, speech_band_level};
pub use detector::SpeechActivityDetector;
pub use engine::{CaptureEngine, LevelCallback, SpectrumCallback};
pub use ring::SampleRing;
pub use source::{
    AudioStream, CaptureError, CpalLoopbackSource, StreamConstraints, StreamSource,
};

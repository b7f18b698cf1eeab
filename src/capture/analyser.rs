//! Windowed FFT spectrum analyser over the most recent samples of a live
//! stream.
//!
//! Mirrors the shape of a platform analyser node: a fixed `fft_size`, a
//! frequency snapshot of `fft_size / 2` dB bins with exponential smoothing
//! across frames, and a byte time-domain snapshot where `128` is silence.
//!
//! FFT plans are built by one process-wide planner, created lazily on first
//! use and shared by every capture session.  Stopping a session never tears
//! the planner down.

use std::sync::{Arc, Mutex, OnceLock};

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::capture::ring::SampleRing;
use crate::config::CaptureConfig;

// ---------------------------------------------------------------------------
// Shared FFT planner
// ---------------------------------------------------------------------------

static FFT_PLANNER: OnceLock<Mutex<FftPlanner<f32>>> = OnceLock::new();

fn plan_forward(fft_size: usize) -> Arc<dyn Fft<f32>> {
    let planner = FFT_PLANNER.get_or_init(|| Mutex::new(FftPlanner::new()));
    // A poisoned planner mutex only means another thread panicked mid-plan;
    // the planner itself is still usable.
    let mut guard = match planner.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    guard.plan_fft_forward(fft_size)
}

// ---------------------------------------------------------------------------
// SpectrumAnalyser
// ---------------------------------------------------------------------------

/// Rolling spectrum analysis of a mono `f32` stream.
///
/// Feed raw samples with [`feed`](Self::feed); call
/// [`analyse`](Self::analyse) once per host frame to recompute the
/// snapshots from the newest `fft_size` samples.
pub struct SpectrumAnalyser {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    sample_rate: u32,
    smoothing: f32,
    min_db: f32,
    ring: SampleRing,
    /// Blackman window coefficients, length `fft_size`.
    window: Vec<f32>,
    /// Most recent windowed frame, reused across calls.
    frame: Vec<Complex<f32>>,
    /// Exponentially smoothed linear magnitudes, length `fft_size / 2`.
    smoothed: Vec<f32>,
    /// dB view of `smoothed`, floored at `min_db`.
    db: Vec<f32>,
    /// Raw (unwindowed) copy of the newest samples for time-domain reads.
    raw: Vec<f32>,
}

impl SpectrumAnalyser {
    /// Create an analyser for a stream at `sample_rate` Hz.
    pub fn new(sample_rate: u32, config: &CaptureConfig) -> Self {
        let fft_size = config.fft_size;
        let bins = fft_size / 2;
        Self {
            fft: plan_forward(fft_size),
            fft_size,
            sample_rate,
            smoothing: config.smoothing_time_constant.clamp(0.0, 0.999),
            min_db: config.min_decibels,
            ring: SampleRing::new(fft_size),
            window: blackman(fft_size),
            frame: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; bins],
            db: vec![config.min_decibels; bins],
            raw: vec![0.0; fft_size],
        }
    }

    /// Append raw mono samples from the stream.
    pub fn feed(&mut self, samples: &[f32]) {
        self.ring.push_slice(samples);
    }

    /// Recompute both snapshots from the newest `fft_size` samples.
    pub fn analyse(&mut self) {
        self.ring.copy_tail(&mut self.raw);

        for (i, slot) in self.frame.iter_mut().enumerate() {
            *slot = Complex::new(self.raw[i] * self.window[i], 0.0);
        }
        self.fft.process(&mut self.frame);

        let tau = self.smoothing;
        for (i, (sm, db)) in self.smoothed.iter_mut().zip(self.db.iter_mut()).enumerate() {
            let mag = self.frame[i].norm() / self.fft_size as f32;
            *sm = tau * *sm + (1.0 - tau) * mag;
            *db = if *sm > 0.0 {
                (20.0 * sm.log10()).max(self.min_db)
            } else {
                self.min_db
            };
        }
    }

    /// dB magnitudes per frequency bin, length `fft_size / 2`.
    ///
    /// Bin `i` covers frequency `i * sample_rate / (2 * fft_size)` Hz.
    pub fn frequency_snapshot(&self) -> &[f32] {
        &self.db
    }

    /// Newest `fft_size / 2` time-domain samples as unsigned bytes, where
    /// `128` is silence and the full scale maps `[-1, 1]` to `[0, 255]`.
    pub fn time_domain_snapshot(&self) -> Vec<u8> {
        let bins = self.fft_size / 2;
        self.raw[self.fft_size - bins..]
            .iter()
            .map(|&s| (128.0 + s * 128.0).clamp(0.0, 255.0) as u8)
            .collect()
    }

    /// Stream sample rate this analyser was built for.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Configured FFT window size.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }
}

fn blackman(n: usize) -> Vec<f32> {
    use std::f32::consts::PI;
    (0..n)
        .map(|i| {
            let x = i as f32 / (n.saturating_sub(1)).max(1) as f32;
            0.42 - 0.5 * (2.0 * PI * x).cos() + 0.08 * (4.0 * PI * x).cos()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

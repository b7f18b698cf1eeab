//! Pure level math for the capture engine: RMS from byte-encoded time-domain
//! data, speech-band energy from dB spectrum bins, and the combined level
//! published to consumers.
//!
//! Time-domain samples arrive as unsigned bytes where `128` is silence; each
//! byte maps back to `[-1, 1)` as `b / 128 - 1` before squaring.  Spectrum
//! bins arrive as dB magnitudes and are normalized against the configured
//! `[min_decibels, max_decibels]` window.

/// Human speech fundamentals and first formants live roughly here.
pub const SPEECH_BAND_LOW_HZ: f32 = 300.0;
pub const SPEECH_BAND_HIGH_HZ: f32 = 3000.0;

/// Weight of the broadband RMS term in the combined level.
const RMS_WEIGHT: f32 = 0.7;
/// Weight of the speech-band term in the combined level.
const SPEECH_WEIGHT: f32 = 0.3;

// ---------------------------------------------------------------------------
// Level computations
// ---------------------------------------------------------------------------

/// Root-mean-square amplitude of byte-encoded time-domain samples, in
/// `[0.0, 1.0]`.  Returns `0.0` for empty input.
pub fn rms_level(time_domain: &[u8]) -> f32 {
    if time_domain.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = time_domain
        .iter()
        .map(|&b| {
            let a = b as f32 / 128.0 - 1.0;
            a * a
        })
        .sum();
    (sum_sq / time_domain.len() as f32).sqrt()
}

/// Average normalized energy over the 300–3000 Hz speech band, in
/// `[0.0, 1.0]`.
///
/// `freq_bins` holds dB magnitudes for bins `0..fft_size / 2`; bin `i`
/// covers frequency `i * sample_rate / (2 * fft_size)` Hz.  Each in-band
/// bin is normalized as `(db - min_db) / (max_db - min_db)` and clamped to
/// `[0, 1]` before averaging.  Returns `0.0` when no bin falls in the band
/// or the dB window is degenerate.
pub fn speech_band_level(
    freq_bins: &[f32],
    sample_rate: u32,
    fft_size: usize,
    min_db: f32,
    max_db: f32,
) -> f32 {
    let range = max_db - min_db;
    if freq_bins.is_empty() || fft_size == 0 || range <= 0.0 {
        return 0.0;
    }

    let mut sum = 0.0_f32;
    let mut count = 0_usize;
    for (i, &db) in freq_bins.iter().enumerate() {
        let freq = i as f32 * sample_rate as f32 / (2.0 * fft_size as f32);
        if freq < SPEECH_BAND_LOW_HZ || freq > SPEECH_BAND_HIGH_HZ {
            continue;
        }
        sum += ((db - min_db) / range).clamp(0.0, 1.0);
        count += 1;
    }

    if count == 0 {
        return 0.0;
    }
    sum / count as f32
}

/// Weighted blend of broadband RMS and speech-band energy, clamped to
/// `[0.0, 1.0]`.
pub fn combined_level(rms: f32, speech: f32) -> f32 {
    (RMS_WEIGHT * rms + SPEECH_WEIGHT * speech).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

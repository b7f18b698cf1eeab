//! Simulated speech-activity detection over the capture engine's level.
//!
//! This is a demo stand-in, not a recognizer: when the combined level stays
//! above a threshold and the cooldown has elapsed, it reports a canned phrase
//! chosen by loudness.  Real transcription of captured system audio is out
//! of scope; the detector only demonstrates the activity-gating shape a real
//! pipeline would use.

use std::time::{Duration, Instant};

/// Minimum time between two detections.
const COOLDOWN: Duration = Duration::from_secs(3);

/// Canned phrases, ordered quiet to loud.
const PHRASES: [&str; 8] = [
    "I detected audio playing from your system",
    "This sounds like speech content that could be transcribed",
    "The system is now analyzing the audio frequencies",
    "Speech patterns detected in the audio stream",
    "This demonstration shows how system audio can be processed",
    "Audio levels indicate active content is playing",
    "The frequency analysis shows typical speech patterns",
    "System audio capture is working correctly",
];

// ---------------------------------------------------------------------------
// SpeechActivityDetector
// ---------------------------------------------------------------------------

/// Gates on the combined audio level and emits a phrase per detection.
pub struct SpeechActivityDetector {
    threshold: f32,
    last_detection: Option<Instant>,
}

impl SpeechActivityDetector {
    /// `threshold` is the combined-level value above which audio counts as
    /// active content (see `CaptureConfig::detection_threshold`).
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            last_detection: None,
        }
    }

    /// Feed one frame's combined level.  Returns a phrase when the level
    /// crosses the threshold and at least 3 s have passed since the last
    /// detection.
    pub fn poll(&mut self, level: f32, now: Instant) -> Option<&'static str> {
        if level <= self.threshold {
            return None;
        }
        if let Some(last) = self.last_detection {
            if now.duration_since(last) < COOLDOWN {
                return None;
            }
        }
        self.last_detection = Some(now);

        // Louder audio picks a later phrase.
        let index = ((level * PHRASES.len() as f32) as usize).min(PHRASES.len() - 1);
        Some(PHRASES[index])
    }

    /// Forget the cooldown, e.g. when capture restarts.
    pub fn reset(&mut self) {
        self.last_detection = None;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
